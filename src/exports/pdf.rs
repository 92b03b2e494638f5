use crate::store::reports::CommitteeDetail;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use sha2::{Digest, Sha256};
use std::error::Error;

/// Folio electrónico reproducible del acta: primeros 12 hex de un SHA-256
/// sobre los datos estables del comité.
pub fn acta_folio(committee: &CommitteeDetail) -> String {
    let seed = format!(
        "{}-{}-{}-{}",
        committee.id, committee.created_at, committee.email, committee.total_members
    );
    let digest = Sha256::digest(seed.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..12].to_uppercase()
}

/// Las fuentes integradas del PDF solo cubren Latin-1; el resto se descarta.
fn latin1(text: &str) -> String {
    text.chars().filter(|c| (*c as u32) < 256).collect()
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Corte simple por palabras para párrafos.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

const OPENING: &str = "El Segundo Piso de la Cuarta Transformación R21 MORENA en Michoacán \
fortalece la organización territorial y la esperanza de nuestro movimiento.";

const CLOSING: &str = "Este documento legitima el compromiso social del Segundo Piso de la \
Cuarta Transformación R21 MORENA en cada rincón de Michoacán.";

/// Genera el acta del comité como PDF (una página tamaño carta A4; si la
/// lista de integrantes no cabe se agregan páginas).
pub fn acta_pdf(committee: &CommitteeDetail) -> Result<Vec<u8>, Box<dyn Error>> {
    let title = latin1(&format!("Acta Comité {}", committee.name));
    let (doc, page, layer) = PdfDocument::new(title.as_str(), Mm(210.0), Mm(297.0), "Capa 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| format!("pdf font error: {:?}", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| format!("pdf font error: {:?}", e))?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = 280.0;

    // Nueva página cuando se agota el margen inferior
    macro_rules! ensure_room {
        () => {
            if y < 20.0 {
                let (p, l) = doc.add_page(Mm(210.0), Mm(297.0), "Capa 1");
                current = doc.get_page(p).get_layer(l);
                y = 280.0;
            }
        };
    }

    current.use_text(latin1("Acta de Comité R21 Michoacán"), 16.0, Mm(55.0), Mm(y), &bold);
    y -= 12.0;

    for line in wrap(OPENING, 90) {
        ensure_room!();
        current.use_text(latin1(&line), 11.0, Mm(15.0), Mm(y), &font);
        y -= 6.0;
    }
    y -= 2.0;

    let mut info_lines: Vec<String> = vec![
        format!("Comité: {}", committee.name),
        format!(
            "Presidencia: {} | Teléfono: {}",
            committee.presidente, committee.telefono
        ),
    ];
    match committee.section.as_ref().and_then(|s| s.nombre_municipio.clone()) {
        Some(municipio) => {
            let distrito = committee
                .section
                .as_ref()
                .and_then(|s| s.nombre_distrito.clone())
                .unwrap_or_else(|| "N/D".to_string());
            info_lines.push(format!(
                "Municipio: {} | Distrito: {} | Sección: {}",
                municipio, distrito, committee.section_number
            ));
        }
        None => info_lines.push(format!("Sección: {}", committee.section_number)),
    }
    info_lines.push(format!("Correo del comité: {}", committee.email));
    info_lines.push(format!(
        "Coordinación responsable: {}",
        committee.owner_name.clone().unwrap_or_else(|| committee.owner_id.clone())
    ));
    info_lines.push(format!("Fecha de creación: {} UTC", committee.created_at));

    for line in info_lines {
        ensure_room!();
        current.use_text(latin1(&line), 11.0, Mm(15.0), Mm(y), &font);
        y -= 7.0;
    }
    y -= 4.0;

    ensure_room!();
    current.use_text(latin1("Integrantes registrados"), 12.0, Mm(15.0), Mm(y), &bold);
    y -= 7.0;
    ensure_room!();
    current.use_text(latin1("Nombre"), 10.0, Mm(15.0), Mm(y), &bold);
    current.use_text(latin1("Teléfono"), 10.0, Mm(95.0), Mm(y), &bold);
    current.use_text(latin1("Correo"), 10.0, Mm(135.0), Mm(y), &bold);
    y -= 6.0;

    if committee.members.is_empty() {
        ensure_room!();
        current.use_text(latin1("Sin integrantes capturados"), 10.0, Mm(15.0), Mm(y), &font);
        y -= 6.0;
    } else {
        for member in &committee.members {
            ensure_room!();
            current.use_text(latin1(&truncate(&member.full_name, 38)), 10.0, Mm(15.0), Mm(y), &font);
            current.use_text(latin1(&truncate(&member.phone, 18)), 10.0, Mm(95.0), Mm(y), &font);
            current.use_text(latin1(&truncate(&member.email, 30)), 10.0, Mm(135.0), Mm(y), &font);
            y -= 6.0;
        }
    }
    y -= 6.0;

    for line in wrap(CLOSING, 90) {
        ensure_room!();
        current.use_text(latin1(&line), 11.0, Mm(15.0), Mm(y), &font);
        y -= 6.0;
    }
    y -= 2.0;
    ensure_room!();
    current.use_text(
        latin1(&format!("Folio electrónico: {}", acta_folio(committee))),
        11.0,
        Mm(15.0),
        Mm(y),
        &bold,
    );

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| format!("pdf save error: {:?}", e))?;
    Ok(bytes)
}
