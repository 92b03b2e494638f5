use crate::exports::cell_coord;
use crate::store::reports::CommitteeDetail;
use std::error::Error;
use umya_spreadsheet::Spreadsheet;

const COMMITTEE_HEADERS: [&str; 11] = [
    "ID",
    "Nombre",
    "Tipo",
    "Sección",
    "Municipio",
    "Presidencia",
    "Teléfono",
    "Correo",
    "Total Integrantes",
    "Propietario",
    "Fecha de creación",
];

const MEMBER_HEADERS: [&str; 7] = [
    "ID Comité",
    "Comité",
    "Nombre integrante",
    "Teléfono",
    "Correo",
    "Sección",
    "Invitado por",
];

fn write_row(sheet: &mut umya_spreadsheet::Worksheet, row: usize, values: &[String]) {
    for (i, value) in values.iter().enumerate() {
        sheet.get_cell_mut(cell_coord(i + 1, row).as_str()).set_value(value);
    }
}

/// Workbook de exportación con dos hojas: resumen de comités e integrantes.
pub fn committees_workbook(committees: &[CommitteeDetail]) -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();

    {
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.set_title("Comites");
        write_row(sheet, 1, &COMMITTEE_HEADERS.map(|h| h.to_string()));
        for (i, committee) in committees.iter().enumerate() {
            let municipality = committee
                .section
                .as_ref()
                .and_then(|s| s.nombre_municipio.clone())
                .unwrap_or_default();
            let owner = committee
                .owner_name
                .clone()
                .unwrap_or_else(|| committee.owner_id.clone());
            write_row(
                sheet,
                i + 2,
                &[
                    committee.id.to_string(),
                    committee.name.clone(),
                    committee.tipo.clone(),
                    committee.section_number.clone(),
                    municipality,
                    committee.presidente.clone(),
                    committee.telefono.clone(),
                    committee.email.clone(),
                    committee.total_members.to_string(),
                    owner,
                    committee.created_at.clone(),
                ],
            );
        }
    }

    let _ = book.new_sheet("Integrantes");
    {
        let sheet = book.get_sheet_by_name_mut("Integrantes").unwrap();
        write_row(sheet, 1, &MEMBER_HEADERS.map(|h| h.to_string()));
        let mut row = 2usize;
        for committee in committees {
            for member in &committee.members {
                write_row(
                    sheet,
                    row,
                    &[
                        committee.id.to_string(),
                        committee.name.clone(),
                        member.full_name.clone(),
                        member.phone.clone(),
                        member.email.clone(),
                        member.section_number.clone(),
                        member.invited_by.clone(),
                    ],
                );
                row += 1;
            }
        }
    }

    book
}

/// Serializa el workbook a bytes pasando por un archivo temporal.
pub fn workbook_to_bytes(book: &Spreadsheet) -> Result<Vec<u8>, Box<dyn Error>> {
    let tmp = std::env::temp_dir().join(format!(
        "comites_export_{}.xlsx",
        uuid::Uuid::new_v4().simple()
    ));
    umya_spreadsheet::writer::xlsx::write(book, &tmp)
        .map_err(|e| format!("xlsx write error: {:?}", e))?;
    let bytes = std::fs::read(&tmp)?;
    let _ = std::fs::remove_file(&tmp);
    Ok(bytes)
}
