use comites::exports;
use comites::models::{CommitteeMember, Seccion};
use comites::store::reports::{CommitteeDetail, DocumentWithUrl};

fn member(name: &str) -> CommitteeMember {
    CommitteeMember {
        id: 1,
        full_name: name.to_string(),
        ine_key: "GRLPMR85010116M900".to_string(),
        phone: "4431234567".to_string(),
        email: "luis@example.com".to_string(),
        section_number: "101".to_string(),
        invited_by: "Ana".to_string(),
        committee_id: 1,
        created_at: "2024-05-01T12:00:00+00:00".to_string(),
    }
}

fn detail(members: Vec<CommitteeMember>, documents: Vec<DocumentWithUrl>) -> CommitteeDetail {
    let total_members = members.len();
    CommitteeDetail {
        id: 7,
        name: "Comité Centro".to_string(),
        section_number: "101".to_string(),
        tipo: "seccional".to_string(),
        owner_id: "ana@example.com".to_string(),
        owner_name: Some("Ana".to_string()),
        created_at: "2024-05-01T12:00:00+00:00".to_string(),
        presidente: "Ana Torres".to_string(),
        email: "comite@example.com".to_string(),
        clave_afiliacion: "AF-001".to_string(),
        telefono: "4430000000".to_string(),
        administrative_unit: None,
        section: Some(Seccion {
            id: 101,
            municipio: Some(52),
            nombre_municipio: Some("Morelia".to_string()),
            distrito: Some(10),
            nombre_distrito: Some("Morelia Noroeste".to_string()),
            distrito_federal: None,
        }),
        members,
        documents,
        total_members,
    }
}

#[test]
fn test_workbook_de_comites() {
    let committees = vec![detail(vec![member("Luis Pérez"), member("María García")], Vec::new())];
    let book = exports::excel::committees_workbook(&committees);
    let bytes = exports::excel::workbook_to_bytes(&book).expect("Debe serializar el workbook");
    // Un .xlsx es un contenedor zip
    assert!(bytes.len() > 4);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_workbook_sin_comites() {
    let book = exports::excel::committees_workbook(&[]);
    let bytes = exports::excel::workbook_to_bytes(&book).expect("Debe serializar vacío");
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_acta_pdf() {
    let committee = detail(vec![member("Luis Pérez")], Vec::new());
    let bytes = exports::pdf::acta_pdf(&committee).expect("Debe generar el acta");
    assert!(bytes.len() > 8);
    assert_eq!(&bytes[..5], b"%PDF-");
}

#[test]
fn test_acta_pdf_sin_integrantes_y_muchos() {
    let vacio = detail(Vec::new(), Vec::new());
    assert!(exports::pdf::acta_pdf(&vacio).is_ok());

    // Suficientes integrantes para forzar salto de página
    let muchos: Vec<CommitteeMember> = (0..60).map(|i| member(&format!("INTEGRANTE {}", i))).collect();
    let largo = detail(muchos, Vec::new());
    assert!(exports::pdf::acta_pdf(&largo).is_ok());
}

#[test]
fn test_folio_estable() {
    let committee = detail(vec![member("Luis Pérez")], Vec::new());
    let folio = exports::pdf::acta_folio(&committee);
    assert_eq!(folio.len(), 12);
    assert!(folio.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(folio, folio.to_uppercase());
    // Determinista sobre los mismos datos
    assert_eq!(folio, exports::pdf::acta_folio(&committee));

    // Cambiar el total de integrantes cambia el folio
    let otro = detail(Vec::new(), Vec::new());
    assert_ne!(folio, exports::pdf::acta_folio(&otro));
}
