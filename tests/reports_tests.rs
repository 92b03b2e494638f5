use comites::models::Seccion;
use comites::store::committees::{self, NewCommittee, NewMember};
use comites::store::db::init_schema;
use comites::store::reports;
use comites::store::units;
use comites::store::users;
use rusqlite::Connection;

fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("Debe abrir base en memoria");
    init_schema(&conn).expect("Debe crear el esquema");
    conn
}

fn seed(conn: &Connection) {
    for (id, municipio, nombre) in [(101, 52, "Morelia"), (102, 52, "Morelia"), (201, 102, "Uruapan")] {
        units::upsert_seccion(
            conn,
            &Seccion {
                id,
                municipio: Some(municipio),
                nombre_municipio: Some(nombre.to_string()),
                distrito: Some(10),
                nombre_distrito: Some("Distrito 10".to_string()),
                distrito_federal: None,
            },
        )
        .unwrap();
    }

    users::insert_user(conn, "ana@example.com", "Ana", None, None).unwrap();

    let mut alta = |owner: &str, contacto: &str, seccion: &str, tipo: &str| {
        committees::insert_committee(
            conn,
            &NewCommittee {
                name: "Comité",
                section_number: seccion,
                tipo,
                owner_email: owner,
                presidente: "P",
                email: contacto,
                clave_afiliacion: "",
                telefono: "",
                administrative_unit_id: None,
            },
        )
        .unwrap()
    };
    alta("ana@example.com", "c1@example.com", "101", "seccional");
    alta("ana@example.com", "c2@example.com", "102", "seccional");
    alta("otro@example.com", "c3@example.com", "201", "especial");
    alta("otro@example.com", "c4@example.com", "", "especial");
    alta("otro@example.com", "c5@example.com", "no-numerica", "especial");
}

#[test]
fn test_estadisticas_agrupadas() {
    let conn = test_conn();
    seed(&conn);

    let stats = reports::committee_stats(&conn).expect("Debe calcular estadísticas");

    let by_user = stats["by_user"].as_array().unwrap();
    assert_eq!(by_user.len(), 2);
    // Más comités primero
    assert_eq!(by_user[0]["owner_email"], "otro@example.com");
    assert_eq!(by_user[0]["total"], 3);
    // El correo registrado resuelve su nombre
    let ana = by_user.iter().find(|r| r["owner_email"] == "ana@example.com").unwrap();
    assert_eq!(ana["owner_name"], "Ana");

    let by_section = stats["by_section"].as_array().unwrap();
    // Las secciones vacías quedan fuera; la no numérica entra sin municipio
    assert_eq!(by_section.len(), 4);
    let s101 = by_section.iter().find(|r| r["code"] == "101").unwrap();
    assert_eq!(s101["label"], "Sección 101");
    assert_eq!(s101["municipality"], "Morelia");
    let libre = by_section.iter().find(|r| r["code"] == "no-numerica").unwrap();
    assert!(libre["municipality"].is_null());

    let by_municipality = stats["by_municipality"].as_array().unwrap();
    assert_eq!(by_municipality.len(), 2);
    assert_eq!(by_municipality[0]["label"], "Morelia");
    assert_eq!(by_municipality[0]["total"], 2);

    let by_type = stats["by_type"].as_array().unwrap();
    assert_eq!(by_type.len(), 2);
    assert_eq!(by_type[0]["type"], "especial");
    assert_eq!(by_type[0]["total"], 3);
}

#[test]
fn test_metricas_del_tablero() {
    let conn = test_conn();
    seed(&conn);

    committees::insert_member(
        &conn,
        1,
        &NewMember {
            full_name: "Luis",
            ine_key: "X",
            phone: "1",
            email: "l@example.com",
            section_number: "101",
            invited_by: "Ana",
        },
    )
    .unwrap();
    committees::insert_document(&conn, 1, "committees/1/a.jpg", "a.jpg", "image/jpeg", 10).unwrap();

    let metrics = reports::dashboard_metrics(&conn, 113).expect("Debe calcular métricas");
    assert_eq!(metrics["total_committees"], 5);
    assert_eq!(metrics["total_promovidos"], 1);
    assert_eq!(metrics["total_documentos"], 1);
    // Secciones distintas no vacías: 101, 102, 201, no-numerica
    assert_eq!(metrics["secciones_cubiertas"], 4);
    assert_eq!(metrics["total_secciones"], 3);
    // Municipios alcanzados vía el cruce con el padrón: Morelia y Uruapan
    assert_eq!(metrics["municipios_cubiertos"], 2);
    assert_eq!(metrics["municipios_meta"], 113);
    let pct = metrics["porcentaje_municipios"].as_f64().unwrap();
    assert!((pct - 1.77).abs() < 0.01);
}

#[test]
fn test_metricas_sin_datos() {
    let conn = test_conn();
    let metrics = reports::dashboard_metrics(&conn, 113).unwrap();
    assert_eq!(metrics["total_committees"], 0);
    assert_eq!(metrics["porcentaje_secciones"], 0.0);
    assert_eq!(metrics["porcentaje_municipios"], 0.0);
}

#[test]
fn test_detalle_de_comites() {
    let conn = test_conn();
    seed(&conn);
    committees::insert_document(&conn, 1, "committees/1/a.jpg", "a.jpg", "image/jpeg", 10).unwrap();

    let all = reports::load_committee_details(&conn, None).expect("Debe cargar detalles");
    assert_eq!(all.len(), 5);

    let detail = reports::load_committee_details(&conn, Some(1)).unwrap().remove(0);
    assert_eq!(detail.id, 1);
    assert_eq!(detail.owner_name.as_deref(), Some("Ana"));
    let section = detail.section.expect("Debe cruzar con el padrón");
    assert_eq!(section.nombre_municipio.as_deref(), Some("Morelia"));
    assert_eq!(detail.documents.len(), 1);
    assert_eq!(detail.documents[0].url, "/uploads/committees/1/a.jpg");

    // section_number no numérica: sin referencia
    let libre = reports::load_committee_details(&conn, Some(5)).unwrap().remove(0);
    assert!(libre.section.is_none());
    assert!(libre.owner_name.is_none());

    assert!(reports::load_committee_details(&conn, Some(999)).unwrap().is_empty());
}

#[test]
fn test_filas_de_asignaciones_omiten_unidades_perdidas() {
    let conn = test_conn();
    let ana = users::insert_user(&conn, "ana@example.com", "Ana", None, None).unwrap();
    let state = units::insert_unit(
        &conn,
        &units::NewUnit {
            name: "Michoacán",
            code: Some("16"),
            unit_type: "STATE",
            parent_id: None,
            seccion_municipio_id: None,
            seccion_distrito_id: None,
        },
    )
    .unwrap();
    users::insert_assignment(&conn, ana.id, state.id, 1).unwrap();
    // Asignación colgando de una unidad inexistente
    conn.execute(
        "INSERT INTO user_assignments (user_id, administrative_unit_id, role, created_at) \
         VALUES (?1, 999, 6, '2024-01-01T00:00:00Z')",
        rusqlite::params![ana.id],
    )
    .unwrap();

    let rows = reports::user_assignment_rows(&conn).expect("Debe listar");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["role_label"], "Coordinación Estatal");
    assert_eq!(rows[0]["user_name"], "Ana");
}

#[test]
fn test_totales_de_administracion() {
    let conn = test_conn();
    seed(&conn);
    let stats = reports::admin_stats(&conn).unwrap();
    assert_eq!(stats["total_users"], 1);
    assert_eq!(stats["total_secciones"], 3);
    assert_eq!(stats["total_administrative_units"], 0);
    assert_eq!(stats["units_by_type"]["STATE"], 0);
}
