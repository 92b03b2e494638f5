use comites::models::Seccion;
use comites::store::db::init_schema;
use comites::store::units::{self, NewUnit};
use comites::store::users;
use rusqlite::Connection;

fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("Debe abrir base en memoria");
    init_schema(&conn).expect("Debe crear el esquema");
    conn
}

fn seccion(id: i64, municipio: i64, nombre_municipio: &str, distrito: i64, nombre_distrito: &str) -> Seccion {
    Seccion {
        id,
        municipio: Some(municipio),
        nombre_municipio: Some(nombre_municipio.to_string()),
        distrito: Some(distrito),
        nombre_distrito: Some(nombre_distrito.to_string()),
        distrito_federal: None,
    }
}

fn seed_padron(conn: &Connection) {
    for s in [
        seccion(1, 52, "Morelia", 10, "Morelia Noroeste"),
        seccion(2, 52, "Morelia", 10, "Morelia Noroeste"),
        seccion(3, 102, "Uruapan", 20, "Uruapan"),
    ] {
        units::upsert_seccion(conn, &s).expect("Debe sembrar sección");
    }
}

#[test]
fn test_populate_construye_la_jerarquia() {
    let conn = test_conn();
    seed_padron(&conn);

    let summary = units::populate_administrative_units(&conn).expect("Debe poblar");
    assert!(summary.state_created);
    assert_eq!(summary.districts_created, 2);
    assert_eq!(summary.municipalities_created, 2);
    assert_eq!(summary.sections_created, 3);
    assert_eq!(summary.sections_existing, 0);
    assert_eq!(summary.totals_by_type.get("STATE"), Some(&1));
    assert_eq!(summary.totals_by_type.get("DISTRICT"), Some(&2));
    assert_eq!(summary.totals_by_type.get("MUNICIPALITY"), Some(&2));
    assert_eq!(summary.totals_by_type.get("SECTION"), Some(&3));

    // Cada sección cuelga de su municipio y cada municipio de su distrito
    let secciones = units::list_units(&conn, Some("SECTION"), None, None).unwrap();
    assert_eq!(secciones.len(), 3);
    for s in &secciones {
        let parent = units::get_unit(&conn, s.parent_id.expect("Debe tener padre"))
            .unwrap()
            .expect("El padre debe existir");
        assert_eq!(parent.unit_type, "MUNICIPALITY");
    }
}

#[test]
fn test_populate_es_idempotente() {
    let conn = test_conn();
    seed_padron(&conn);

    units::populate_administrative_units(&conn).unwrap();
    let second = units::populate_administrative_units(&conn).expect("Debe repoblar sin duplicar");
    assert!(!second.state_created);
    assert_eq!(second.districts_created, 0);
    assert_eq!(second.municipalities_created, 0);
    assert_eq!(second.sections_created, 0);
    assert_eq!(second.sections_existing, 3);
    assert_eq!(second.totals_by_type.get("SECTION"), Some(&3));
}

#[test]
fn test_seccion_sin_municipio_cuelga_del_estado() {
    let conn = test_conn();
    units::upsert_seccion(
        &conn,
        &Seccion {
            id: 99,
            municipio: None,
            nombre_municipio: None,
            distrito: None,
            nombre_distrito: None,
            distrito_federal: None,
        },
    )
    .unwrap();

    units::populate_administrative_units(&conn).unwrap();
    let seccion_unit = units::list_units(&conn, Some("SECTION"), None, None).unwrap();
    assert_eq!(seccion_unit.len(), 1);
    let parent = units::get_unit(&conn, seccion_unit[0].parent_id.unwrap()).unwrap().unwrap();
    assert_eq!(parent.unit_type, "STATE");
}

#[test]
fn test_insert_unit_rechaza_padre_inexistente() {
    let conn = test_conn();
    let result = units::insert_unit(
        &conn,
        &NewUnit {
            name: "Huérfano",
            code: None,
            unit_type: "DISTRICT",
            parent_id: Some(777),
            seccion_municipio_id: None,
            seccion_distrito_id: None,
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_validacion_detecta_ciclos() {
    let conn = test_conn();
    seed_padron(&conn);
    units::populate_administrative_units(&conn).unwrap();
    assert!(units::validate_hierarchy(&conn).is_ok());

    // Forzar un ciclo: el estado pasa a ser hijo de una de sus secciones
    let seccion_unit = &units::list_units(&conn, Some("SECTION"), None, None).unwrap()[0];
    let state = &units::list_units(&conn, Some("STATE"), None, None).unwrap()[0];
    conn.execute(
        "UPDATE administrative_units SET parent_id = ?1 WHERE id = ?2",
        rusqlite::params![seccion_unit.id, state.id],
    )
    .unwrap();
    assert!(units::validate_hierarchy(&conn).is_err());
}

#[test]
fn test_arbol_ordenado_con_asignaciones() {
    let conn = test_conn();
    seed_padron(&conn);
    units::populate_administrative_units(&conn).unwrap();

    let ana = users::insert_user(&conn, "ana@example.com", "Ana", None, None).unwrap();
    let state = &units::list_units(&conn, Some("STATE"), None, None).unwrap()[0];
    users::insert_assignment(&conn, ana.id, state.id, 1).unwrap();

    // Asignación cuyo usuario ya no existe
    let luis = users::insert_user(&conn, "luis@example.com", "Luis", None, None).unwrap();
    users::insert_assignment(&conn, luis.id, state.id, 6).unwrap();
    users::delete_user(&conn, luis.id).unwrap();
    conn.execute(
        "INSERT INTO user_assignments (user_id, administrative_unit_id, role, created_at) \
         VALUES (?1, ?2, 6, '2024-01-01T00:00:00Z')",
        rusqlite::params![luis.id, state.id],
    )
    .unwrap();

    let tree = units::build_administrative_tree(&conn).expect("Debe construir el árbol");
    assert_eq!(tree.len(), 1);
    let root = &tree[0];
    assert_eq!(root.unit_type, "STATE");
    assert_eq!(root.assignments.len(), 2);
    assert!(root
        .assignments
        .iter()
        .any(|a| a.user_email == format!("usuario{}@desconocido.local", luis.id)));
    assert!(root.assignments.iter().any(|a| a.role_label == "Coordinación Estatal"));

    // Hijos del estado ordenados alfabéticamente: Morelia Noroeste, Uruapan
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].name, "Morelia Noroeste");
    assert_eq!(root.children[1].name, "Uruapan");

    // Bajo el distrito de Morelia está el municipio con sus dos secciones
    let morelia_district = &root.children[0];
    assert_eq!(morelia_district.children.len(), 1);
    let morelia = &morelia_district.children[0];
    assert_eq!(morelia.name, "Morelia");
    assert_eq!(morelia.children.len(), 2);
    assert_eq!(morelia.children[0].name, "Sección 1");
}

#[test]
fn test_busqueda_ordena_por_similitud() {
    let conn = test_conn();
    for (name, code) in [("Ciudad Morelia", "52"), ("Morelia", "53"), ("Zamora", "54")] {
        units::insert_unit(
            &conn,
            &NewUnit {
                name,
                code: Some(code),
                unit_type: "MUNICIPALITY",
                parent_id: None,
                seccion_municipio_id: None,
                seccion_distrito_id: None,
            },
        )
        .unwrap();
    }

    let found = units::list_units(&conn, None, None, Some("Morelia")).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].name, "Morelia");

    let by_type = units::list_units(&conn, Some("MUNICIPALITY"), None, None).unwrap();
    assert_eq!(by_type.len(), 3);
}

#[test]
fn test_catalogos_de_secciones() {
    let conn = test_conn();
    seed_padron(&conn);

    assert_eq!(units::count_secciones(&conn).unwrap(), 3);
    let municipios = units::distinct_municipios(&conn).unwrap();
    assert_eq!(municipios.len(), 2);
    assert_eq!(municipios[0].1, "Morelia");

    let distritos = units::distinct_distritos(&conn).unwrap();
    assert_eq!(distritos.len(), 2);
    assert_eq!(distritos[0].0, 10);

    let page = units::list_secciones(&conn, Some(52), None, 10, 0).unwrap();
    assert_eq!(page.len(), 2);
    let offset_page = units::list_secciones(&conn, None, None, 2, 2).unwrap();
    assert_eq!(offset_page.len(), 1);
}
