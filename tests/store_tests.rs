use comites::store::committees::{self, NewCommittee, NewMember};
use comites::store::db::init_schema;
use comites::store::users;
use rusqlite::Connection;

fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("Debe abrir base en memoria");
    init_schema(&conn).expect("Debe crear el esquema");
    conn
}

fn new_committee<'a>(owner: &'a str, email: &'a str, seccion: &'a str) -> NewCommittee<'a> {
    NewCommittee {
        name: "Comité Centro",
        section_number: seccion,
        tipo: "seccional",
        owner_email: owner,
        presidente: "Ana Torres",
        email,
        clave_afiliacion: "AF-001",
        telefono: "4430000000",
        administrative_unit_id: None,
    }
}

#[test]
fn test_esquema_sobre_archivo() {
    let dir = tempfile::tempdir().expect("Debe crear tempdir");
    let path = dir.path().join("comites.db");
    let conn = Connection::open(&path).expect("Debe abrir archivo");
    init_schema(&conn).expect("Debe crear el esquema");
    // Idempotente sobre una base ya creada
    init_schema(&conn).expect("Debe tolerar re-ejecución");
    users::insert_user(&conn, "ana@example.com", "Ana", None, None).unwrap();
    drop(conn);

    let again = Connection::open(&path).unwrap();
    assert!(users::find_user_by_email(&again, "ana@example.com").unwrap().is_some());
}

#[test]
fn test_migracion_de_columnas_heredadas() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute(
        "CREATE TABLE committees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            section_number TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO committees (name, section_number, type, owner_id, created_at) \
         VALUES ('Viejo', '1', 'seccional', 'ana@example.com', '2023-01-01T00:00:00Z')",
        [],
    )
    .unwrap();

    init_schema(&conn).expect("Debe migrar columnas heredadas");

    let c = committees::get_committee(&conn, 1).unwrap().expect("Debe leerse con el esquema nuevo");
    assert_eq!(c.name, "Viejo");
    assert_eq!(c.presidente, "");
    assert_eq!(c.telefono, "");
    assert_eq!(c.administrative_unit_id, None);
}

#[test]
fn test_usuarios_crud() {
    let conn = test_conn();
    let user = users::insert_user(&conn, "ana@example.com", "Ana", Some("4431112222"), None)
        .expect("Debe insertar usuario");
    assert!(user.id > 0);

    let found = users::find_user_by_email(&conn, "ana@example.com")
        .expect("Debe consultar")
        .expect("Debe existir");
    assert_eq!(found.id, user.id);
    assert_eq!(found.phone.as_deref(), Some("4431112222"));

    assert!(users::find_user_by_email(&conn, "nadie@example.com").unwrap().is_none());

    let listado = users::list_users(&conn).expect("Debe listar");
    assert_eq!(listado.len(), 1);

    users::delete_user(&conn, user.id).expect("Debe eliminar");
    assert!(users::find_user_by_id(&conn, user.id).unwrap().is_none());
}

#[test]
fn test_correo_unico() {
    let conn = test_conn();
    users::insert_user(&conn, "ana@example.com", "Ana", None, None).unwrap();
    assert!(users::insert_user(&conn, "ana@example.com", "Otra Ana", None, None).is_err());
}

#[test]
fn test_asignacion_mas_reciente_define_el_rol() {
    let conn = test_conn();
    let user = users::insert_user(&conn, "ana@example.com", "Ana", None, None).unwrap();
    comites::store::units::insert_unit(
        &conn,
        &comites::store::units::NewUnit {
            name: "Michoacán",
            code: Some("16"),
            unit_type: "STATE",
            parent_id: None,
            seccion_municipio_id: None,
            seccion_distrito_id: None,
        },
    )
    .unwrap();

    assert!(users::latest_assignment_for_user(&conn, user.id).unwrap().is_none());

    users::insert_assignment(&conn, user.id, 1, 6).unwrap();
    users::insert_assignment(&conn, user.id, 1, 3).unwrap();

    let latest = users::latest_assignment_for_user(&conn, user.id)
        .unwrap()
        .expect("Debe haber asignación");
    assert_eq!(latest.role, 3);

    // El triple (usuario, unidad, rol) se puede localizar para evitar duplicados
    assert!(users::find_assignment(&conn, user.id, 1, 6).unwrap().is_some());
    assert!(users::find_assignment(&conn, user.id, 1, 5).unwrap().is_none());
}

#[test]
fn test_filtros_de_asignaciones() {
    let conn = test_conn();
    let ana = users::insert_user(&conn, "ana@example.com", "Ana", None, None).unwrap();
    let luis = users::insert_user(&conn, "luis@example.com", "Luis", None, None).unwrap();
    comites::store::units::insert_unit(
        &conn,
        &comites::store::units::NewUnit {
            name: "Michoacán",
            code: Some("16"),
            unit_type: "STATE",
            parent_id: None,
            seccion_municipio_id: None,
            seccion_distrito_id: None,
        },
    )
    .unwrap();
    users::insert_assignment(&conn, ana.id, 1, 1).unwrap();
    users::insert_assignment(&conn, luis.id, 1, 6).unwrap();

    assert_eq!(users::list_assignments(&conn, None, None, None).unwrap().len(), 2);
    assert_eq!(users::list_assignments(&conn, Some(ana.id), None, None).unwrap().len(), 1);
    assert_eq!(users::list_assignments(&conn, None, None, Some(6)).unwrap().len(), 1);
    assert!(users::list_assignments(&conn, Some(ana.id), None, Some(6)).unwrap().is_empty());
}

#[test]
fn test_comite_con_integrantes() {
    let conn = test_conn();
    let committee = committees::insert_committee(&conn, &new_committee("ana@example.com", "comite@example.com", "123"))
        .expect("Debe crear comité");

    committees::insert_member(
        &conn,
        committee.id,
        &NewMember {
            full_name: "Luis Pérez",
            ine_key: "PRLS900101HMNRRS09",
            phone: "4435556666",
            email: "luis@example.com",
            section_number: "123",
            invited_by: "Ana Torres",
        },
    )
    .expect("Debe agregar integrante");

    assert_eq!(committees::count_members(&conn, committee.id).unwrap(), 1);
    let members = committees::members_for_committee(&conn, committee.id).unwrap();
    assert_eq!(members[0].full_name, "Luis Pérez");

    committees::delete_member(&conn, members[0].id).unwrap();
    assert_eq!(committees::count_members(&conn, committee.id).unwrap(), 0);
}

#[test]
fn test_visibilidad_por_correo() {
    let conn = test_conn();
    committees::insert_committee(&conn, &new_committee("ana@example.com", "contacto@example.com", "1")).unwrap();
    committees::insert_committee(&conn, &new_committee("otra@example.com", "ana@example.com", "2")).unwrap();
    committees::insert_committee(&conn, &new_committee("tercero@example.com", "x@example.com", "3")).unwrap();

    // Propietaria de uno y correo de contacto de otro
    let visibles = committees::list_committees_for_email(&conn, "ana@example.com").unwrap();
    assert_eq!(visibles.len(), 2);

    let contacto = committees::find_committee_by_contact_email(&conn, "contacto@example.com")
        .unwrap()
        .expect("Debe existir");
    assert_eq!(contacto.owner_id, "ana@example.com");
}

#[test]
fn test_documentos_y_baja_total() {
    let conn = test_conn();
    let committee = committees::insert_committee(&conn, &new_committee("ana@example.com", "c@example.com", "9")).unwrap();

    assert!(!committees::has_document(&conn, committee.id).unwrap());
    committees::insert_document(&conn, committee.id, "committees/1/a.jpg", "foto.jpg", "image/jpeg", 1024)
        .expect("Debe guardar documento");
    assert!(committees::has_document(&conn, committee.id).unwrap());

    let docs = committees::documents_for_committee(&conn, committee.id).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].original_name, "foto.jpg");

    let galeria = committees::list_all_documents(&conn).unwrap();
    assert_eq!(galeria.len(), 1);
    assert_eq!(galeria[0].2, "Comité Centro");

    committees::insert_member(
        &conn,
        committee.id,
        &NewMember {
            full_name: "Luis",
            ine_key: "X",
            phone: "1",
            email: "l@example.com",
            section_number: "9",
            invited_by: "Ana",
        },
    )
    .unwrap();

    committees::delete_committee_row(&conn, committee.id).expect("Debe eliminar todo");
    assert!(committees::get_committee(&conn, committee.id).unwrap().is_none());
    assert_eq!(committees::count_members(&conn, committee.id).unwrap(), 0);
    assert!(committees::documents_for_committee(&conn, committee.id).unwrap().is_empty());
}

#[test]
fn test_tipos_de_comite() {
    let conn = test_conn();
    committees::insert_type(&conn, "seccional", true).unwrap();
    committees::insert_type(&conn, "especial", false).unwrap();

    let activos = committees::list_active_types(&conn).unwrap();
    assert_eq!(activos.len(), 1);
    assert_eq!(activos[0].name, "seccional");

    assert!(committees::find_active_type_by_name(&conn, "seccional").unwrap().is_some());
    assert!(committees::find_active_type_by_name(&conn, "especial").unwrap().is_none());
    assert!(committees::find_type_by_name(&conn, "especial").unwrap().is_some());

    // Nombre duplicado rechazado por la restricción UNIQUE
    assert!(committees::insert_type(&conn, "seccional", true).is_err());
}
