// Administración de usuarios, unidades territoriales, asignaciones y el
// padrón de secciones. Solo accesible para los correos de la lista de
// administradores.

use crate::api::{AssignmentCreate, SeccionesImportIn, UserCreate};
use crate::auth;
use crate::models::User;
use crate::store;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;

fn role_name(role: i64) -> &'static str {
    match role {
        1 => "Coordinador Estatal",
        2 => "Delegado Regional",
        3 => "Coordinador Distrital",
        4 => "Coordinador Municipal",
        5 => "Coordinador Seccional",
        6 => "Presidente de Comité",
        _ => "Desconocido",
    }
}

fn verify_admin(req: &HttpRequest) -> Result<User, HttpResponse> {
    let user = match auth::authenticate(req) {
        Ok(u) => u,
        Err(e) => return Err(HttpResponse::Unauthorized().json(json!({"error": e}))),
    };
    if !auth::is_admin(&user) {
        return Err(HttpResponse::Forbidden()
            .json(json!({"error": "Solo el administrador puede acceder a este recurso"})));
    }
    Ok(user)
}

fn open_conn() -> Result<Connection, HttpResponse> {
    store::open().map_err(|e| {
        HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)}))
    })
}

fn store_error(e: Box<dyn std::error::Error>) -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)}))
}

// ---- Usuarios ----

/// GET /admin/users
pub async fn get_users_handler(req: HttpRequest) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::users::list_users(&conn) {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => store_error(e),
    }
}

/// POST /admin/users
pub async fn create_user_handler(req: HttpRequest, body: web::Json<UserCreate>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::users::find_user_by_email(&conn, &body.email) {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest()
                .json(json!({"error": "Ya existe un usuario con ese correo electrónico"}));
        }
        Ok(None) => {}
        Err(e) => return store_error(e),
    }
    match store::users::insert_user(&conn, &body.email, &body.name, body.phone.as_deref(), None) {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(e) => store_error(e),
    }
}

/// DELETE /admin/users/{id}
pub async fn delete_user_handler(req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match store::users::find_user_by_id(&conn, path.into_inner()) {
        Ok(Some(u)) => u,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "Usuario no encontrado"})),
        Err(e) => return store_error(e),
    };
    if auth::is_admin(&user) {
        return HttpResponse::BadRequest()
            .json(json!({"error": "No se puede eliminar a un usuario administrador"}));
    }
    match store::users::delete_user(&conn, user.id) {
        Ok(()) => HttpResponse::Ok().json(json!({"success": true, "message": "Usuario eliminado"})),
        Err(e) => store_error(e),
    }
}

// ---- Unidades administrativas ----

fn unit_response(conn: &Connection, unit: &crate::models::AdministrativeUnit) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let children = store::units::children_count(conn, unit.id)?;
    let assignments = store::units::assignments_count(conn, unit.id)?;
    let parent_name = match unit.parent_id {
        Some(pid) => store::units::get_unit(conn, pid)?.map(|p| p.name),
        None => None,
    };
    Ok(json!({
        "id": unit.id,
        "name": unit.name,
        "code": unit.code,
        "unit_type": unit.unit_type,
        "parent_id": unit.parent_id,
        "parent_name": parent_name,
        "seccion_municipio_id": unit.seccion_municipio_id,
        "seccion_distrito_id": unit.seccion_distrito_id,
        "children_count": children,
        "assignments_count": assignments,
    }))
}

/// GET /admin/administrative-units?unit_type=&parent_id=&search=
pub async fn get_units_handler(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let qm = query.into_inner();
    let unit_type = qm.get("unit_type").filter(|s| !s.is_empty()).map(String::as_str);
    let parent_id = qm.get("parent_id").and_then(|s| s.parse::<i64>().ok());
    let search = qm.get("search").filter(|s| !s.is_empty()).map(String::as_str);

    let units = match store::units::list_units(&conn, unit_type, parent_id, search) {
        Ok(u) => u,
        Err(e) => return store_error(e),
    };
    let mut out = Vec::with_capacity(units.len());
    for unit in &units {
        match unit_response(&conn, unit) {
            Ok(v) => out.push(v),
            Err(e) => return store_error(e),
        }
    }
    HttpResponse::Ok().json(out)
}

/// GET /admin/administrative-units/{id}
pub async fn get_unit_handler(req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::units::get_unit(&conn, path.into_inner()) {
        Ok(Some(unit)) => match unit_response(&conn, &unit) {
            Ok(v) => HttpResponse::Ok().json(v),
            Err(e) => store_error(e),
        },
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "Unidad administrativa no encontrada"})),
        Err(e) => store_error(e),
    }
}

/// POST /admin/administrative-units/populate
/// Reconstruye la jerarquía territorial a partir del padrón de secciones.
pub async fn populate_units_handler(req: HttpRequest) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::units::populate_administrative_units(&conn) {
        Ok(summary) => HttpResponse::Ok().json(json!({"status": "ok", "summary": summary})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("populate failed: {}", e)})),
    }
}

// ---- Asignaciones ----

fn assignment_response(
    conn: &Connection,
    assignment: &crate::models::UserAssignment,
) -> Result<Option<serde_json::Value>, Box<dyn std::error::Error>> {
    let user = store::users::find_user_by_id(conn, assignment.user_id)?;
    let unit = store::units::get_unit(conn, assignment.administrative_unit_id)?;
    let (user, unit) = match (user, unit) {
        (Some(u), Some(n)) => (u, n),
        _ => return Ok(None),
    };
    Ok(Some(json!({
        "id": assignment.id,
        "user_id": assignment.user_id,
        "user_email": user.email,
        "user_name": user.name,
        "administrative_unit_id": assignment.administrative_unit_id,
        "unit_name": unit.name,
        "unit_type": unit.unit_type,
        "role": assignment.role,
        "role_name": role_name(assignment.role),
        "created_at": assignment.created_at,
    })))
}

/// GET /admin/assignments?user_id=&administrative_unit_id=&role=
pub async fn get_assignments_handler(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let qm = query.into_inner();
    let user_id = qm.get("user_id").and_then(|s| s.parse::<i64>().ok());
    let unit_id = qm.get("administrative_unit_id").and_then(|s| s.parse::<i64>().ok());
    let role = qm.get("role").and_then(|s| s.parse::<i64>().ok());

    let assignments = match store::users::list_assignments(&conn, user_id, unit_id, role) {
        Ok(a) => a,
        Err(e) => return store_error(e),
    };
    let mut out = Vec::new();
    for assignment in &assignments {
        match assignment_response(&conn, assignment) {
            Ok(Some(v)) => out.push(v),
            Ok(None) => {}
            Err(e) => return store_error(e),
        }
    }
    HttpResponse::Ok().json(out)
}

/// POST /admin/assignments
pub async fn create_assignment_handler(req: HttpRequest, body: web::Json<AssignmentCreate>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let data = body.into_inner();

    match store::users::find_user_by_id(&conn, data.user_id) {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "Usuario no encontrado"})),
        Err(e) => return store_error(e),
    }
    match store::units::get_unit(&conn, data.administrative_unit_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({"error": "Unidad administrativa no encontrada"}));
        }
        Err(e) => return store_error(e),
    }
    match store::users::find_assignment(&conn, data.user_id, data.administrative_unit_id, data.role) {
        Ok(Some(_)) => return HttpResponse::BadRequest().json(json!({"error": "Esta asignación ya existe"})),
        Ok(None) => {}
        Err(e) => return store_error(e),
    }

    let assignment = match store::users::insert_assignment(&conn, data.user_id, data.administrative_unit_id, data.role) {
        Ok(a) => a,
        Err(e) => return store_error(e),
    };
    match assignment_response(&conn, &assignment) {
        Ok(Some(v)) => HttpResponse::Ok().json(v),
        Ok(None) => HttpResponse::InternalServerError().json(json!({"error": "assignment references missing rows"})),
        Err(e) => store_error(e),
    }
}

/// DELETE /admin/assignments/{id}
pub async fn delete_assignment_handler(req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::users::get_assignment(&conn, path.into_inner()) {
        Ok(Some(a)) => match store::users::delete_assignment(&conn, a.id) {
            Ok(_) => HttpResponse::Ok().json(json!({"success": true, "message": "Asignación eliminada"})),
            Err(e) => store_error(e),
        },
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "Asignación no encontrada"})),
        Err(e) => store_error(e),
    }
}

// ---- Secciones ----

/// GET /admin/secciones?municipio=&distrito=&limit=100&offset=0
pub async fn get_secciones_handler(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let qm = query.into_inner();
    let municipio = qm.get("municipio").and_then(|s| s.parse::<i64>().ok());
    let distrito = qm.get("distrito").and_then(|s| s.parse::<i64>().ok());
    let limit = qm.get("limit").and_then(|s| s.parse::<i64>().ok()).unwrap_or(100);
    let offset = qm.get("offset").and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);

    match store::units::list_secciones(&conn, municipio, distrito, limit, offset) {
        Ok(secciones) => HttpResponse::Ok().json(secciones),
        Err(e) => store_error(e),
    }
}

/// GET /admin/secciones/municipios
pub async fn get_municipios_handler(req: HttpRequest) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::units::distinct_municipios(&conn) {
        Ok(rows) => {
            let out: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|(id, nombre)| json!({"id": id, "nombre": nombre}))
                .collect();
            HttpResponse::Ok().json(out)
        }
        Err(e) => store_error(e),
    }
}

/// GET /admin/secciones/distritos
pub async fn get_distritos_handler(req: HttpRequest) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::units::distinct_distritos(&conn) {
        Ok(rows) => {
            let out: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|(id, nombre)| json!({"id": id, "nombre": nombre}))
                .collect();
            HttpResponse::Ok().json(out)
        }
        Err(e) => store_error(e),
    }
}

/// POST /admin/secciones/import
/// Importa el padrón de secciones desde un workbook en disco.
pub async fn import_secciones_handler(req: HttpRequest, body: web::Json<SeccionesImportIn>) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    if body.file.contains("..") {
        return HttpResponse::BadRequest().json(json!({"error": "invalid file path"}));
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::import::import_secciones(&conn, &body.file) {
        Ok(count) => HttpResponse::Ok().json(json!({"status": "ok", "imported": count})),
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("import failed: {}", e)})),
    }
}

// ---- Estadísticas ----

/// GET /admin/stats
pub async fn admin_stats_handler(req: HttpRequest) -> impl Responder {
    if let Err(resp) = verify_admin(&req) {
        return resp;
    }
    let conn = match open_conn() {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match store::reports::admin_stats(&conn) {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(e) => store_error(e),
    }
}
