use crate::api::{CommitteeCreate, CommitteeOut, MemberCreate};
use crate::auth;
use crate::config::settings;
use crate::models::{Committee, ROLE_PRESIDENTE_COMITE};
use crate::store;
use crate::store::committees::{NewCommittee, NewMember};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;

fn committee_out(conn: &Connection, committee: Committee) -> Result<CommitteeOut, Box<dyn std::error::Error>> {
    let members = store::committees::members_for_committee(conn, committee.id)?;
    let has_document = store::committees::has_document(conn, committee.id)?;
    Ok(CommitteeOut::from_committee(committee, members, has_document))
}

/// El comité es visible para quien lo posee o para el correo de contacto.
fn visible_for(committee: &Committee, email: &str) -> bool {
    committee.owner_id == email || committee.email == email
}

/// POST /committees
/// Alta de comité con integrantes opcionales. Solo la presidencia (rol 6)
/// puede capturar integrantes en el alta; el tipo debe existir y estar
/// activo.
pub async fn create_committee_handler(req: HttpRequest, body: web::Json<CommitteeCreate>) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let data = body.into_inner();

    let ua = match store::users::latest_assignment_for_user(&conn, user.id) {
        Ok(ua) => ua,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let ua = match ua {
        Some(ua) => ua,
        None => return HttpResponse::Forbidden().json(json!({"error": "Tu rol no permite crear comités"})),
    };
    if ua.role != ROLE_PRESIDENTE_COMITE && !data.members.is_empty() {
        return HttpResponse::Forbidden()
            .json(json!({"error": "Tu rol no permite agregar integrantes al crear comité"}));
    }
    let max_members = settings().max_members_per_committee;
    if data.members.len() > max_members {
        return HttpResponse::BadRequest().json(json!({"error": format!("Máximo {} integrantes", max_members)}));
    }

    match store::committees::find_active_type_by_name(&conn, &data.tipo) {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::BadRequest().json(json!({"error": "Tipo de comité inválido o inactivo"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }

    let committee = match store::committees::insert_committee(
        &conn,
        &NewCommittee {
            name: &data.name,
            section_number: &data.section_number,
            tipo: &data.tipo,
            owner_email: &user.email,
            presidente: &data.presidente,
            email: &data.email,
            clave_afiliacion: &data.clave_afiliacion,
            telefono: &data.telefono,
            administrative_unit_id: data.administrative_unit_id,
        },
    ) {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    for m in &data.members {
        if let Err(e) = insert_member_row(&conn, committee.id, m) {
            return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)}));
        }
    }

    match committee_out(&conn, committee) {
        Ok(out) => HttpResponse::Ok().json(out),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

fn insert_member_row(conn: &Connection, committee_id: i64, m: &MemberCreate) -> Result<(), Box<dyn std::error::Error>> {
    store::committees::insert_member(
        conn,
        committee_id,
        &NewMember {
            full_name: &m.full_name,
            ine_key: &m.ine_key,
            phone: &m.phone,
            email: &m.email,
            section_number: &m.section_number,
            invited_by: &m.invited_by,
        },
    )?;
    Ok(())
}

/// GET /committees
pub async fn list_committees_handler(req: HttpRequest) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let committees = match store::committees::list_committees_for_email(&conn, &user.email) {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let mut out = Vec::with_capacity(committees.len());
    for committee in committees {
        match committee_out(&conn, committee) {
            Ok(c) => out.push(c),
            Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
        }
    }
    HttpResponse::Ok().json(out)
}

/// GET /committees/{id}
pub async fn get_committee_handler(req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    if let Err(e) = auth::authenticate(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": e}));
    }
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::committees::get_committee(&conn, path.into_inner()) {
        Ok(Some(committee)) => match committee_out(&conn, committee) {
            Ok(out) => HttpResponse::Ok().json(out),
            Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
        },
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// POST /committees/{id}/members
pub async fn add_member_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<MemberCreate>,
) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let committee = match store::committees::get_committee(&conn, path.into_inner()) {
        Ok(Some(c)) if visible_for(&c, &user.email) => c,
        Ok(_) => return HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::users::latest_assignment_for_user(&conn, user.id) {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::Forbidden().json(json!({"error": "Tu rol no permite agregar integrantes"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
    match store::committees::count_members(&conn, committee.id) {
        Ok(n) if n >= settings().max_members_per_committee => {
            return HttpResponse::BadRequest().json(json!({"error": "Ya tiene el máximo de integrantes"}));
        }
        Ok(_) => {}
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
    if let Err(e) = insert_member_row(&conn, committee.id, &body.into_inner()) {
        eprintln!("Error al agregar miembro: {}", e);
        return HttpResponse::InternalServerError()
            .json(json!({"error": format!("Error al agregar miembro: {}", e)}));
    }
    match committee_out(&conn, committee) {
        Ok(out) => HttpResponse::Ok().json(out),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// DELETE /committees/{id}/members/{member_id}
pub async fn delete_member_handler(req: HttpRequest, path: web::Path<(i64, i64)>) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let (committee_id, member_id) = path.into_inner();
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let committee = match store::committees::get_committee(&conn, committee_id) {
        Ok(Some(c)) => c,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::users::latest_assignment_for_user(&conn, user.id) {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::Forbidden().json(json!({"error": "Tu rol no permite eliminar integrantes"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
    match store::committees::get_member(&conn, member_id) {
        Ok(Some(m)) if m.committee_id == committee.id => {
            if let Err(e) = store::committees::delete_member(&conn, member_id) {
                return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)}));
            }
        }
        Ok(_) => return HttpResponse::NotFound().json(json!({"error": "Integrante no encontrado"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
    match committee_out(&conn, committee) {
        Ok(out) => HttpResponse::Ok().json(out),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// DELETE /committees/{id}
/// Baja total: archivos en disco, carpeta del comité, integrantes,
/// documentos y la fila del comité.
pub async fn delete_committee_handler(req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let committee_id = path.into_inner();
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let committee = match store::committees::get_committee(&conn, committee_id) {
        Ok(Some(c)) if c.owner_id == user.email => c,
        Ok(_) => return HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    let upload_dir = settings().upload_dir.clone();
    match store::committees::documents_for_committee(&conn, committee.id) {
        Ok(docs) => {
            for d in docs {
                let file_path = Path::new(&upload_dir).join(&d.filename);
                if file_path.exists() {
                    // Errores de disco no bloquean la limpieza en la base
                    let _ = std::fs::remove_file(&file_path);
                }
            }
        }
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }

    let committee_dir = Path::new(&upload_dir).join("committees").join(committee.id.to_string());
    if committee_dir.is_dir() {
        let _ = std::fs::remove_dir_all(&committee_dir);
    }

    if let Err(e) = store::committees::delete_committee_row(&conn, committee.id) {
        return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)}));
    }
    HttpResponse::NoContent().finish()
}
