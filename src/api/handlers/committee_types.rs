use crate::api::CommitteeTypeCreate;
use crate::auth;
use crate::store;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

/// GET /committee-types
pub async fn list_committee_types_handler(req: HttpRequest) -> impl Responder {
    if let Err(e) = auth::authenticate(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": e}));
    }
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::committees::list_active_types(&conn) {
        Ok(types) => HttpResponse::Ok().json(types),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// POST /committee-types
pub async fn create_committee_type_handler(
    req: HttpRequest,
    body: web::Json<CommitteeTypeCreate>,
) -> impl Responder {
    if let Err(e) = auth::authenticate(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": e}));
    }
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::committees::find_type_by_name(&conn, &body.name) {
        Ok(Some(_)) => return HttpResponse::BadRequest().json(json!({"error": "El tipo ya existe"})),
        Ok(None) => {}
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
    match store::committees::insert_type(&conn, &body.name, body.is_active) {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}
