use crate::api::AttendanceIn;
use crate::auth;
use crate::config::settings;
use crate::store;
use crate::store::attendance::NewAttendance;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use std::collections::HashMap;

/// POST /oauth/attendance/
/// Registra asistencia verificando la credencial de Google y guardando los
/// metadatos de la petición (IP, agente, geolocalización).
pub async fn register_attendance_handler(req: HttpRequest, body: web::Json<AttendanceIn>) -> impl Responder {
    let data = body.into_inner();

    if data.provider != "google" {
        return HttpResponse::BadRequest().json(json!({"error": "Only Google provider is supported"}));
    }
    if data.credential.is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "credential is required"}));
    }
    if data.device_id.is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "device_id is required"}));
    }

    let cfg = settings();
    if cfg.google_client_id.is_empty() {
        return HttpResponse::InternalServerError().json(json!({"error": "GOOGLE_CLIENT_ID not configured"}));
    }
    let claims = match auth::google::verify_id_token(&data.credential, &cfg.google_client_id).await {
        Ok(c) => c,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("Invalid Google token: {}", e)})),
    };
    let email = claims.email.clone().unwrap_or_default();

    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    let (latitude, longitude, accuracy) = match &data.location {
        Some(loc) => (loc.lat, loc.lng, loc.accuracy),
        None => (None, None, None),
    };

    let conn = match store::open_store_connection() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let record = NewAttendance {
        provider: data.provider,
        provider_user_id: claims.sub,
        email,
        name: claims.name.clone().unwrap_or_default(),
        device_id: data.device_id,
        user_agent,
        ip,
        latitude,
        longitude,
        accuracy,
        timezone: data.timezone,
    };
    match store::attendance::record_attendance(&conn, &record) {
        Ok(id) => HttpResponse::Ok().json(json!({"ok": true, "id": id})),
        Err(e) => HttpResponse::BadRequest()
            .json(json!({"error": format!("Failed to create attendance record: {}", e)})),
    }
}

/// GET /oauth/attendance/?skip=0&limit=100
pub async fn list_attendance_handler(query: web::Query<HashMap<String, String>>) -> impl Responder {
    let skip = query.get("skip").and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
    let limit = query.get("limit").and_then(|s| s.parse::<i64>().ok()).unwrap_or(100);

    let conn = match store::open_store_connection() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::attendance::fetch_recent_attendance(&conn, limit, skip) {
        Ok(records) => {
            let rows: Vec<serde_json::Value> =
                records.iter().map(|a| json!({"ok": true, "id": a.id})).collect();
            HttpResponse::Ok().json(rows)
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}
