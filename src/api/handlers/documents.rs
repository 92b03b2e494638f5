use crate::auth;
use crate::config::settings;
use crate::models::Committee;
use crate::store;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::stream::StreamExt;
use serde_json::json;
use std::path::Path;

fn owned_committee(
    conn: &rusqlite::Connection,
    committee_id: i64,
    email: &str,
) -> Result<Option<Committee>, Box<dyn std::error::Error>> {
    Ok(store::committees::get_committee(conn, committee_id)?.filter(|c| c.owner_id == email))
}

/// POST /committees/{id}/documents
/// Subida multipart de evidencias. Solo imágenes; cada archivo se guarda con
/// nombre aleatorio bajo la carpeta del comité.
pub async fn upload_documents_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    mut payload: Multipart,
) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let committee_id = path.into_inner();
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let committee = match owned_committee(&conn, committee_id, &user.email) {
        Ok(Some(c)) => c,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    let upload_dir = settings().upload_dir.clone();
    let base_dir = Path::new(&upload_dir).join("committees").join(committee.id.to_string());
    if let Err(e) = std::fs::create_dir_all(&base_dir) {
        return HttpResponse::InternalServerError()
            .json(json!({"error": format!("failed to create upload dir: {}", e)}));
    }

    let mut saved = Vec::new();
    while let Some(field_res) = payload.next().await {
        let mut field = match field_res {
            Ok(f) => f,
            Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("multipart error: {}", e)})),
        };

        let content_type = field.content_type().to_string();
        if !content_type.starts_with("image/") {
            return HttpResponse::BadRequest().json(json!({"error": "Solo se permiten imágenes"}));
        }

        let original_name = field
            .content_disposition()
            .get_filename()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "imagen.jpg".to_string());
        let ext = Path::new(&original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_else(|| ".jpg".to_string());
        let new_name = format!("{}{}", uuid::Uuid::new_v4().simple(), ext);

        let mut content: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => content.extend_from_slice(&bytes),
                Err(e) => {
                    return HttpResponse::BadRequest().json(json!({"error": format!("upload stream error: {}", e)}));
                }
            }
        }

        let full_path = base_dir.join(&new_name);
        if let Err(e) = tokio::fs::write(&full_path, &content).await {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("failed to write upload: {}", e)}));
        }

        // La fila guarda la ruta relativa al directorio de subidas
        let relative = format!("committees/{}/{}", committee.id, new_name);
        match store::committees::insert_document(
            &conn,
            committee.id,
            &relative,
            &original_name,
            &content_type,
            content.len() as i64,
        ) {
            Ok(doc) => saved.push(doc),
            Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
        }
    }

    HttpResponse::Ok().json(saved)
}

/// GET /committees/{id}/documents
pub async fn list_documents_handler(req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    let committee = match owned_committee(&conn, path.into_inner(), &user.email) {
        Ok(Some(c)) => c,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::committees::documents_for_committee(&conn, committee.id) {
        Ok(docs) => HttpResponse::Ok().json(docs),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// DELETE /committees/{id}/documents/{document_id}
pub async fn delete_document_handler(req: HttpRequest, path: web::Path<(i64, i64)>) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let (committee_id, document_id) = path.into_inner();
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    if let Ok(None) | Err(_) = owned_committee(&conn, committee_id, &user.email) {
        return HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"}));
    }
    let doc = match store::committees::get_document(&conn, document_id) {
        Ok(Some(d)) if d.committee_id == committee_id => d,
        Ok(_) => return HttpResponse::NotFound().json(json!({"error": "Documento no encontrado"})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    let file_path = Path::new(&settings().upload_dir).join(&doc.filename);
    if file_path.exists() {
        // Errores de disco no bloquean la baja en la base
        let _ = std::fs::remove_file(&file_path);
    }
    if let Err(e) = store::committees::delete_document(&conn, doc.id) {
        return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)}));
    }
    HttpResponse::NoContent().finish()
}

/// GET /uploads/{ruta}
/// Sirve los archivos subidos (equivalente al montaje estático del
/// directorio de subidas).
pub async fn serve_upload_handler(path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();
    if name.contains("..") {
        return HttpResponse::BadRequest().json(json!({"error": "invalid path"}));
    }
    let full = Path::new(&settings().upload_dir).join(&name);
    if !full.exists() {
        return HttpResponse::NotFound().json(json!({"error": "file not found"}));
    }
    match tokio::fs::read(&full).await {
        Ok(bytes) => {
            let mime = match full.extension().and_then(std::ffi::OsStr::to_str) {
                Some("jpg") | Some("jpeg") => "image/jpeg",
                Some("png") => "image/png",
                Some("gif") => "image/gif",
                Some("webp") => "image/webp",
                Some("pdf") => "application/pdf",
                _ => "application/octet-stream",
            };
            HttpResponse::Ok().content_type(mime).body(bytes)
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("failed to read file: {}", e)})),
    }
}
