use crate::auth;
use crate::config::settings;
use crate::ocr;
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Responder};
use futures_util::stream::StreamExt;
use serde_json::json;

/// POST /ocr/ine
/// Recibe la foto de una credencial y devuelve los campos extraídos por el
/// modelo de visión (con heurísticas de respaldo sobre el texto crudo).
pub async fn ocr_ine_handler(req: HttpRequest, mut payload: Multipart) -> impl Responder {
    if let Err(e) = auth::authenticate(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": e}));
    }

    let mut content: Vec<u8> = Vec::new();
    let mut content_type = String::new();
    while let Some(field_res) = payload.next().await {
        let mut field = match field_res {
            Ok(f) => f,
            Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("multipart error: {}", e)})),
        };
        content_type = field.content_type().to_string();
        if !content_type.starts_with("image/") {
            return HttpResponse::BadRequest().json(json!({"error": "Solo se permiten imágenes"}));
        }
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => content.extend_from_slice(&bytes),
                Err(e) => {
                    return HttpResponse::BadRequest().json(json!({"error": format!("upload stream error: {}", e)}));
                }
            }
        }
        // Solo se procesa el primer archivo
        break;
    }

    if content.is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "Solo se permiten imágenes"}));
    }
    if settings().openai_api_key.is_empty() {
        return HttpResponse::InternalServerError().json(json!({"error": "OPENAI_API_KEY no configurada"}));
    }

    let text = match ocr::vision_extract(&content, &content_type).await {
        Ok(t) => t,
        Err(e) => {
            return HttpResponse::BadGateway().json(json!({"error": format!("Error al llamar OpenAI: {}", e)}));
        }
    };

    let fields = match ocr::parse_model_reply(&text) {
        Some(f) => f,
        None => ocr::extract_fields_from_text(&text),
    };
    HttpResponse::Ok().json(fields)
}
