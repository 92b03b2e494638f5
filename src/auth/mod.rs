pub mod google;
pub mod token;

use crate::config::settings;
use crate::models::User;
use crate::store;
use actix_web::HttpRequest;
use chrono::Utc;

/// Extrae el token de un encabezado `Authorization: Bearer ...`.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let rest = header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer "))?;
    let trimmed = rest.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Resuelve el usuario autenticado de la petición. El mensaje de error se
/// devuelve tal cual al cliente con estatus 401.
pub fn authenticate(req: &HttpRequest) -> Result<User, String> {
    let token = match bearer_token(req) {
        Some(t) => t,
        None => return Err("No autenticado".to_string()),
    };
    let cfg = settings();
    let claims = token::decode_token(&token, cfg.jwt_secret.as_bytes(), Utc::now().timestamp())
        .map_err(|_| "Token inválido".to_string())?;

    let conn = store::open().map_err(|e| format!("store error: {}", e))?;
    match store::users::find_user_by_id(&conn, claims.sub) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err("Usuario no encontrado".to_string()),
        Err(e) => Err(format!("store error: {}", e)),
    }
}

/// Verificación case-insensitive contra la lista de administradores.
pub fn is_admin(user: &User) -> bool {
    settings().is_admin(&user.email)
}
