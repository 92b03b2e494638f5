use serde::Deserialize;
use std::error::Error;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Campos que usamos de la respuesta de verificación de Google.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    pub sub: String,
    pub aud: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifica un ID token de Google contra el endpoint `tokeninfo` y comprueba
/// que la audiencia coincida con el client id configurado.
pub async fn verify_id_token(id_token: &str, client_id: &str) -> Result<GoogleClaims, Box<dyn Error>> {
    if client_id.is_empty() {
        return Err("GOOGLE_CLIENT_ID no configurado".into());
    }

    let client = reqwest::Client::new();
    let resp = client
        .get(TOKENINFO_URL)
        .query(&[("id_token", id_token)])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(format!("Google rechazó el token (status {})", resp.status()).into());
    }

    let claims: GoogleClaims = resp.json().await?;
    match &claims.aud {
        Some(aud) if aud == client_id => {}
        _ => return Err("audiencia del token no coincide con el client id".into()),
    }
    if claims.email.as_deref().unwrap_or("").is_empty() {
        return Err("el token no incluye email".into());
    }
    Ok(claims)
}
