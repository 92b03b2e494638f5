use crate::config::settings;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::error::Error;
use std::sync::OnceLock;

/// Campos que se intentan leer de una credencial INE.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OcrFields {
    pub full_name: Option<String>,
    pub ine_key: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub section_number: Option<String>,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("regex estática inválida"))
}

fn re_email() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
}

fn re_phone() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b(?:\+?52\s*)?\d{10}\b")
}

fn re_ine() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b[0-9A-Z]{13,18}\b")
}

fn re_seccion() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)SECCI[ÓO]N\s*(\d{1,4})")
}

fn re_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b(\d{1,4})\b")
}

/// Heurísticas de respaldo sobre el texto plano cuando el modelo no entrega
/// un bloque JSON utilizable. Ajustar según el layout real de la credencial.
pub fn extract_fields_from_text(text: &str) -> OcrFields {
    let lines: Vec<&str> = text.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    let joined = lines.join(" \n ");

    let email = re_email().find(&joined).map(|m| m.as_str().to_string());
    let phone = re_phone().find(&joined).map(|m| m.as_str().to_string());
    let ine_key = re_ine().find(&joined).map(|m| m.as_str().to_string());

    let section_number = re_seccion()
        .captures(&joined)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            re_digits()
                .captures(&joined)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });

    // Candidato a nombre: la línea más larga escrita toda en mayúsculas con
    // al menos dos palabras
    let full_name = lines
        .iter()
        .filter(|l| l.split_whitespace().count() >= 2 && l.to_uppercase() == **l)
        .max_by_key(|l| l.len())
        .map(|l| l.to_string());

    OcrFields { full_name, ine_key, phone, email, section_number }
}

fn opt_string(v: &serde_json::Value, key: &str) -> Option<String> {
    match v.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Intenta recuperar el primer bloque JSON de la respuesta del modelo.
pub fn parse_model_reply(text: &str) -> Option<OcrFields> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let v: serde_json::Value = serde_json::from_str(&text[start..=end]).ok()?;
    Some(OcrFields {
        full_name: opt_string(&v, "full_name"),
        ine_key: opt_string(&v, "ine_key"),
        phone: opt_string(&v, "phone"),
        email: opt_string(&v, "email"),
        section_number: opt_string(&v, "section_number"),
    })
}

const VISION_PROMPT: &str = "Extrae del documento de identidad (INE de México) estos campos en texto plano, sin etiquetas ni adornos.\n\
- Nombre completo\n- Clave de elector (INE)\n- Teléfono (si aparece)\n- Email (si aparece)\n- Sección\n\
Responde primero con un bloque JSON con llaves: full_name, ine_key, phone, email, section_number.\n\
Si no encuentras un campo, deja null. Solo JSON.";

/// Envía la imagen al modelo de visión configurado y devuelve el texto de la
/// respuesta.
pub async fn vision_extract(content: &[u8], content_type: &str) -> Result<String, Box<dyn Error>> {
    let cfg = settings();
    if cfg.openai_api_key.is_empty() {
        return Err("OPENAI_API_KEY no configurada".into());
    }

    let b64 = STANDARD.encode(content);
    let body = json!({
        "model": cfg.openai_vision_model,
        "messages": [
            {
                "role": "user",
                "content": [
                    {"type": "text", "text": VISION_PROMPT},
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", content_type, b64),
                        },
                    },
                ],
            }
        ],
        "temperature": 0,
    });

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/chat/completions", cfg.openai_base_url))
        .header("Authorization", format!("Bearer {}", cfg.openai_api_key))
        .json(&body)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await?
        .error_for_status()?;

    let data: serde_json::Value = resp.json().await?;
    let text = data["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraccion_de_campos_basicos() {
        let text = "INSTITUTO NACIONAL ELECTORAL\n\
                    GARCIA LOPEZ MARIA\n\
                    Clave GRLPMR85010116M900\n\
                    SECCIÓN 1234\n\
                    correo: maria.garcia@example.com\n\
                    tel 4431234567";
        let fields = extract_fields_from_text(text);
        assert_eq!(fields.email.as_deref(), Some("maria.garcia@example.com"));
        assert_eq!(fields.phone.as_deref(), Some("4431234567"));
        assert_eq!(fields.ine_key.as_deref(), Some("GRLPMR85010116M900"));
        assert_eq!(fields.section_number.as_deref(), Some("1234"));
        assert_eq!(fields.full_name.as_deref(), Some("INSTITUTO NACIONAL ELECTORAL"));
    }

    #[test]
    fn test_seccion_sin_etiqueta_usa_primer_numero_corto() {
        let fields = extract_fields_from_text("REGISTRO 482 VIGENCIA 2030");
        assert_eq!(fields.section_number.as_deref(), Some("482"));
    }

    #[test]
    fn test_parse_model_reply_con_ruido() {
        let reply = "Claro, aquí está el JSON:\n{\"full_name\": \"JUAN PEREZ\", \"ine_key\": null, \
                     \"phone\": \"4430000000\", \"email\": null, \"section_number\": \"88\"}\nSaludos";
        let fields = parse_model_reply(reply).expect("Debe parsear el bloque JSON");
        assert_eq!(fields.full_name.as_deref(), Some("JUAN PEREZ"));
        assert_eq!(fields.ine_key, None);
        assert_eq!(fields.section_number.as_deref(), Some("88"));
    }

    #[test]
    fn test_parse_model_reply_sin_json() {
        assert!(parse_model_reply("no hay nada estructurado aquí").is_none());
    }
}
