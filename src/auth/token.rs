use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
const TOKEN_VERSION_V1: &str = "v1";
const MAX_TOKEN_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenErrorCode {
    InvalidFormat,
    UnsupportedVersion,
    InvalidSignature,
    InvalidPayload,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    pub code: TokenErrorCode,
    pub message: String,
}

impl TokenError {
    fn new(code: TokenErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for TokenError {}

/// Contenido firmado del token de acceso.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Id del usuario.
    pub sub: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Emite un token para el usuario con la vigencia indicada en horas.
pub fn issue_token(user_id: i64, email: &str, secret: &[u8], hours: i64) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: user_id,
        email: email.to_string(),
        iat: now,
        exp: now + hours * 3600,
    };
    encode_token(&claims, secret)
}

pub fn encode_token(claims: &TokenClaims, secret: &[u8]) -> Result<String, TokenError> {
    let payload_bytes = serde_json::to_vec(claims)
        .map_err(|e| TokenError::new(TokenErrorCode::InvalidPayload, e.to_string()))?;
    let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| TokenError::new(TokenErrorCode::InvalidPayload, e.to_string()))?;
    mac.update(payload_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}.{}", TOKEN_VERSION_V1, payload_part, sig_part))
}

/// Verifica firma y vigencia; `now` es el timestamp Unix actual.
pub fn decode_token(token: &str, secret: &[u8], now: i64) -> Result<TokenClaims, TokenError> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::new(TokenErrorCode::InvalidFormat, "token exceeds max length"));
    }
    let parts: Vec<&str> = token.split('.').collect();
    let (payload_part, sig_part) = match parts.as_slice() {
        [version, payload, sig] if *version == TOKEN_VERSION_V1 => (*payload, *sig),
        [version, _, _] => {
            return Err(TokenError::new(
                TokenErrorCode::UnsupportedVersion,
                format!("unsupported token version: {version}"),
            ));
        }
        _ => return Err(TokenError::new(TokenErrorCode::InvalidFormat, "invalid token format")),
    };

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| TokenError::new(TokenErrorCode::InvalidPayload, e.to_string()))?;
    mac.update(payload_part.as_bytes());
    let expected = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|e| TokenError::new(TokenErrorCode::InvalidFormat, e.to_string()))?;
    mac.verify_slice(&expected)
        .map_err(|_| TokenError::new(TokenErrorCode::InvalidSignature, "token signature mismatch"))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|e| TokenError::new(TokenErrorCode::InvalidFormat, e.to_string()))?;
    let claims: TokenClaims = serde_json::from_slice(&payload_bytes)
        .map_err(|e| TokenError::new(TokenErrorCode::InvalidPayload, e.to_string()))?;

    if claims.exp <= now {
        return Err(TokenError::new(TokenErrorCode::Expired, "token expired"));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secreto-de-prueba";

    #[test]
    fn test_roundtrip() {
        let token = issue_token(42, "ana@example.com", SECRET, 12).expect("Debe emitir token");
        let claims = decode_token(&token, SECRET, Utc::now().timestamp()).expect("Debe decodificar");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ana@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_firma_invalida() {
        let token = issue_token(1, "a@b.c", SECRET, 1).unwrap();
        let err = decode_token(&token, b"otro-secreto", Utc::now().timestamp()).unwrap_err();
        assert_eq!(err.code, TokenErrorCode::InvalidSignature);
    }

    #[test]
    fn test_payload_manipulado() {
        let token = issue_token(1, "a@b.c", SECRET, 1).unwrap();
        let mut parts: Vec<String> = token.split('.').map(|s| s.to_string()).collect();
        let forged = TokenClaims {
            sub: 999,
            email: "intruso@example.com".to_string(),
            iat: 0,
            exp: i64::MAX,
        };
        parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = parts.join(".");
        let err = decode_token(&tampered, SECRET, Utc::now().timestamp()).unwrap_err();
        assert_eq!(err.code, TokenErrorCode::InvalidSignature);
    }

    #[test]
    fn test_expirado() {
        let claims = TokenClaims {
            sub: 1,
            email: "a@b.c".to_string(),
            iat: 0,
            exp: 10,
        };
        let token = encode_token(&claims, SECRET).unwrap();
        let err = decode_token(&token, SECRET, 11).unwrap_err();
        assert_eq!(err.code, TokenErrorCode::Expired);
    }

    #[test]
    fn test_version_desconocida() {
        let token = issue_token(1, "a@b.c", SECRET, 1).unwrap();
        let swapped = format!("v9{}", &token[2..]);
        let err = decode_token(&swapped, SECRET, Utc::now().timestamp()).unwrap_err();
        assert_eq!(err.code, TokenErrorCode::UnsupportedVersion);
    }

    #[test]
    fn test_formato_invalido() {
        let err = decode_token("garbage", SECRET, 0).unwrap_err();
        assert_eq!(err.code, TokenErrorCode::InvalidFormat);
    }
}
