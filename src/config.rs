use std::env;
use std::sync::OnceLock;

/// Configuración global del backend. Se carga una sola vez desde el entorno
/// (con soporte de `.env` vía dotenv) y se cachea en un `OnceLock`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub google_client_id: String,
    pub frontend_origin: String,
    pub max_members_per_committee: usize,
    pub upload_dir: String,
    /// Correos con acceso a los endpoints `/admin` (lista separada por comas).
    pub admin_emails: Vec<String>,
    pub openai_api_key: String,
    pub openai_vision_model: String,
    pub openai_base_url: String,
    /// Meta de cobertura municipal para el tablero.
    pub municipality_target: i64,
    /// Vigencia del token de acceso en horas.
    pub token_hours: i64,
}

fn load_dotenv() {
    let _ = dotenv::dotenv();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    pub fn from_env() -> Settings {
        load_dotenv();
        let admin_emails: Vec<String> = env_or("ADMIN_EMAILS", "")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if env::var("GOOGLE_CLIENT_ID").is_err() {
            eprintln!("[config] Advertencia: GOOGLE_CLIENT_ID vacío. Verifica ubicación del .env o exporta la variable.");
        }
        Settings {
            app_name: env_or("APP_NAME", "Comités R21"),
            environment: env_or("ENV", "dev"),
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:8080"),
            jwt_secret: env_or("JWT_SECRET", "change-me"),
            google_client_id: env_or("GOOGLE_CLIENT_ID", ""),
            frontend_origin: env_or("FRONTEND_ORIGIN", "http://localhost:5173"),
            max_members_per_committee: env_or("MAX_MEMBERS_PER_COMMITTEE", "10")
                .parse()
                .unwrap_or(10),
            upload_dir: env_or("UPLOAD_DIR", "uploads"),
            admin_emails,
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openai_vision_model: env_or("OPENAI_VISION_MODEL", "gpt-4o-mini"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            municipality_target: env_or("MUNICIPALITY_TARGET", "113").parse().unwrap_or(113),
            token_hours: env_or("TOKEN_HOURS", "12").parse().unwrap_or(12),
        }
    }

    /// Verificación case-insensitive contra la lista de administradores.
    pub fn is_admin(&self, email: &str) -> bool {
        let lower = email.to_lowercase();
        self.admin_emails.iter().any(|a| a == &lower)
    }
}

/// Acceso global a la configuración (se congela en el primer uso).
pub fn settings() -> &'static Settings {
    static SETTINGS: OnceLock<Settings> = OnceLock::new();
    SETTINGS.get_or_init(Settings::from_env)
}
