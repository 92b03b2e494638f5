use rusqlite::Connection;
use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::PathBuf;

// Postgres client for remote DB support
use postgres::{Client, NoTls};

/// Abstracción sencilla de conexión que puede ser SQLite o Postgres.
/// Para Postgres guardamos la URL y realizamos operaciones en un hilo
/// separado para evitar arrancar runtimes tokio dentro del runtime existente.
/// Las rutas CRUD normales trabajan siempre sobre SQLite; el backend remoto
/// se honra para la creación de esquema y para la bitácora de asistencia.
pub enum StoreConn {
    Sqlite(Connection),
    /// Contiene la URL completa (postgres://...)
    PostgresConfig(String),
}

impl fmt::Debug for StoreConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreConn::Sqlite(_) => write!(f, "StoreConn::Sqlite(..)"),
            StoreConn::PostgresConfig(_) => write!(f, "StoreConn::PostgresConfig(..)"),
        }
    }
}

fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Ruta del archivo SQLite del sistema. Honra DATABASE_URL (sqlite:// o
/// file://) y DB_PATH; para URLs remotas devuelve la ruta local por defecto.
pub fn store_db_path() -> PathBuf {
    load_dotenv();
    if let Ok(p) = env::var("DB_PATH") {
        PathBuf::from(p)
    } else if let Ok(p) = env::var("DATABASE_URL") {
        if p.starts_with("sqlite://") {
            PathBuf::from(p.trim_start_matches("sqlite://"))
        } else if p.starts_with("file://") {
            PathBuf::from(p.trim_start_matches("file://"))
        } else {
            PathBuf::from("data/comites.db")
        }
    } else {
        PathBuf::from("data/comites.db")
    }
}

/// Abre una conexión SQLite de vida corta contra la base del sistema.
pub fn open() -> Result<Connection, Box<dyn Error>> {
    let path = store_db_path();
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    Ok(conn)
}

/// Abre la conexión del store aceptando URLs sqlite://, file:// y postgres://.
pub fn open_store_connection() -> Result<StoreConn, Box<dyn Error>> {
    load_dotenv();
    if let Ok(url) = env::var("DATABASE_URL") {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            // Para Postgres solo conservamos la URL y diferimos el connect al
            // sitio de la operación (init_db / asistencia).
            return Ok(StoreConn::PostgresConfig(url));
        }
        if !url.starts_with("sqlite://") && !url.starts_with("file://") {
            return Err(format!("DATABASE_URL uses unsupported scheme: {}", url).into());
        }
    }
    Ok(StoreConn::Sqlite(open().map_err(|e| format!("failed to open sqlite store: {}", e))?))
}

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        phone TEXT,
        picture_url TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS committees (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        section_number TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        presidente TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        clave_afiliacion TEXT NOT NULL DEFAULT '',
        telefono TEXT NOT NULL DEFAULT '',
        administrative_unit_id INTEGER,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_committees_section ON committees(section_number)",
    "CREATE INDEX IF NOT EXISTS idx_committees_owner ON committees(owner_id)",
    "CREATE TABLE IF NOT EXISTS committee_members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        ine_key TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT NOT NULL,
        section_number TEXT NOT NULL,
        invited_by TEXT NOT NULL,
        committee_id INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_members_committee ON committee_members(committee_id)",
    "CREATE TABLE IF NOT EXISTS committee_documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        original_name TEXT NOT NULL,
        content_type TEXT NOT NULL,
        size INTEGER NOT NULL,
        committee_id INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_documents_committee ON committee_documents(committee_id)",
    "CREATE TABLE IF NOT EXISTS committee_types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS administrative_units (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        code TEXT,
        unit_type TEXT NOT NULL,
        parent_id INTEGER,
        seccion_municipio_id INTEGER,
        seccion_distrito_id INTEGER,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_units_parent ON administrative_units(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_units_type ON administrative_units(unit_type)",
    "CREATE TABLE IF NOT EXISTS user_assignments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        administrative_unit_id INTEGER NOT NULL,
        role INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_assignments_user ON user_assignments(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_assignments_unit ON user_assignments(administrative_unit_id)",
    "CREATE TABLE IF NOT EXISTS secciones (
        id INTEGER PRIMARY KEY,
        municipio INTEGER,
        nombre_municipio TEXT,
        distrito INTEGER,
        nombre_distrito TEXT,
        distrito_federal INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS attendance (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider TEXT NOT NULL DEFAULT 'google',
        provider_user_id TEXT NOT NULL,
        email TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        device_id TEXT NOT NULL,
        user_agent TEXT NOT NULL DEFAULT '',
        ip TEXT,
        latitude REAL,
        longitude REAL,
        accuracy INTEGER,
        timezone TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_attendance_email ON attendance(email)",
];

const POSTGRES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        phone TEXT,
        picture_url TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS committees (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        section_number TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        presidente TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        clave_afiliacion TEXT NOT NULL DEFAULT '',
        telefono TEXT NOT NULL DEFAULT '',
        administrative_unit_id BIGINT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS committee_members (
        id BIGSERIAL PRIMARY KEY,
        full_name TEXT NOT NULL,
        ine_key TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT NOT NULL,
        section_number TEXT NOT NULL,
        invited_by TEXT NOT NULL,
        committee_id BIGINT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS committee_documents (
        id BIGSERIAL PRIMARY KEY,
        filename TEXT NOT NULL,
        original_name TEXT NOT NULL,
        content_type TEXT NOT NULL,
        size BIGINT NOT NULL,
        committee_id BIGINT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS committee_types (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS administrative_units (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        code TEXT,
        unit_type TEXT NOT NULL,
        parent_id BIGINT,
        seccion_municipio_id BIGINT,
        seccion_distrito_id BIGINT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_assignments (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        administrative_unit_id BIGINT NOT NULL,
        role BIGINT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS secciones (
        id BIGINT PRIMARY KEY,
        municipio BIGINT,
        nombre_municipio TEXT,
        distrito BIGINT,
        nombre_distrito TEXT,
        distrito_federal BIGINT
    );

    CREATE TABLE IF NOT EXISTS attendance (
        id BIGSERIAL PRIMARY KEY,
        provider TEXT NOT NULL DEFAULT 'google',
        provider_user_id TEXT NOT NULL,
        email TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        device_id TEXT NOT NULL,
        user_agent TEXT NOT NULL DEFAULT '',
        ip TEXT,
        latitude DOUBLE PRECISION,
        longitude DOUBLE PRECISION,
        accuracy BIGINT,
        timezone TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );";

/// Inicializa la base del sistema (directorio + tablas + migraciones
/// heredadas).
pub fn init_db() -> Result<(), Box<dyn Error>> {
    match open_store_connection() {
        Ok(StoreConn::Sqlite(conn)) => {
            for ddl in SQLITE_SCHEMA {
                conn.execute(ddl, [])?;
            }
            migrate_legacy_columns(&conn)?;
            Ok(())
        }
        Ok(StoreConn::PostgresConfig(url)) => {
            let url = url.clone();
            let handle = std::thread::spawn(move || -> Result<(), Box<dyn Error + Send + 'static>> {
                let mut client = Client::connect(&url, NoTls)
                    .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                client
                    .batch_execute(POSTGRES_SCHEMA)
                    .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                Ok(())
            });
            match handle.join() {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e as Box<dyn Error>),
                Err(e) => Err(format!("thread join error: {:?}", e).into()),
            }
        }
        Err(e) => Err(e),
    }
}

/// Inicializa una conexión SQLite arbitraria (la usan también las pruebas).
pub fn init_schema(conn: &Connection) -> Result<(), Box<dyn Error>> {
    for ddl in SQLITE_SCHEMA {
        conn.execute(ddl, [])?;
    }
    migrate_legacy_columns(conn)?;
    Ok(())
}

/// Migraciones para bases heredadas: columnas que versiones anteriores del
/// esquema de comités no tenían.
fn migrate_legacy_columns(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let existing = committee_columns(conn)?;
    if !existing.iter().any(|c| c == "administrative_unit_id") {
        conn.execute("ALTER TABLE committees ADD COLUMN administrative_unit_id INTEGER", [])?;
    }
    for column in ["presidente", "email", "clave_afiliacion", "telefono"] {
        if !existing.iter().any(|c| c == column) {
            conn.execute(
                &format!("ALTER TABLE committees ADD COLUMN {} TEXT NOT NULL DEFAULT ''", column),
                [],
            )?;
        } else {
            // Normalizar NULLs de cargas viejas
            conn.execute(&format!("UPDATE committees SET {} = '' WHERE {} IS NULL", column, column), [])?;
        }
    }
    Ok(())
}

fn committee_columns(conn: &Connection) -> Result<Vec<String>, Box<dyn Error>> {
    let mut stmt = conn.prepare("PRAGMA table_info(committees)")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
