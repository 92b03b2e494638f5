// Estructuras de datos principales

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub picture_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committee {
    pub id: i64,
    pub name: String,
    /// Número de sección en texto libre. Se conserva en paralelo con
    /// `administrative_unit_id` por compatibilidad con datos históricos.
    pub section_number: String,
    #[serde(rename = "type")]
    pub tipo: String,
    /// Correo del propietario (clave heredada: la columna guarda el email).
    pub owner_id: String,
    pub presidente: String,
    pub email: String,
    pub clave_afiliacion: String,
    pub telefono: String,
    pub administrative_unit_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub id: i64,
    pub full_name: String,
    pub ine_key: String,
    pub phone: String,
    pub email: String,
    pub section_number: String,
    pub invited_by: String,
    pub committee_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeDocument {
    pub id: i64,
    /// Ruta relativa al directorio de subidas.
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub committee_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeType {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: String,
}

/// Nodo de la jerarquía territorial:
/// STATE -> REGION -> DISTRICT -> MUNICIPALITY -> SECTION
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministrativeUnit {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub unit_type: String,
    pub parent_id: Option<i64>,
    /// Cruce hacia la tabla plana `secciones` (municipio de origen).
    pub seccion_municipio_id: Option<i64>,
    /// Cruce hacia la tabla plana `secciones` (distrito de origen).
    pub seccion_distrito_id: Option<i64>,
    pub created_at: String,
}

/// Vincula un usuario a una unidad territorial con un rango de rol (1-6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAssignment {
    pub id: i64,
    pub user_id: i64,
    pub administrative_unit_id: i64,
    pub role: i64,
    pub created_at: String,
}

/// Fila de la tabla de referencia de secciones electorales. El `id` es el
/// número de sección oficial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seccion {
    pub id: i64,
    pub municipio: Option<i64>,
    pub nombre_municipio: Option<String>,
    pub distrito: Option<i64>,
    pub nombre_distrito: Option<String>,
    pub distrito_federal: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub provider: String,
    pub provider_user_id: String,
    pub email: String,
    pub name: String,
    pub device_id: String,
    pub user_agent: String,
    pub ip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<i64>,
    pub timezone: String,
    pub created_at: String,
}

/// Rango de rol con el que se registra a los presidentes de comité al
/// autenticarse por primera vez.
pub const ROLE_PRESIDENTE_COMITE: i64 = 6;

/// Niveles reconocidos de la jerarquía, de mayor a menor alcance.
pub const UNIT_TYPES: [&str; 5] = ["STATE", "REGION", "DISTRICT", "MUNICIPALITY", "SECTION"];
