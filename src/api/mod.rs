pub mod handlers;

use crate::models::{Committee, CommitteeMember, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GoogleAuthIn {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberCreate {
    pub full_name: String,
    pub ine_key: String,
    pub phone: String,
    pub email: String,
    pub section_number: String,
    pub invited_by: String,
}

/// Alta de comité. Los campos de contacto son opcionales en el JSON y entran
/// como cadena vacía cuando faltan (columnas NOT NULL DEFAULT '').
#[derive(Debug, Serialize, Deserialize)]
pub struct CommitteeCreate {
    pub name: String,
    pub section_number: String,
    #[serde(rename = "type")]
    pub tipo: String,
    #[serde(default)]
    pub presidente: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub clave_afiliacion: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub administrative_unit_id: Option<i64>,
    #[serde(default)]
    pub members: Vec<MemberCreate>,
}

/// Comité con sus integrantes, como se responde al dueño.
#[derive(Debug, Serialize)]
pub struct CommitteeOut {
    pub id: i64,
    pub name: String,
    pub section_number: String,
    #[serde(rename = "type")]
    pub tipo: String,
    pub owner_id: String,
    pub presidente: String,
    pub email: String,
    pub clave_afiliacion: String,
    pub telefono: String,
    pub administrative_unit_id: Option<i64>,
    pub created_at: String,
    pub members: Vec<CommitteeMember>,
    pub has_document: bool,
}

impl CommitteeOut {
    pub fn from_committee(committee: Committee, members: Vec<CommitteeMember>, has_document: bool) -> Self {
        CommitteeOut {
            id: committee.id,
            name: committee.name,
            section_number: committee.section_number,
            tipo: committee.tipo,
            owner_id: committee.owner_id,
            presidente: committee.presidente,
            email: committee.email,
            clave_afiliacion: committee.clave_afiliacion,
            telefono: committee.telefono,
            administrative_unit_id: committee.administrative_unit_id,
            created_at: committee.created_at,
            members,
            has_document,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CommitteeTypeCreate {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentCreate {
    pub user_id: i64,
    pub administrative_unit_id: i64,
    pub role: i64,
}

#[derive(Debug, Deserialize)]
pub struct GeoLocation {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub accuracy: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceIn {
    pub provider: String,
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub location: Option<GeoLocation>,
    #[serde(default)]
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
pub struct SeccionesImportIn {
    pub file: String,
}
