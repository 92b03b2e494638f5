use crate::models::{Committee, CommitteeDocument, CommitteeMember, Seccion};
use crate::store::{committees, units, users};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;

/// Normaliza la ruta guardada de un documento hacia su URL pública.
pub fn normalize_upload_path(filename: &str) -> String {
    let normalized = filename.replace('\\', "/");
    if normalized.is_empty() || normalized.starts_with("/uploads/") {
        normalized
    } else {
        format!("/uploads/{}", normalized)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitRef {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub unit_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentWithUrl {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: String,
    pub url: String,
}

/// Vista completa de un comité para el tablero y las exportaciones.
#[derive(Debug, Clone, Serialize)]
pub struct CommitteeDetail {
    pub id: i64,
    pub name: String,
    pub section_number: String,
    #[serde(rename = "type")]
    pub tipo: String,
    pub owner_id: String,
    pub owner_name: Option<String>,
    pub created_at: String,
    pub presidente: String,
    pub email: String,
    pub clave_afiliacion: String,
    pub telefono: String,
    pub administrative_unit: Option<UnitRef>,
    pub section: Option<Seccion>,
    pub members: Vec<CommitteeMember>,
    pub documents: Vec<DocumentWithUrl>,
    pub total_members: usize,
}

fn document_with_url(d: &CommitteeDocument) -> DocumentWithUrl {
    DocumentWithUrl {
        id: d.id,
        filename: d.filename.clone(),
        original_name: d.original_name.clone(),
        content_type: d.content_type.clone(),
        size: d.size,
        created_at: d.created_at.clone(),
        url: normalize_upload_path(&d.filename),
    }
}

/// Carga los comités (todos o uno) con propietario, referencia de sección,
/// unidad territorial, integrantes y documentos resueltos.
pub fn load_committee_details(
    conn: &Connection,
    committee_id: Option<i64>,
) -> Result<Vec<CommitteeDetail>, Box<dyn Error>> {
    let rows: Vec<Committee> = match committee_id {
        Some(id) => committees::get_committee(conn, id)?.into_iter().collect(),
        None => committees::list_all_committees(conn)?,
    };

    let mut owner_cache: HashMap<String, Option<String>> = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());
    for committee in rows {
        let owner_name = match owner_cache.get(&committee.owner_id) {
            Some(cached) => cached.clone(),
            None => {
                let name = users::find_user_by_email(conn, &committee.owner_id)?.map(|u| u.name);
                owner_cache.insert(committee.owner_id.clone(), name.clone());
                name
            }
        };

        // El cruce con la tabla de referencia tolera valores no numéricos
        let section = match committee.section_number.trim().parse::<i64>() {
            Ok(n) => units::get_seccion(conn, n)?,
            Err(_) => None,
        };

        let administrative_unit = match committee.administrative_unit_id {
            Some(id) => units::get_unit(conn, id)?.map(|u| UnitRef {
                id: u.id,
                name: u.name,
                code: u.code,
                unit_type: u.unit_type,
            }),
            None => None,
        };

        let members = committees::members_for_committee(conn, committee.id)?;
        let documents: Vec<DocumentWithUrl> = committees::documents_for_committee(conn, committee.id)?
            .iter()
            .map(document_with_url)
            .collect();

        let total_members = members.len();
        out.push(CommitteeDetail {
            id: committee.id,
            name: committee.name,
            section_number: committee.section_number,
            tipo: committee.tipo,
            owner_id: committee.owner_id,
            owner_name,
            created_at: committee.created_at,
            presidente: committee.presidente,
            email: committee.email,
            clave_afiliacion: committee.clave_afiliacion,
            telefono: committee.telefono,
            administrative_unit,
            section,
            members,
            documents,
            total_members,
        });
    }
    Ok(out)
}

/// Conteos agrupados de comités: por responsable, por sección, por municipio
/// y por tipo.
pub fn committee_stats(conn: &Connection) -> Result<serde_json::Value, Box<dyn Error>> {
    let mut by_user: Vec<serde_json::Value> = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT c.owner_id, COUNT(c.id) AS total, u.id, u.name \
             FROM committees c LEFT JOIN users u ON u.email = c.owner_id \
             GROUP BY c.owner_id, u.id, u.name \
             ORDER BY COUNT(c.id) DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;
        for r in rows {
            let (owner_email, total, user_id, user_name) = r?;
            by_user.push(json!({
                "owner_email": owner_email.unwrap_or_else(|| "sin-correo".to_string()),
                "owner_name": user_name,
                "owner_id": user_id,
                "total": total,
            }));
        }
    }

    let mut by_section: Vec<serde_json::Value> = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT c.section_number, COUNT(c.id) AS total, s.nombre_municipio \
             FROM committees c LEFT JOIN secciones s ON CAST(s.id AS TEXT) = c.section_number \
             WHERE c.section_number IS NOT NULL AND c.section_number != '' \
             GROUP BY c.section_number, s.nombre_municipio \
             ORDER BY COUNT(c.id) DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        for r in rows {
            let (section, total, municipio) = r?;
            let label = match &section {
                Some(s) if !s.is_empty() => format!("Sección {}", s),
                _ => "Sin sección".to_string(),
            };
            by_section.push(json!({
                "code": section,
                "label": label,
                "municipality": municipio,
                "total": total,
            }));
        }
    }

    let mut by_municipality: Vec<serde_json::Value> = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT s.nombre_municipio, COUNT(c.id) AS total \
             FROM committees c LEFT JOIN secciones s ON CAST(s.id AS TEXT) = c.section_number \
             WHERE c.section_number IS NOT NULL AND c.section_number != '' \
               AND s.nombre_municipio IS NOT NULL \
             GROUP BY s.nombre_municipio \
             ORDER BY COUNT(c.id) DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;
        for r in rows {
            let (municipio, total) = r?;
            by_municipality.push(json!({
                "code": municipio,
                "label": municipio.clone().unwrap_or_else(|| "Sin municipio".to_string()),
                "municipality": municipio,
                "total": total,
            }));
        }
    }

    let mut by_type: Vec<serde_json::Value> = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT c.type, COUNT(c.id) AS total FROM committees c \
             GROUP BY c.type ORDER BY COUNT(c.id) DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;
        for r in rows {
            let (tipo, total) = r?;
            by_type.push(json!({
                "type": tipo.filter(|t| !t.is_empty()).unwrap_or_else(|| "Sin tipo".to_string()),
                "total": total,
            }));
        }
    }

    Ok(json!({
        "by_user": by_user,
        "by_section": by_section,
        "by_municipality": by_municipality,
        "by_type": by_type,
    }))
}

fn scalar(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap_or(0)
}

/// Métricas generales del tablero: totales y cobertura seccional/municipal.
pub fn dashboard_metrics(conn: &Connection, municipality_target: i64) -> Result<serde_json::Value, Box<dyn Error>> {
    let total_committees = scalar(conn, "SELECT COUNT(*) FROM committees");
    let total_promovidos = scalar(conn, "SELECT COUNT(*) FROM committee_members");
    let total_documentos = scalar(conn, "SELECT COUNT(*) FROM committee_documents");

    let secciones_cubiertas = scalar(
        conn,
        "SELECT COUNT(DISTINCT section_number) FROM committees \
         WHERE section_number IS NOT NULL AND section_number != ''",
    );
    let total_secciones = scalar(conn, "SELECT COUNT(*) FROM secciones");
    let porcentaje_secciones = if total_secciones > 0 {
        ((secciones_cubiertas as f64 / total_secciones as f64) * 10000.0).round() / 100.0
    } else {
        0.0
    };

    let municipios_cubiertos = scalar(
        conn,
        "SELECT COUNT(DISTINCT s.nombre_municipio) \
         FROM committees c LEFT JOIN secciones s ON CAST(s.id AS TEXT) = c.section_number \
         WHERE c.section_number IS NOT NULL AND c.section_number != '' \
           AND s.nombre_municipio IS NOT NULL",
    );
    let porcentaje_municipios = if municipality_target > 0 {
        let ratio = (municipios_cubiertos as f64 / municipality_target as f64).min(1.0);
        (ratio * 10000.0).round() / 100.0
    } else {
        0.0
    };

    Ok(json!({
        "total_committees": total_committees,
        "total_promovidos": total_promovidos,
        "municipios_cubiertos": municipios_cubiertos,
        "municipios_meta": municipality_target,
        "porcentaje_municipios": porcentaje_municipios,
        "secciones_cubiertas": secciones_cubiertas,
        "total_secciones": total_secciones,
        "porcentaje_secciones": porcentaje_secciones,
        "total_documentos": total_documentos,
    }))
}

/// Filas planas de asignaciones para el tablero, enriquecidas con usuario y
/// unidad. Las asignaciones cuya unidad ya no existe se omiten.
pub fn user_assignment_rows(conn: &Connection) -> Result<Vec<serde_json::Value>, Box<dyn Error>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.user_id, a.role, a.created_at, \
                u.name, u.email, \
                n.id, n.name, n.unit_type \
         FROM user_assignments a \
         LEFT JOIN users u ON u.id = a.user_id \
         LEFT JOIN administrative_units n ON n.id = a.administrative_unit_id \
         ORDER BY a.created_at DESC, a.id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<i64>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;

    let mut out = Vec::new();
    for r in rows {
        let (id, user_id, role, created_at, user_name, user_email, unit_id, unit_name, unit_type) = r?;
        let unit_id = match unit_id {
            Some(u) => u,
            None => continue,
        };
        let (user_name, user_email) = match (user_name, user_email) {
            (Some(n), Some(e)) => (n, e),
            _ => (
                format!("Usuario {}", user_id),
                format!("usuario{}@desconocido.local", user_id),
            ),
        };
        out.push(json!({
            "assignment_id": id,
            "user_id": user_id,
            "user_name": user_name,
            "user_email": user_email,
            "role": role,
            "role_label": units::role_label(Some(role)),
            "administrative_unit_id": unit_id,
            "administrative_unit_name": unit_name,
            "administrative_unit_type": unit_type,
            "created_at": created_at,
        }));
    }
    Ok(out)
}

/// Totales del panel de administración.
pub fn admin_stats(conn: &Connection) -> Result<serde_json::Value, Box<dyn Error>> {
    let total_users = scalar(conn, "SELECT COUNT(*) FROM users");
    let total_units = scalar(conn, "SELECT COUNT(*) FROM administrative_units");
    let total_assignments = scalar(conn, "SELECT COUNT(*) FROM user_assignments");
    let total_secciones = scalar(conn, "SELECT COUNT(*) FROM secciones");

    let mut units_by_type = serde_json::Map::new();
    for unit_type in crate::models::UNIT_TYPES {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM administrative_units WHERE unit_type = ?1",
            rusqlite::params![unit_type],
            |row| row.get(0),
        )?;
        units_by_type.insert(unit_type.to_string(), json!(n));
    }

    Ok(json!({
        "total_users": total_users,
        "total_administrative_units": total_units,
        "total_assignments": total_assignments,
        "total_secciones": total_secciones,
        "units_by_type": units_by_type,
    }))
}
