use crate::models::{Committee, CommitteeDocument, CommitteeMember, CommitteeType};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;

const COMMITTEE_COLS: &str = "id, name, section_number, type, owner_id, presidente, email, \
     clave_afiliacion, telefono, administrative_unit_id, created_at";

fn committee_from_row(row: &Row<'_>) -> rusqlite::Result<Committee> {
    Ok(Committee {
        id: row.get(0)?,
        name: row.get(1)?,
        section_number: row.get(2)?,
        tipo: row.get(3)?,
        owner_id: row.get(4)?,
        presidente: row.get(5)?,
        email: row.get(6)?,
        clave_afiliacion: row.get(7)?,
        telefono: row.get(8)?,
        administrative_unit_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Datos para dar de alta un comité (el propietario se identifica por correo).
pub struct NewCommittee<'a> {
    pub name: &'a str,
    pub section_number: &'a str,
    pub tipo: &'a str,
    pub owner_email: &'a str,
    pub presidente: &'a str,
    pub email: &'a str,
    pub clave_afiliacion: &'a str,
    pub telefono: &'a str,
    pub administrative_unit_id: Option<i64>,
}

pub fn insert_committee(conn: &Connection, data: &NewCommittee<'_>) -> Result<Committee, Box<dyn Error>> {
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO committees (name, section_number, type, owner_id, presidente, email, \
         clave_afiliacion, telefono, administrative_unit_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            data.name,
            data.section_number,
            data.tipo,
            data.owner_email,
            data.presidente,
            data.email,
            data.clave_afiliacion,
            data.telefono,
            data.administrative_unit_id,
            ts,
        ],
    )?;
    let id = conn.last_insert_rowid();
    Ok(Committee {
        id,
        name: data.name.to_string(),
        section_number: data.section_number.to_string(),
        tipo: data.tipo.to_string(),
        owner_id: data.owner_email.to_string(),
        presidente: data.presidente.to_string(),
        email: data.email.to_string(),
        clave_afiliacion: data.clave_afiliacion.to_string(),
        telefono: data.telefono.to_string(),
        administrative_unit_id: data.administrative_unit_id,
        created_at: ts,
    })
}

pub fn get_committee(conn: &Connection, id: i64) -> Result<Option<Committee>, Box<dyn Error>> {
    let c = conn
        .query_row(
            &format!("SELECT {} FROM committees WHERE id = ?1", COMMITTEE_COLS),
            params![id],
            committee_from_row,
        )
        .optional()?;
    Ok(c)
}

/// Comités visibles para un correo: los que posee o cuyo correo de contacto
/// coincide. Del más reciente al más antiguo.
pub fn list_committees_for_email(conn: &Connection, email: &str) -> Result<Vec<Committee>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM committees WHERE owner_id = ?1 OR email = ?1 ORDER BY created_at DESC, id DESC",
        COMMITTEE_COLS
    ))?;
    let rows = stmt.query_map(params![email], committee_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn list_all_committees(conn: &Connection) -> Result<Vec<Committee>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM committees ORDER BY created_at DESC, id DESC",
        COMMITTEE_COLS
    ))?;
    let rows = stmt.query_map([], committee_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Comité registrado con este correo de contacto (lo usa el alta por Google).
pub fn find_committee_by_contact_email(conn: &Connection, email: &str) -> Result<Option<Committee>, Box<dyn Error>> {
    let c = conn
        .query_row(
            &format!("SELECT {} FROM committees WHERE email = ?1 LIMIT 1", COMMITTEE_COLS),
            params![email],
            committee_from_row,
        )
        .optional()?;
    Ok(c)
}

pub fn delete_committee_row(conn: &Connection, id: i64) -> Result<(), Box<dyn Error>> {
    conn.execute("DELETE FROM committee_documents WHERE committee_id = ?1", params![id])?;
    conn.execute("DELETE FROM committee_members WHERE committee_id = ?1", params![id])?;
    conn.execute("DELETE FROM committees WHERE id = ?1", params![id])?;
    Ok(())
}

// ---- Integrantes ----

const MEMBER_COLS: &str =
    "id, full_name, ine_key, phone, email, section_number, invited_by, committee_id, created_at";

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<CommitteeMember> {
    Ok(CommitteeMember {
        id: row.get(0)?,
        full_name: row.get(1)?,
        ine_key: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        section_number: row.get(5)?,
        invited_by: row.get(6)?,
        committee_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub struct NewMember<'a> {
    pub full_name: &'a str,
    pub ine_key: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub section_number: &'a str,
    pub invited_by: &'a str,
}

pub fn insert_member(
    conn: &Connection,
    committee_id: i64,
    data: &NewMember<'_>,
) -> Result<CommitteeMember, Box<dyn Error>> {
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO committee_members (full_name, ine_key, phone, email, section_number, invited_by, committee_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            data.full_name,
            data.ine_key,
            data.phone,
            data.email,
            data.section_number,
            data.invited_by,
            committee_id,
            ts,
        ],
    )?;
    Ok(CommitteeMember {
        id: conn.last_insert_rowid(),
        full_name: data.full_name.to_string(),
        ine_key: data.ine_key.to_string(),
        phone: data.phone.to_string(),
        email: data.email.to_string(),
        section_number: data.section_number.to_string(),
        invited_by: data.invited_by.to_string(),
        committee_id,
        created_at: ts,
    })
}

pub fn members_for_committee(conn: &Connection, committee_id: i64) -> Result<Vec<CommitteeMember>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM committee_members WHERE committee_id = ?1 ORDER BY id",
        MEMBER_COLS
    ))?;
    let rows = stmt.query_map(params![committee_id], member_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn count_members(conn: &Connection, committee_id: i64) -> Result<usize, Box<dyn Error>> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM committee_members WHERE committee_id = ?1",
        params![committee_id],
        |row| row.get(0),
    )?;
    Ok(n as usize)
}

pub fn get_member(conn: &Connection, id: i64) -> Result<Option<CommitteeMember>, Box<dyn Error>> {
    let m = conn
        .query_row(
            &format!("SELECT {} FROM committee_members WHERE id = ?1", MEMBER_COLS),
            params![id],
            member_from_row,
        )
        .optional()?;
    Ok(m)
}

pub fn delete_member(conn: &Connection, id: i64) -> Result<(), Box<dyn Error>> {
    conn.execute("DELETE FROM committee_members WHERE id = ?1", params![id])?;
    Ok(())
}

// ---- Documentos ----

const DOCUMENT_COLS: &str = "id, filename, original_name, content_type, size, committee_id, created_at";

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<CommitteeDocument> {
    Ok(CommitteeDocument {
        id: row.get(0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        content_type: row.get(3)?,
        size: row.get(4)?,
        committee_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert_document(
    conn: &Connection,
    committee_id: i64,
    filename: &str,
    original_name: &str,
    content_type: &str,
    size: i64,
) -> Result<CommitteeDocument, Box<dyn Error>> {
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO committee_documents (filename, original_name, content_type, size, committee_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![filename, original_name, content_type, size, committee_id, ts],
    )?;
    Ok(CommitteeDocument {
        id: conn.last_insert_rowid(),
        filename: filename.to_string(),
        original_name: original_name.to_string(),
        content_type: content_type.to_string(),
        size,
        committee_id,
        created_at: ts,
    })
}

pub fn documents_for_committee(conn: &Connection, committee_id: i64) -> Result<Vec<CommitteeDocument>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM committee_documents WHERE committee_id = ?1 ORDER BY id",
        DOCUMENT_COLS
    ))?;
    let rows = stmt.query_map(params![committee_id], document_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn get_document(conn: &Connection, id: i64) -> Result<Option<CommitteeDocument>, Box<dyn Error>> {
    let d = conn
        .query_row(
            &format!("SELECT {} FROM committee_documents WHERE id = ?1", DOCUMENT_COLS),
            params![id],
            document_from_row,
        )
        .optional()?;
    Ok(d)
}

pub fn delete_document(conn: &Connection, id: i64) -> Result<(), Box<dyn Error>> {
    conn.execute("DELETE FROM committee_documents WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn has_document(conn: &Connection, committee_id: i64) -> Result<bool, Box<dyn Error>> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM committee_documents WHERE committee_id = ?1",
        params![committee_id],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Todos los documentos junto con el nombre de su comité, del más reciente al
/// más antiguo (galería del tablero).
pub fn list_all_documents(conn: &Connection) -> Result<Vec<(CommitteeDocument, i64, String)>, Box<dyn Error>> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.filename, d.original_name, d.content_type, d.size, d.committee_id, d.created_at, \
                c.id, c.name \
         FROM committee_documents d \
         JOIN committees c ON c.id = d.committee_id \
         ORDER BY d.created_at DESC, d.id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            CommitteeDocument {
                id: row.get(0)?,
                filename: row.get(1)?,
                original_name: row.get(2)?,
                content_type: row.get(3)?,
                size: row.get(4)?,
                committee_id: row.get(5)?,
                created_at: row.get(6)?,
            },
            row.get::<_, i64>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// ---- Tipos de comité ----

const TYPE_COLS: &str = "id, name, is_active, created_at";

fn type_from_row(row: &Row<'_>) -> rusqlite::Result<CommitteeType> {
    Ok(CommitteeType {
        id: row.get(0)?,
        name: row.get(1)?,
        is_active: row.get::<_, i64>(2)? != 0,
        created_at: row.get(3)?,
    })
}

pub fn list_active_types(conn: &Connection) -> Result<Vec<CommitteeType>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM committee_types WHERE is_active = 1 ORDER BY name",
        TYPE_COLS
    ))?;
    let rows = stmt.query_map([], type_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn find_type_by_name(conn: &Connection, name: &str) -> Result<Option<CommitteeType>, Box<dyn Error>> {
    let t = conn
        .query_row(
            &format!("SELECT {} FROM committee_types WHERE name = ?1", TYPE_COLS),
            params![name],
            type_from_row,
        )
        .optional()?;
    Ok(t)
}

pub fn find_active_type_by_name(conn: &Connection, name: &str) -> Result<Option<CommitteeType>, Box<dyn Error>> {
    let t = conn
        .query_row(
            &format!("SELECT {} FROM committee_types WHERE name = ?1 AND is_active = 1", TYPE_COLS),
            params![name],
            type_from_row,
        )
        .optional()?;
    Ok(t)
}

pub fn insert_type(conn: &Connection, name: &str, is_active: bool) -> Result<CommitteeType, Box<dyn Error>> {
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO committee_types (name, is_active, created_at) VALUES (?1, ?2, ?3)",
        params![name, is_active as i64, ts],
    )?;
    Ok(CommitteeType {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        is_active,
        created_at: ts,
    })
}
