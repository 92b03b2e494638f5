use crate::models::{User, UserAssignment};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        picture_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const USER_COLS: &str = "id, email, name, phone, picture_url, created_at";

pub fn insert_user(
    conn: &Connection,
    email: &str,
    name: &str,
    phone: Option<&str>,
    picture_url: Option<&str>,
) -> Result<User, Box<dyn Error>> {
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (email, name, phone, picture_url, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![email, name, phone, picture_url, ts],
    )?;
    let id = conn.last_insert_rowid();
    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        phone: phone.map(|s| s.to_string()),
        picture_url: picture_url.map(|s| s.to_string()),
        created_at: ts,
    })
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, Box<dyn Error>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
            params![email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>, Box<dyn Error>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY name", USER_COLS))?;
    let rows = stmt.query_map([], user_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Elimina al usuario junto con todas sus asignaciones.
pub fn delete_user(conn: &Connection, id: i64) -> Result<(), Box<dyn Error>> {
    conn.execute("DELETE FROM user_assignments WHERE user_id = ?1", params![id])?;
    conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(())
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<UserAssignment> {
    Ok(UserAssignment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        administrative_unit_id: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const ASSIGNMENT_COLS: &str = "id, user_id, administrative_unit_id, role, created_at";

/// Asignación más reciente del usuario; decide su rol efectivo.
pub fn latest_assignment_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<UserAssignment>, Box<dyn Error>> {
    let ua = conn
        .query_row(
            &format!(
                "SELECT {} FROM user_assignments WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
                ASSIGNMENT_COLS
            ),
            params![user_id],
            assignment_from_row,
        )
        .optional()?;
    Ok(ua)
}

pub fn find_assignment(
    conn: &Connection,
    user_id: i64,
    unit_id: i64,
    role: i64,
) -> Result<Option<UserAssignment>, Box<dyn Error>> {
    let ua = conn
        .query_row(
            &format!(
                "SELECT {} FROM user_assignments WHERE user_id = ?1 AND administrative_unit_id = ?2 AND role = ?3",
                ASSIGNMENT_COLS
            ),
            params![user_id, unit_id, role],
            assignment_from_row,
        )
        .optional()?;
    Ok(ua)
}

pub fn insert_assignment(
    conn: &Connection,
    user_id: i64,
    unit_id: i64,
    role: i64,
) -> Result<UserAssignment, Box<dyn Error>> {
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO user_assignments (user_id, administrative_unit_id, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, unit_id, role, ts],
    )?;
    Ok(UserAssignment {
        id: conn.last_insert_rowid(),
        user_id,
        administrative_unit_id: unit_id,
        role,
        created_at: ts,
    })
}

/// Lista asignaciones con filtros opcionales, de la más reciente a la más
/// antigua.
pub fn list_assignments(
    conn: &Connection,
    user_id: Option<i64>,
    unit_id: Option<i64>,
    role: Option<i64>,
) -> Result<Vec<UserAssignment>, Box<dyn Error>> {
    let mut sql = format!("SELECT {} FROM user_assignments WHERE 1=1", ASSIGNMENT_COLS);
    let mut args: Vec<i64> = Vec::new();
    if let Some(u) = user_id {
        args.push(u);
        sql.push_str(&format!(" AND user_id = ?{}", args.len()));
    }
    if let Some(un) = unit_id {
        args.push(un);
        sql.push_str(&format!(" AND administrative_unit_id = ?{}", args.len()));
    }
    if let Some(r) = role {
        args.push(r);
        sql.push_str(&format!(" AND role = ?{}", args.len()));
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), assignment_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn get_assignment(conn: &Connection, id: i64) -> Result<Option<UserAssignment>, Box<dyn Error>> {
    let ua = conn
        .query_row(
            &format!("SELECT {} FROM user_assignments WHERE id = ?1", ASSIGNMENT_COLS),
            params![id],
            assignment_from_row,
        )
        .optional()?;
    Ok(ua)
}

pub fn delete_assignment(conn: &Connection, id: i64) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute("DELETE FROM user_assignments WHERE id = ?1", params![id])?;
    Ok(n > 0)
}
