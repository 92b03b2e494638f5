use crate::models::Attendance;
use crate::store::db::StoreConn;
use chrono::Utc;
use postgres::{Client, NoTls};
use rusqlite::{params, Row};
use std::error::Error;

const ATTENDANCE_COLS: &str = "id, provider, provider_user_id, email, name, device_id, \
     user_agent, ip, latitude, longitude, accuracy, timezone, created_at";

fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: row.get(0)?,
        provider: row.get(1)?,
        provider_user_id: row.get(2)?,
        email: row.get(3)?,
        name: row.get(4)?,
        device_id: row.get(5)?,
        user_agent: row.get(6)?,
        ip: row.get(7)?,
        latitude: row.get(8)?,
        longitude: row.get(9)?,
        accuracy: row.get(10)?,
        timezone: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Registro nuevo de asistencia (sin id ni fecha: las pone el store).
#[derive(Debug, Clone)]
pub struct NewAttendance {
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
}

/// Inserta un registro de asistencia. Para Postgres la operación corre en un
/// hilo dedicado (mismo esquema que la creación de tablas).
pub fn record_attendance(conn: &StoreConn, data: &NewAttendance) -> Result<i64, Box<dyn Error>> {
    let ts = Utc::now().to_rfc3339();
    match conn {
        StoreConn::Sqlite(c) => {
            c.execute(
                "INSERT INTO attendance (provider, provider_user_id, email, name, device_id, \
                 user_agent, ip, latitude, longitude, accuracy, timezone, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    data.provider,
                    data.provider_user_id,
                    data.email,
                    data.name,
                    data.device_id,
                    data.user_agent,
                    data.ip,
                    data.latitude,
                    data.longitude,
                    data.accuracy,
                    data.timezone,
                    ts,
                ],
            )?;
            Ok(c.last_insert_rowid())
        }
        StoreConn::PostgresConfig(url) => {
            let url = url.clone();
            let data = data.clone();
            let handle = std::thread::spawn(move || -> Result<i64, Box<dyn Error + Send + 'static>> {
                let mut client = Client::connect(&url, NoTls)
                    .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                let row = client
                    .query_one(
                        "INSERT INTO attendance (provider, provider_user_id, email, name, device_id, \
                         user_agent, ip, latitude, longitude, accuracy, timezone, created_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
                        &[
                            &data.provider,
                            &data.provider_user_id,
                            &data.email,
                            &data.name,
                            &data.device_id,
                            &data.user_agent,
                            &data.ip,
                            &data.latitude,
                            &data.longitude,
                            &data.accuracy,
                            &data.timezone,
                            &ts,
                        ],
                    )
                    .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                Ok(row.get(0))
            });
            match handle.join() {
                Ok(res) => res.map_err(|e| e as Box<dyn Error>),
                Err(e) => Err(format!("thread join error: {:?}", e).into()),
            }
        }
    }
}

/// Registros recientes (más nuevos primero).
pub fn fetch_recent_attendance(
    conn: &StoreConn,
    limit: i64,
    offset: i64,
) -> Result<Vec<Attendance>, Box<dyn Error>> {
    match conn {
        StoreConn::Sqlite(c) => {
            let mut stmt = c.prepare(&format!(
                "SELECT {} FROM attendance ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                ATTENDANCE_COLS
            ))?;
            let rows = stmt.query_map(params![limit, offset], attendance_from_row)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        }
        StoreConn::PostgresConfig(url) => {
            let url = url.clone();
            let handle =
                std::thread::spawn(move || -> Result<Vec<Attendance>, Box<dyn Error + Send + 'static>> {
                    let mut client = Client::connect(&url, NoTls)
                        .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                    let rows = client
                        .query(
                            "SELECT id, provider, provider_user_id, email, name, device_id, \
                             user_agent, ip, latitude, longitude, accuracy, timezone, created_at \
                             FROM attendance ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
                            &[&limit, &offset],
                        )
                        .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                    let mut out = Vec::new();
                    for r in rows.iter() {
                        out.push(Attendance {
                            id: r.get(0),
                            provider: r.get(1),
                            provider_user_id: r.get(2),
                            email: r.get(3),
                            name: r.get(4),
                            device_id: r.get(5),
                            user_agent: r.get(6),
                            ip: r.get(7),
                            latitude: r.get(8),
                            longitude: r.get(9),
                            accuracy: r.get(10),
                            timezone: r.get(11),
                            created_at: r.get(12),
                        });
                    }
                    Ok(out)
                });
            match handle.join() {
                Ok(res) => res.map_err(|e| e as Box<dyn Error>),
                Err(e) => Err(format!("thread join error: {:?}", e).into()),
            }
        }
    }
}

/// Registros que traen coordenadas (alimentan el mapa del tablero).
pub fn fetch_attendance_with_location(conn: &StoreConn) -> Result<Vec<Attendance>, Box<dyn Error>> {
    match conn {
        StoreConn::Sqlite(c) => {
            let mut stmt = c.prepare(&format!(
                "SELECT {} FROM attendance WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
                 ORDER BY created_at DESC, id DESC",
                ATTENDANCE_COLS
            ))?;
            let rows = stmt.query_map([], attendance_from_row)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        }
        StoreConn::PostgresConfig(url) => {
            let url = url.clone();
            let handle =
                std::thread::spawn(move || -> Result<Vec<Attendance>, Box<dyn Error + Send + 'static>> {
                    let mut client = Client::connect(&url, NoTls)
                        .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                    let rows = client
                        .query(
                            "SELECT id, provider, provider_user_id, email, name, device_id, \
                             user_agent, ip, latitude, longitude, accuracy, timezone, created_at \
                             FROM attendance WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
                             ORDER BY created_at DESC, id DESC",
                            &[],
                        )
                        .map_err(|e| Box::new(e) as Box<dyn Error + Send + 'static>)?;
                    let mut out = Vec::new();
                    for r in rows.iter() {
                        out.push(Attendance {
                            id: r.get(0),
                            provider: r.get(1),
                            provider_user_id: r.get(2),
                            email: r.get(3),
                            name: r.get(4),
                            device_id: r.get(5),
                            user_agent: r.get(6),
                            ip: r.get(7),
                            latitude: r.get(8),
                            longitude: r.get(9),
                            accuracy: r.get(10),
                            timezone: r.get(11),
                            created_at: r.get(12),
                        });
                    }
                    Ok(out)
                });
            match handle.join() {
                Ok(res) => res.map_err(|e| e as Box<dyn Error>),
                Err(e) => Err(format!("thread join error: {:?}", e).into()),
            }
        }
    }
}
