use crate::models::{AdministrativeUnit, Seccion};
use chrono::Utc;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;

const UNIT_COLS: &str =
    "id, name, code, unit_type, parent_id, seccion_municipio_id, seccion_distrito_id, created_at";

fn unit_from_row(row: &Row<'_>) -> rusqlite::Result<AdministrativeUnit> {
    Ok(AdministrativeUnit {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        unit_type: row.get(3)?,
        parent_id: row.get(4)?,
        seccion_municipio_id: row.get(5)?,
        seccion_distrito_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub struct NewUnit<'a> {
    pub name: &'a str,
    pub code: Option<&'a str>,
    pub unit_type: &'a str,
    pub parent_id: Option<i64>,
    pub seccion_municipio_id: Option<i64>,
    pub seccion_distrito_id: Option<i64>,
}

/// Inserta una unidad. El padre, si se indica, debe existir.
pub fn insert_unit(conn: &Connection, data: &NewUnit<'_>) -> Result<AdministrativeUnit, Box<dyn Error>> {
    if let Some(pid) = data.parent_id {
        if get_unit(conn, pid)?.is_none() {
            return Err(format!("parent unit {} does not exist", pid).into());
        }
    }
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO administrative_units (name, code, unit_type, parent_id, seccion_municipio_id, seccion_distrito_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            data.name,
            data.code,
            data.unit_type,
            data.parent_id,
            data.seccion_municipio_id,
            data.seccion_distrito_id,
            ts,
        ],
    )?;
    Ok(AdministrativeUnit {
        id: conn.last_insert_rowid(),
        name: data.name.to_string(),
        code: data.code.map(|s| s.to_string()),
        unit_type: data.unit_type.to_string(),
        parent_id: data.parent_id,
        seccion_municipio_id: data.seccion_municipio_id,
        seccion_distrito_id: data.seccion_distrito_id,
        created_at: ts,
    })
}

pub fn get_unit(conn: &Connection, id: i64) -> Result<Option<AdministrativeUnit>, Box<dyn Error>> {
    let u = conn
        .query_row(
            &format!("SELECT {} FROM administrative_units WHERE id = ?1", UNIT_COLS),
            params![id],
            unit_from_row,
        )
        .optional()?;
    Ok(u)
}

pub fn list_all_units(conn: &Connection) -> Result<Vec<AdministrativeUnit>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM administrative_units", UNIT_COLS))?;
    let rows = stmt.query_map([], unit_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Lista unidades con filtros opcionales. Cuando hay término de búsqueda se
/// filtra por subcadena en nombre/clave y se ordena por similitud de nombre
/// (Jaro-Winkler) para que las coincidencias cercanas queden arriba.
pub fn list_units(
    conn: &Connection,
    unit_type: Option<&str>,
    parent_id: Option<i64>,
    search: Option<&str>,
) -> Result<Vec<AdministrativeUnit>, Box<dyn Error>> {
    let mut sql = format!("SELECT {} FROM administrative_units WHERE 1=1", UNIT_COLS);
    let mut args: Vec<String> = Vec::new();
    if let Some(t) = unit_type {
        args.push(t.to_string());
        sql.push_str(&format!(" AND unit_type = ?{}", args.len()));
    }
    if let Some(p) = parent_id {
        args.push(p.to_string());
        sql.push_str(&format!(" AND parent_id = ?{}", args.len()));
    }
    if let Some(s) = search {
        let pattern = format!("%{}%", s);
        args.push(pattern.clone());
        sql.push_str(&format!(" AND (name LIKE ?{}", args.len()));
        args.push(pattern);
        sql.push_str(&format!(" OR code LIKE ?{})", args.len()));
    }
    sql.push_str(" ORDER BY name");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), unit_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }

    if let Some(s) = search {
        let needle = s.to_lowercase();
        out.sort_by(|a, b| {
            let sa = strsim::jaro_winkler(&a.name.to_lowercase(), &needle);
            let sb = strsim::jaro_winkler(&b.name.to_lowercase(), &needle);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    Ok(out)
}

pub fn children_count(conn: &Connection, unit_id: i64) -> Result<i64, Box<dyn Error>> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM administrative_units WHERE parent_id = ?1",
        params![unit_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

pub fn assignments_count(conn: &Connection, unit_id: i64) -> Result<i64, Box<dyn Error>> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_assignments WHERE administrative_unit_id = ?1",
        params![unit_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

fn find_unit_by_type_code(
    conn: &Connection,
    unit_type: &str,
    code: &str,
) -> Result<Option<AdministrativeUnit>, Box<dyn Error>> {
    let u = conn
        .query_row(
            &format!(
                "SELECT {} FROM administrative_units WHERE unit_type = ?1 AND code = ?2 LIMIT 1",
                UNIT_COLS
            ),
            params![unit_type, code],
            unit_from_row,
        )
        .optional()?;
    Ok(u)
}

fn find_unit_by_type_distrito(
    conn: &Connection,
    unit_type: &str,
    distrito: i64,
) -> Result<Option<AdministrativeUnit>, Box<dyn Error>> {
    let u = conn
        .query_row(
            &format!(
                "SELECT {} FROM administrative_units WHERE unit_type = ?1 AND seccion_distrito_id = ?2 LIMIT 1",
                UNIT_COLS
            ),
            params![unit_type, distrito],
            unit_from_row,
        )
        .optional()?;
    Ok(u)
}

fn find_unit_by_type_municipio(
    conn: &Connection,
    unit_type: &str,
    municipio: i64,
) -> Result<Option<AdministrativeUnit>, Box<dyn Error>> {
    let u = conn
        .query_row(
            &format!(
                "SELECT {} FROM administrative_units WHERE unit_type = ?1 AND seccion_municipio_id = ?2 LIMIT 1",
                UNIT_COLS
            ),
            params![unit_type, municipio],
            unit_from_row,
        )
        .optional()?;
    Ok(u)
}

// ---- Secciones (tabla de referencia plana) ----

const SECCION_COLS: &str = "id, municipio, nombre_municipio, distrito, nombre_distrito, distrito_federal";

fn seccion_from_row(row: &Row<'_>) -> rusqlite::Result<Seccion> {
    Ok(Seccion {
        id: row.get(0)?,
        municipio: row.get(1)?,
        nombre_municipio: row.get(2)?,
        distrito: row.get(3)?,
        nombre_distrito: row.get(4)?,
        distrito_federal: row.get(5)?,
    })
}

/// Alta/actualización de una fila de referencia (el sembrado es idempotente).
pub fn upsert_seccion(conn: &Connection, s: &Seccion) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO secciones (id, municipio, nombre_municipio, distrito, nombre_distrito, distrito_federal) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            s.id,
            s.municipio,
            s.nombre_municipio,
            s.distrito,
            s.nombre_distrito,
            s.distrito_federal,
        ],
    )?;
    Ok(())
}

pub fn get_seccion(conn: &Connection, id: i64) -> Result<Option<Seccion>, Box<dyn Error>> {
    let s = conn
        .query_row(
            &format!("SELECT {} FROM secciones WHERE id = ?1", SECCION_COLS),
            params![id],
            seccion_from_row,
        )
        .optional()?;
    Ok(s)
}

pub fn list_secciones(
    conn: &Connection,
    municipio: Option<i64>,
    distrito: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Seccion>, Box<dyn Error>> {
    let mut sql = format!("SELECT {} FROM secciones WHERE 1=1", SECCION_COLS);
    let mut args: Vec<i64> = Vec::new();
    if let Some(m) = municipio {
        args.push(m);
        sql.push_str(&format!(" AND municipio = ?{}", args.len()));
    }
    if let Some(d) = distrito {
        args.push(d);
        sql.push_str(&format!(" AND distrito = ?{}", args.len()));
    }
    args.push(limit);
    sql.push_str(&format!(" ORDER BY id LIMIT ?{}", args.len()));
    args.push(offset);
    sql.push_str(&format!(" OFFSET ?{}", args.len()));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), seccion_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn count_secciones(conn: &Connection) -> Result<i64, Box<dyn Error>> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM secciones", [], |row| row.get(0))?;
    Ok(n)
}

/// Municipios únicos de la tabla de referencia: (id, nombre).
pub fn distinct_municipios(conn: &Connection) -> Result<Vec<(i64, String)>, Box<dyn Error>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT municipio, nombre_municipio FROM secciones \
         WHERE municipio IS NOT NULL AND nombre_municipio IS NOT NULL \
         ORDER BY nombre_municipio",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Distritos únicos de la tabla de referencia: (id, nombre).
pub fn distinct_distritos(conn: &Connection) -> Result<Vec<(i64, String)>, Box<dyn Error>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT distrito, nombre_distrito FROM secciones \
         WHERE distrito IS NOT NULL AND nombre_distrito IS NOT NULL \
         ORDER BY distrito",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// ---- Poblado de la jerarquía ----

#[derive(Debug, Clone, Serialize)]
pub struct PopulateSummary {
    pub state_created: bool,
    pub districts_created: usize,
    pub municipalities_created: usize,
    pub sections_created: usize,
    pub sections_existing: usize,
    pub totals_by_type: HashMap<String, i64>,
}

/// Construye la jerarquía STATE -> DISTRICT -> MUNICIPALITY -> SECTION a
/// partir de la tabla `secciones`. Idempotente: las unidades existentes se
/// conservan. Al terminar valida que el árbol siga siendo acíclico.
pub fn populate_administrative_units(conn: &Connection) -> Result<PopulateSummary, Box<dyn Error>> {
    // 1. Estado raíz
    let mut state_created = false;
    let state = match find_unit_by_type_code(conn, "STATE", "16")? {
        Some(u) => u,
        None => {
            state_created = true;
            insert_unit(
                conn,
                &NewUnit {
                    name: "Michoacán",
                    code: Some("16"),
                    unit_type: "STATE",
                    parent_id: None,
                    seccion_municipio_id: None,
                    seccion_distrito_id: None,
                },
            )?
        }
    };

    // 2. Distritos únicos
    let mut distrito_map: HashMap<i64, i64> = HashMap::new();
    let mut districts_created = 0usize;
    {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT distrito, nombre_distrito FROM secciones \
             WHERE distrito IS NOT NULL AND nombre_distrito IS NOT NULL \
             ORDER BY distrito",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        for r in rows {
            let (distrito_id, nombre) = r?;
            let unit = match find_unit_by_type_distrito(conn, "DISTRICT", distrito_id)? {
                Some(u) => u,
                None => {
                    districts_created += 1;
                    insert_unit(
                        conn,
                        &NewUnit {
                            name: &nombre,
                            code: Some(&distrito_id.to_string()),
                            unit_type: "DISTRICT",
                            parent_id: Some(state.id),
                            seccion_municipio_id: None,
                            seccion_distrito_id: Some(distrito_id),
                        },
                    )?
                }
            };
            distrito_map.insert(distrito_id, unit.id);
        }
    }

    // 3. Municipios únicos, colgados de su distrito (o del estado si no se
    // conoce el distrito)
    let mut municipio_map: HashMap<i64, i64> = HashMap::new();
    let mut municipalities_created = 0usize;
    {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT municipio, nombre_municipio, distrito FROM secciones \
             WHERE municipio IS NOT NULL AND nombre_municipio IS NOT NULL \
             ORDER BY municipio",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })?;
        for r in rows {
            let (municipio_id, nombre, distrito_id) = r?;
            let unit = match find_unit_by_type_municipio(conn, "MUNICIPALITY", municipio_id)? {
                Some(u) => u,
                None => {
                    let parent_id = distrito_id
                        .and_then(|d| distrito_map.get(&d).copied())
                        .unwrap_or(state.id);
                    municipalities_created += 1;
                    insert_unit(
                        conn,
                        &NewUnit {
                            name: &nombre,
                            code: Some(&municipio_id.to_string()),
                            unit_type: "MUNICIPALITY",
                            parent_id: Some(parent_id),
                            seccion_municipio_id: Some(municipio_id),
                            seccion_distrito_id: distrito_id,
                        },
                    )?
                }
            };
            municipio_map.insert(municipio_id, unit.id);
        }
    }

    // 4. Secciones
    let mut sections_created = 0usize;
    let mut sections_existing = 0usize;
    let secciones = list_secciones(conn, None, None, i64::MAX, 0)?;
    for seccion in &secciones {
        let code = seccion.id.to_string();
        if find_unit_by_type_code(conn, "SECTION", &code)?.is_some() {
            sections_existing += 1;
            continue;
        }
        let parent_id = seccion
            .municipio
            .and_then(|m| municipio_map.get(&m).copied())
            .unwrap_or(state.id);
        insert_unit(
            conn,
            &NewUnit {
                name: &format!("Sección {}", seccion.id),
                code: Some(&code),
                unit_type: "SECTION",
                parent_id: Some(parent_id),
                seccion_municipio_id: seccion.municipio,
                seccion_distrito_id: seccion.distrito,
            },
        )?;
        sections_created += 1;
    }

    validate_hierarchy(conn)?;

    let mut totals_by_type = HashMap::new();
    for unit_type in crate::models::UNIT_TYPES {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM administrative_units WHERE unit_type = ?1",
            params![unit_type],
            |row| row.get(0),
        )?;
        totals_by_type.insert(unit_type.to_string(), n);
    }

    Ok(PopulateSummary {
        state_created,
        districts_created,
        municipalities_created,
        sections_created,
        sections_existing,
        totals_by_type,
    })
}

/// Comprueba que las referencias de padre formen un bosque sin ciclos.
pub fn validate_hierarchy(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let units = list_all_units(conn)?;
    let mut graph: DiGraph<i64, ()> = DiGraph::new();
    let mut node_map: HashMap<i64, NodeIndex> = HashMap::new();
    for unit in &units {
        let idx = graph.add_node(unit.id);
        node_map.insert(unit.id, idx);
    }
    for unit in &units {
        if let Some(pid) = unit.parent_id {
            match node_map.get(&pid) {
                Some(&from) => {
                    let to = node_map[&unit.id];
                    graph.add_edge(from, to, ());
                }
                None => {
                    return Err(format!("unit {} references missing parent {}", unit.id, pid).into());
                }
            }
        }
    }
    if is_cyclic_directed(&graph) {
        return Err("administrative unit hierarchy contains a cycle".into());
    }
    Ok(())
}

// ---- Árbol para el tablero ----

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSummary {
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub role: i64,
    pub role_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitNode {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub unit_type: String,
    pub assignments: Vec<AssignmentSummary>,
    pub children: Vec<UnitNode>,
}

/// Etiqueta legible del rango de rol (la usa el tablero).
pub fn role_label(role: Option<i64>) -> String {
    match role {
        Some(1) => "Coordinación Estatal".to_string(),
        Some(2) => "Delegación Regional".to_string(),
        Some(3) => "Coordinación Distrital".to_string(),
        Some(4) => "Coordinación Municipal".to_string(),
        Some(5) => "Coordinación Seccional".to_string(),
        Some(6) => "Presidencia de Comité".to_string(),
        _ => "Rol sin definir".to_string(),
    }
}

/// Construye el árbol territorial completo con los responsables asignados a
/// cada nodo. Los hijos se ordenan alfabéticamente sin distinguir mayúsculas.
pub fn build_administrative_tree(conn: &Connection) -> Result<Vec<UnitNode>, Box<dyn Error>> {
    let units = list_all_units(conn)?;
    if units.is_empty() {
        return Ok(Vec::new());
    }

    let mut assignments_by_unit: HashMap<i64, Vec<AssignmentSummary>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT a.administrative_unit_id, a.user_id, a.role, u.name, u.email \
             FROM user_assignments a LEFT JOIN users u ON u.id = a.user_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        for r in rows {
            let (unit_id, user_id, role, name, email) = r?;
            // Identidad de relleno cuando el usuario ya no existe
            let (user_name, user_email) = match (name, email) {
                (Some(n), Some(e)) => (n, e),
                _ => (
                    format!("Usuario {}", user_id),
                    format!("usuario{}@desconocido.local", user_id),
                ),
            };
            assignments_by_unit.entry(unit_id).or_default().push(AssignmentSummary {
                user_id,
                user_name,
                user_email,
                role,
                role_label: role_label(Some(role)),
            });
        }
    }

    let mut children_map: HashMap<Option<i64>, Vec<AdministrativeUnit>> = HashMap::new();
    for unit in units {
        children_map.entry(unit.parent_id).or_default().push(unit);
    }

    fn build_node(
        unit: &AdministrativeUnit,
        children_map: &HashMap<Option<i64>, Vec<AdministrativeUnit>>,
        assignments_by_unit: &mut HashMap<i64, Vec<AssignmentSummary>>,
    ) -> UnitNode {
        let mut children: Vec<&AdministrativeUnit> = children_map
            .get(&Some(unit.id))
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        children.sort_by_key(|u| u.name.to_lowercase());
        let children = children
            .into_iter()
            .map(|child| build_node(child, children_map, assignments_by_unit))
            .collect();
        UnitNode {
            id: unit.id,
            name: unit.name.clone(),
            code: unit.code.clone(),
            unit_type: unit.unit_type.clone(),
            assignments: assignments_by_unit.remove(&unit.id).unwrap_or_default(),
            children,
        }
    }

    let mut roots: Vec<AdministrativeUnit> = children_map.get(&None).cloned().unwrap_or_default();
    roots.sort_by_key(|u| u.name.to_lowercase());
    Ok(roots
        .iter()
        .map(|root| build_node(root, &children_map, &mut assignments_by_unit))
        .collect())
}
