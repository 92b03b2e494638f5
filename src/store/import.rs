use crate::models::Seccion;
use calamine::{open_workbook_auto, Data, Reader};
use rusqlite::Connection;
use std::error::Error;
use std::path::Path;

/// Convierte una celda de calamine a String.
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f.floor() - f).abs() < std::f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Normaliza encabezados eliminando espacios y pasando a minúsculas.
pub fn normalize_header(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

fn parse_opt_i64(s: &str) -> Option<i64> {
    let t = s.trim();
    if t.is_empty() { None } else { t.parse().ok() }
}

fn parse_opt_string(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

/// Interpreta las filas de una hoja ya convertida a texto. La primera fila es
/// el encabezado; se aceptan los nombres de columna del padrón de referencia
/// (seccion/id, municipio, nombre_municipio, distrito, nombre_distrito,
/// distrito_federal) en cualquier orden.
pub fn parse_seccion_rows(rows: &[Vec<String>]) -> Vec<Seccion> {
    let mut out = Vec::new();
    if rows.is_empty() {
        return out;
    }

    let header: Vec<String> = rows[0].iter().map(|h| normalize_header(h)).collect();
    let col = |names: &[&str]| -> Option<usize> {
        header.iter().position(|h| names.iter().any(|n| h == n))
    };
    let idx_id = col(&["seccion", "id", "numero", "numeroseccion"]);
    let idx_municipio = col(&["municipio"]);
    let idx_nombre_municipio = col(&["nombre_municipio", "nombremunicipio"]);
    let idx_distrito = col(&["distrito"]);
    let idx_nombre_distrito = col(&["nombre_distrito", "nombredistrito"]);
    let idx_distrito_federal = col(&["distrito_federal", "distritofederal"]);

    let idx_id = match idx_id {
        Some(i) => i,
        None => return out,
    };
    let cell = |row: &Vec<String>, idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i).cloned()).unwrap_or_default()
    };

    for row in rows.iter().skip(1) {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let id = match parse_opt_i64(row.get(idx_id).map(String::as_str).unwrap_or("")) {
            Some(n) => n,
            None => continue,
        };
        out.push(Seccion {
            id,
            municipio: parse_opt_i64(&cell(row, idx_municipio)),
            nombre_municipio: parse_opt_string(&cell(row, idx_nombre_municipio)),
            distrito: parse_opt_i64(&cell(row, idx_distrito)),
            nombre_distrito: parse_opt_string(&cell(row, idx_nombre_distrito)),
            distrito_federal: parse_opt_i64(&cell(row, idx_distrito_federal)),
        });
    }
    out
}

fn read_first_sheet<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut workbook = open_workbook_auto(&path)?;
    let names = workbook.sheet_names().to_owned();
    for sheet in names.iter() {
        if let Ok(range) = workbook.worksheet_range(sheet) {
            let mut rows: Vec<Vec<String>> = Vec::new();
            for r in range.rows() {
                rows.push(r.iter().map(cell_to_string).collect());
            }
            if rows.len() > 1 {
                return Ok(rows);
            }
        }
    }
    Ok(Vec::new())
}

/// Lee el padrón de secciones desde un workbook. Intenta primero con
/// calamine; si no devuelve filas se inspecciona el contenedor zip para
/// confirmar que el archivo sí trae hojas (diagnóstico útil con workbooks
/// generados por herramientas viejas).
pub fn read_secciones_workbook<P: AsRef<Path>>(path: P) -> Result<Vec<Seccion>, Box<dyn Error>> {
    let rows = read_first_sheet(&path)?;
    if !rows.is_empty() {
        return Ok(parse_seccion_rows(&rows));
    }

    eprintln!(
        "DEBUG: calamine no devolvió filas, inspeccionando el zip de '{}'",
        path.as_ref().display()
    );
    let archive = zip::ZipArchive::new(std::fs::File::open(&path)?)?;
    let sheet_count = archive
        .file_names()
        .filter(|f| f.starts_with("xl/worksheets/sheet"))
        .count();
    if sheet_count == 0 {
        return Err("workbook has no worksheets".into());
    }
    Ok(Vec::new())
}

/// Importa (upsert) el padrón completo a la tabla `secciones`.
pub fn import_secciones<P: AsRef<Path>>(conn: &Connection, path: P) -> Result<usize, Box<dyn Error>> {
    let secciones = read_secciones_workbook(path)?;
    for s in &secciones {
        crate::store::units::upsert_seccion(conn, s)?;
    }
    Ok(secciones.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_seccion_rows_basico() {
        let rows = vec![
            row(&["Seccion", "Municipio", "Nombre Municipio", "Distrito", "Nombre Distrito", "Distrito Federal"]),
            row(&["1", "52", "Morelia", "10", "Morelia Noroeste", "8"]),
            row(&["2", "52", "Morelia", "10", "Morelia Noroeste", ""]),
        ];
        let parsed = parse_seccion_rows(&rows);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, 1);
        assert_eq!(parsed[0].municipio, Some(52));
        assert_eq!(parsed[0].nombre_municipio.as_deref(), Some("Morelia"));
        assert_eq!(parsed[0].distrito_federal, Some(8));
        assert_eq!(parsed[1].distrito_federal, None);
    }

    #[test]
    fn test_parse_seccion_rows_ignora_filas_invalidas() {
        let rows = vec![
            row(&["seccion", "municipio", "nombre_municipio", "distrito", "nombre_distrito", "distrito_federal"]),
            row(&["", "", "", "", "", ""]),
            row(&["no-numerico", "1", "X", "2", "Y", "3"]),
            row(&["77", "1", "X", "2", "Y", "3"]),
        ];
        let parsed = parse_seccion_rows(&rows);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, 77);
    }

    #[test]
    fn test_parse_sin_columna_de_seccion() {
        let rows = vec![row(&["foo", "bar"]), row(&["1", "2"])];
        assert!(parse_seccion_rows(&rows).is_empty());
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Nombre Municipio"), "nombremunicipio");
        assert_eq!(normalize_header("  DISTRITO federal "), "distritofederal");
    }
}
