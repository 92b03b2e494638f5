use crate::config::settings;
use crate::exports;
use crate::store;
use crate::store::reports;
use crate::store::units;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::Semaphore;

/// GET /dashboard/attendance
pub async fn attendance_handler() -> impl Responder {
    let conn = match store::open_store_connection() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::attendance::fetch_recent_attendance(&conn, i64::MAX, 0) {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/attendance/map
pub async fn attendance_map_handler() -> impl Responder {
    let conn = match store::open_store_connection() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::attendance::fetch_attendance_with_location(&conn) {
        Ok(rows) => {
            let points: Vec<serde_json::Value> = rows
                .iter()
                .map(|a| {
                    json!({
                        "id": a.id,
                        "name": a.name,
                        "email": a.email,
                        "latitude": a.latitude,
                        "longitude": a.longitude,
                        "created_at": a.created_at,
                    })
                })
                .collect();
            HttpResponse::Ok().json(points)
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/committee-stats
pub async fn committee_stats_handler() -> impl Responder {
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match reports::committee_stats(&conn) {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/administrative-tree
pub async fn administrative_tree_handler() -> impl Responder {
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match units::build_administrative_tree(&conn) {
        Ok(tree) => HttpResponse::Ok().json(tree),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/user-assignments
pub async fn user_assignments_handler() -> impl Responder {
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match reports::user_assignment_rows(&conn) {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/committees
pub async fn committees_handler() -> impl Responder {
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match reports::load_committee_details(&conn, None) {
        Ok(committees) => HttpResponse::Ok().json(committees),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/committees/{id}
pub async fn committee_detail_handler(path: web::Path<i64>) -> impl Responder {
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match reports::load_committee_details(&conn, Some(path.into_inner())) {
        Ok(committees) => match committees.into_iter().next() {
            Some(c) => HttpResponse::Ok().json(c),
            None => HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        },
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/documents
pub async fn documents_gallery_handler() -> impl Responder {
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match store::committees::list_all_documents(&conn) {
        Ok(rows) => {
            let items: Vec<serde_json::Value> = rows
                .iter()
                .map(|(doc, committee_id, committee_name)| {
                    json!({
                        "id": doc.id,
                        "committee_id": committee_id,
                        "committee_name": committee_name,
                        "url": reports::normalize_upload_path(&doc.filename),
                        "original_name": doc.original_name,
                        "content_type": doc.content_type,
                        "size": doc.size,
                        "created_at": doc.created_at,
                    })
                })
                .collect();
            HttpResponse::Ok().json(items)
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// GET /dashboard/metrics
pub async fn metrics_handler() -> impl Responder {
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    match reports::dashboard_metrics(&conn, settings().municipality_target) {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }
}

/// Semáforo global para la generación de exportaciones (trabajo pesado).
fn export_semaphore() -> Arc<Semaphore> {
    static SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();
    SEM.get_or_init(|| Arc::new(Semaphore::new(std::cmp::max(1, num_cpus::get())))).clone()
}

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// GET /dashboard/exports/committees.xlsx
pub async fn export_committees_excel_handler() -> impl Responder {
    let permit = match export_semaphore().acquire_owned().await {
        Ok(p) => p,
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "failed to acquire semaphore"})),
    };

    let handle = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, String> {
        let _permit = permit;
        let conn = store::open().map_err(|e| format!("store error: {}", e))?;
        let committees =
            reports::load_committee_details(&conn, None).map_err(|e| format!("store error: {}", e))?;
        let book = exports::excel::committees_workbook(&committees);
        exports::excel::workbook_to_bytes(&book).map_err(|e| format!("xlsx error: {}", e))
    });

    let bytes = match handle.await {
        Ok(Ok(b)) => b,
        Ok(Err(e)) => return HttpResponse::InternalServerError().json(json!({"error": e})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    };

    let filename = format!("comites_r21_{}.xlsx", chrono::Utc::now().format("%Y%m%d_%H%M%S"));
    HttpResponse::Ok()
        .content_type(XLSX_MIME)
        .append_header((
            actix_web::http::header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", filename),
        ))
        .body(bytes)
}

/// GET /dashboard/committees/{id}/acta.pdf
pub async fn acta_pdf_handler(path: web::Path<i64>) -> impl Responder {
    let committee_id = path.into_inner();
    let permit = match export_semaphore().acquire_owned().await {
        Ok(p) => p,
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "failed to acquire semaphore"})),
    };

    let handle = tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>, String> {
        let _permit = permit;
        let conn = store::open().map_err(|e| format!("store error: {}", e))?;
        let committees = reports::load_committee_details(&conn, Some(committee_id))
            .map_err(|e| format!("store error: {}", e))?;
        match committees.into_iter().next() {
            Some(committee) => exports::pdf::acta_pdf(&committee)
                .map(Some)
                .map_err(|e| format!("pdf error: {}", e)),
            None => Ok(None),
        }
    });

    let bytes = match handle.await {
        Ok(Ok(Some(b))) => b,
        Ok(Ok(None)) => return HttpResponse::NotFound().json(json!({"error": "Comité no encontrado"})),
        Ok(Err(e)) => return HttpResponse::InternalServerError().json(json!({"error": e})),
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    };

    HttpResponse::Ok()
        .content_type("application/pdf")
        .append_header((
            actix_web::http::header::CONTENT_DISPOSITION,
            format!("attachment; filename=acta_comite_{}.pdf", committee_id),
        ))
        .body(bytes)
}
