use crate::api::handlers::{admin, attendance, auth, committee_types, committees, dashboard, documents, ocr};
use crate::config::settings;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

pub async fn run_server(bind_addr: &str) -> std::io::Result<()> {
    HttpServer::new(|| {
        let cfg = settings();
        let cors = Cors::default()
            .allowed_origin(&cfg.frontend_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(cors)
            .route("/health", web::get().to(health_handler))
            // Autenticación
            .route("/auth/google", web::post().to(auth::google_login_handler))
            .route("/auth/me", web::get().to(auth::me_handler))
            .route("/auth/me/assignment", web::get().to(auth::my_assignment_handler))
            // Comités
            .route("/committees", web::post().to(committees::create_committee_handler))
            .route("/committees", web::get().to(committees::list_committees_handler))
            .route("/committees/{id}", web::get().to(committees::get_committee_handler))
            .route("/committees/{id}", web::delete().to(committees::delete_committee_handler))
            .route("/committees/{id}/members", web::post().to(committees::add_member_handler))
            .route(
                "/committees/{id}/members/{member_id}",
                web::delete().to(committees::delete_member_handler),
            )
            // Documentos
            .route(
                "/committees/{id}/documents",
                web::post().to(documents::upload_documents_handler),
            )
            .route(
                "/committees/{id}/documents",
                web::get().to(documents::list_documents_handler),
            )
            .route(
                "/committees/{id}/documents/{document_id}",
                web::delete().to(documents::delete_document_handler),
            )
            .route("/uploads/{filename:.*}", web::get().to(documents::serve_upload_handler))
            // Tipos de comité
            .route("/committee-types", web::get().to(committee_types::list_committee_types_handler))
            .route("/committee-types", web::post().to(committee_types::create_committee_type_handler))
            // Asistencia
            .route("/oauth/attendance/", web::post().to(attendance::register_attendance_handler))
            .route("/oauth/attendance/", web::get().to(attendance::list_attendance_handler))
            // OCR
            .route("/ocr/ine", web::post().to(ocr::ocr_ine_handler))
            // Administración
            .route("/admin/users", web::get().to(admin::get_users_handler))
            .route("/admin/users", web::post().to(admin::create_user_handler))
            .route("/admin/users/{id}", web::delete().to(admin::delete_user_handler))
            .route(
                "/admin/administrative-units",
                web::get().to(admin::get_units_handler),
            )
            .route(
                "/admin/administrative-units/populate",
                web::post().to(admin::populate_units_handler),
            )
            .route(
                "/admin/administrative-units/{id}",
                web::get().to(admin::get_unit_handler),
            )
            .route("/admin/assignments", web::get().to(admin::get_assignments_handler))
            .route("/admin/assignments", web::post().to(admin::create_assignment_handler))
            .route("/admin/assignments/{id}", web::delete().to(admin::delete_assignment_handler))
            .route("/admin/secciones", web::get().to(admin::get_secciones_handler))
            .route("/admin/secciones/import", web::post().to(admin::import_secciones_handler))
            .route("/admin/secciones/municipios", web::get().to(admin::get_municipios_handler))
            .route("/admin/secciones/distritos", web::get().to(admin::get_distritos_handler))
            .route("/admin/stats", web::get().to(admin::admin_stats_handler))
            // Tablero
            .route("/dashboard/attendance", web::get().to(dashboard::attendance_handler))
            .route("/dashboard/attendance/map", web::get().to(dashboard::attendance_map_handler))
            .route("/dashboard/committee-stats", web::get().to(dashboard::committee_stats_handler))
            .route(
                "/dashboard/administrative-tree",
                web::get().to(dashboard::administrative_tree_handler),
            )
            .route(
                "/dashboard/user-assignments",
                web::get().to(dashboard::user_assignments_handler),
            )
            .route(
                "/dashboard/exports/committees.xlsx",
                web::get().to(dashboard::export_committees_excel_handler),
            )
            .route("/dashboard/committees", web::get().to(dashboard::committees_handler))
            .route(
                "/dashboard/committees/{id}/acta.pdf",
                web::get().to(dashboard::acta_pdf_handler),
            )
            .route(
                "/dashboard/committees/{id}",
                web::get().to(dashboard::committee_detail_handler),
            )
            .route("/dashboard/documents", web::get().to(dashboard::documents_gallery_handler))
            .route("/dashboard/metrics", web::get().to(dashboard::metrics_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}
