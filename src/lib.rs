// Biblioteca raíz del crate `comites`.
// Reexporta los módulos principales del backend de registro de comités.
pub mod api;
pub mod auth;
pub mod config;
pub mod exports;
pub mod models;
pub mod ocr;
pub mod server;
pub mod store;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
