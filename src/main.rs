// --- Sistema de Registro de Comités - Archivo principal ---

use comites::config::settings;
use comites::run_server;
use comites::store;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cfg = settings();
    println!("=== {} (API) ===", cfg.app_name);

    if let Err(e) = store::init_db() {
        eprintln!("Error inicializando la base de datos: {}", e);
        return Err(std::io::Error::other(e.to_string()));
    }

    println!("Iniciando servidor en http://{}", cfg.bind_addr);
    run_server(&cfg.bind_addr).await
}
