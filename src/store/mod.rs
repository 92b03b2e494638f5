pub mod db;
pub mod users;
pub mod committees;
pub mod units;
pub mod attendance;
pub mod reports;
pub mod import;

pub use db::{init_db, open, open_store_connection, StoreConn};
