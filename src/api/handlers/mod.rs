pub mod admin;
pub mod attendance;
pub mod auth;
pub mod committee_types;
pub mod committees;
pub mod dashboard;
pub mod documents;
pub mod ocr;
