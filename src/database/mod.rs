pub mod migrations;
pub mod models;
pub mod repository;

pub use migrations::*;
pub use models::*;
pub use repository::*;
