pub mod handlers;
pub mod models;
pub mod registry;
pub mod repository;

pub use handlers::*;
pub use models::*;
pub use registry::*;
pub use repository::*;
