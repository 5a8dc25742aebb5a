pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod error;
pub mod handlers;
pub mod models;
pub mod price_calculator;
pub mod repository;
pub mod status_machine;

pub use availability::*;
pub use booking::*;
pub use cancellation::*;
pub use error::*;
pub use handlers::*;
pub use models::*;
pub use price_calculator::*;
pub use repository::*;
pub use status_machine::*;
