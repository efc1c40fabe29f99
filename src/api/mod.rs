pub mod handlers;
pub mod routes;
pub mod dto;
pub mod errors;

pub use routes::create_router;
pub use errors::ApiError;
pub use handlers::AppState;
