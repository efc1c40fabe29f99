pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;

pub use api::{create_router, AppState};
pub use config::{LogicalDatabase, Settings};
pub use error::{DashboardError, DashboardResult};
