pub mod db_rows;
pub mod snapshot_calculator;
pub mod stats_aggregator;
pub mod stats_repository;

pub use snapshot_calculator::*;
pub use stats_aggregator::*;
pub use stats_repository::*;
