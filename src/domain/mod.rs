pub mod decision;
pub mod history;
pub mod order;
pub mod pnl;
pub mod position;
pub mod snapshot;

pub use decision::*;
pub use history::*;
pub use order::*;
pub use pnl::*;
pub use position::*;
pub use snapshot::*;
