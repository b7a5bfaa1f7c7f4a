// Application layer - use cases and orchestration.
// Each mutating use case runs in one storage unit of work.

mod categories;
pub mod error;
mod feed;
mod movements;
mod service;
mod transfers;

pub use categories::CategoryUpdate;
pub use error::*;
pub use movements::{MovementUpdate, NewMovement};
pub use service::{LedgerService, WalletUpdate};
pub use transfers::TransferUpdate;
