mod category;
mod feed;
mod filter;
mod ledger;
mod money;
mod movement;
mod transfer;
mod user;
mod validation;
mod wallet;

pub use category::*;
pub use feed::*;
pub use filter::*;
pub use ledger::*;
pub use money::*;
pub use movement::*;
pub use transfer::*;
pub use user::*;
pub use validation::{ValidationError, clean_text};
pub use wallet::*;
