use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId, WalletId};

pub type TransferId = Uuid;

/// A movement of money between two wallets of the same user.
///
/// Unlike expenses and incomes, a transfer is balance-neutral across the
/// user's wallets. Either side may become `None` once the wallet it pointed
/// to is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub owner: UserId,
    /// Source wallet (balance decreases)
    pub source_wallet: Option<WalletId>,
    /// Destination wallet (balance increases)
    pub destination_wallet: Option<WalletId>,
    /// Amount in cents (always positive)
    pub amount: Cents,
    pub description: Option<String>,
    /// When the transfer happened in the real world
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    pub fn new(
        owner: UserId,
        source_wallet: WalletId,
        destination_wallet: WalletId,
        amount: Cents,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            source_wallet: Some(source_wallet),
            destination_wallet: Some(destination_wallet),
            amount,
            description: None,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// True once either wallet has been deleted; reversals are then partial.
    pub fn is_detached(&self) -> bool {
        self.source_wallet.is_none() || self.destination_wallet.is_none()
    }
}
