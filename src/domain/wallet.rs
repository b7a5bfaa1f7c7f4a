use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{ValidationError, check_required};
use super::{Cents, MAX_AMOUNT_CENTS, UserId};

pub type WalletId = Uuid;

pub const DEFAULT_WALLET_COLOR: &str = "#007bff";
pub const WALLET_TITLE_MAX_LEN: usize = 125;

/// A balance-holding account owned by a user.
///
/// The balance is never recomputed from history. It is moved only by the
/// ledger primitives (deposit, withdraw, transfer) as records come and go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner: UserId,
    /// Unique per owner
    pub title: String,
    pub balance: Cents,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(owner: UserId, title: impl Into<String>, balance: Cents) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into().trim().to_string(),
            balance,
            color: DEFAULT_WALLET_COLOR.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("title", &self.title, WALLET_TITLE_MAX_LEN)?;
        if self.balance.abs() > MAX_AMOUNT_CENTS {
            return Err(ValidationError::new("balance", "is out of range"));
        }
        validate_hex_color(&self.color)
    }
}

/// Colours are stored as `#RRGGBB`.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ValidationError::new("color", "must look like #RRGGBB"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("alice")
    }

    #[test]
    fn test_new_wallet_trims_title_and_uses_default_color() {
        let wallet = Wallet::new(owner(), "  Cash  ", 10000);
        assert_eq!(wallet.title, "Cash");
        assert_eq!(wallet.color, DEFAULT_WALLET_COLOR);
        assert_eq!(wallet.balance, 10000);
        assert!(wallet.validate().is_ok());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let wallet = Wallet::new(owner(), "   ", 0);
        assert_eq!(wallet.validate().unwrap_err().field, "title");
    }

    #[test]
    fn test_title_length_limit() {
        let wallet = Wallet::new(owner(), "x".repeat(WALLET_TITLE_MAX_LEN + 1), 0);
        assert!(wallet.validate().is_err());
    }

    #[test]
    fn test_negative_opening_balance_is_allowed() {
        let wallet = Wallet::new(owner(), "Credit card", -2500);
        assert!(wallet.validate().is_ok());
    }

    #[test]
    fn test_color_format() {
        assert!(validate_hex_color("#A1b2C3").is_ok());
        assert!(validate_hex_color("007bff").is_err());
        assert!(validate_hex_color("#12345").is_err());
        assert!(validate_hex_color("#12345g").is_err());
    }
}
