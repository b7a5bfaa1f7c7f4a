use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{ValidationError, check_max_len};
use super::{CategoryId, CategoryKind, Cents, MAX_AMOUNT_CENTS, UserId, WalletId};

pub type MovementId = Uuid;

pub const MOVEMENT_TITLE_MAX_LEN: usize = 255;

/// Which way a movement record moves money relative to its wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Money leaves the wallet
    Expense,
    /// Money enters the wallet
    Income,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Expense => "expense",
            MovementKind::Income => "income",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expense" => Some(MovementKind::Expense),
            "income" => Some(MovementKind::Income),
            _ => None,
        }
    }

    /// Categories a record of this kind may reference.
    pub fn category_kind(&self) -> CategoryKind {
        match self {
            MovementKind::Expense => CategoryKind::Expense,
            MovementKind::Income => CategoryKind::Income,
        }
    }

    /// Balance delta caused by the presence of a record of this kind.
    pub fn effect(&self, amount: Cents) -> Cents {
        match self {
            MovementKind::Expense => -amount,
            MovementKind::Income => amount,
        }
    }

    /// Title shown when the record has none of its own.
    pub fn default_title(&self) -> &'static str {
        match self {
            MovementKind::Expense => "Expense",
            MovementKind::Income => "Income",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense or income record tying an amount to a wallet and an optional category.
///
/// `wallet` and `category` become `None` when the referenced row is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub kind: MovementKind,
    pub owner: UserId,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Always positive; the kind decides the direction
    pub amount: Cents,
    pub date: NaiveDate,
    pub category: Option<CategoryId>,
    pub wallet: Option<WalletId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movement {
    pub fn new(kind: MovementKind, owner: UserId, amount: Cents, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            owner,
            title: None,
            description: None,
            amount,
            date,
            category: None,
            wallet: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_category(mut self, category: Option<CategoryId>) -> Self {
        self.category = category;
        self
    }

    pub fn with_wallet(mut self, wallet: Option<WalletId>) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.kind.default_title())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            check_max_len("title", title, MOVEMENT_TITLE_MAX_LEN)?;
        }
        validate_amount(self.amount)
    }
}

/// Amounts on records are strictly positive and fit ten digits.
pub fn validate_amount(amount: Cents) -> Result<(), ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }
    if amount > MAX_AMOUNT_CENTS {
        return Err(ValidationError::new("amount", "is out of range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: MovementKind, amount: Cents) -> Movement {
        Movement::new(
            kind,
            UserId::new("alice"),
            amount,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    #[test]
    fn test_effect_direction() {
        assert_eq!(MovementKind::Expense.effect(2000), -2000);
        assert_eq!(MovementKind::Income.effect(2000), 2000);
    }

    #[test]
    fn test_category_kind_matches_movement_kind() {
        assert_eq!(MovementKind::Expense.category_kind(), CategoryKind::Expense);
        assert_eq!(MovementKind::Income.category_kind(), CategoryKind::Income);
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(sample(MovementKind::Expense, 1).validate().is_ok());
        assert_eq!(
            sample(MovementKind::Expense, 0).validate().unwrap_err().field,
            "amount"
        );
        assert!(sample(MovementKind::Income, -500).validate().is_err());
        assert!(sample(MovementKind::Income, MAX_AMOUNT_CENTS + 1).validate().is_err());
    }

    #[test]
    fn test_title_is_optional_but_bounded() {
        let untitled = sample(MovementKind::Income, 100);
        assert_eq!(untitled.display_title(), "Income");

        let long = sample(MovementKind::Expense, 100)
            .with_title(Some("x".repeat(MOVEMENT_TITLE_MAX_LEN + 1)));
        assert_eq!(long.validate().unwrap_err().field, "title");
    }
}
