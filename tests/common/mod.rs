// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use fintrack::application::{LedgerService, NewMovement};
use fintrack::domain::{
    CategoryKind, Cents, Movement, MovementKind, OverdraftPolicy, UserId, Wallet, WalletId,
};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Same as [`test_service`] but refusing withdrawals below zero
pub async fn strict_service() -> Result<(LedgerService, TempDir)> {
    let (service, dir) = test_service().await?;
    Ok((service.with_overdraft_policy(OverdraftPolicy::Deny), dir))
}

pub fn alice() -> UserId {
    UserId::new("alice")
}

pub fn bob() -> UserId {
    UserId::new("bob")
}

/// Helper to build a date
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn wallet(service: &LedgerService, user: &UserId, title: &str, balance: Cents) -> Wallet {
    service
        .create_wallet(user, title.into(), balance, None)
        .await
        .unwrap()
}

pub async fn balance(service: &LedgerService, user: &UserId, id: WalletId) -> Cents {
    service.get_wallet(user, id).await.unwrap().balance
}

/// Record an expense or income on a wallet, with no category
pub async fn movement(
    service: &LedgerService,
    user: &UserId,
    kind: MovementKind,
    wallet: Option<WalletId>,
    amount: Cents,
    on: NaiveDate,
) -> Movement {
    let mut new = NewMovement::new(amount, on);
    new.wallet = wallet;
    service.create_movement(user, kind, new).await.unwrap()
}

/// Test fixture: a user with a bank account and a cash wallet
pub struct StandardWallets {
    pub bank: Wallet,
    pub cash: Wallet,
}

impl StandardWallets {
    /// Bank starts at 100.00, cash at 50.00
    pub async fn create(service: &LedgerService, user: &UserId) -> Result<Self> {
        let bank = service
            .create_wallet(user, "Bank".into(), 10000, None)
            .await?;
        let cash = service
            .create_wallet(user, "Cash".into(), 5000, None)
            .await?;
        Ok(Self { bank, cash })
    }

    /// Adds a "Groceries" expense category and a "Salary" income category
    pub async fn with_categories(
        service: &LedgerService,
        user: &UserId,
    ) -> Result<(Self, fintrack::domain::Category, fintrack::domain::Category)> {
        let wallets = Self::create(service, user).await?;
        let groceries = service
            .create_category(user, CategoryKind::Expense, "Groceries".into(), None, None)
            .await?;
        let salary = service
            .create_category(user, CategoryKind::Income, "Salary".into(), None, None)
            .await?;
        Ok((wallets, groceries, salary))
    }
}
