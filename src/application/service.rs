use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::domain::{
    Cents, LedgerOp, OverdraftPolicy, UserId, Wallet, WalletId, clean_text, net_by_wallet,
    validate_amount,
};
use crate::storage::{Repository, UnitOfWork};

use super::AppError;

/// Application service providing high-level operations for the tracker.
/// This is the primary interface for any client (CLI, API, etc.).
///
/// Every mutating operation runs inside one [`UnitOfWork`]: ledger writes and
/// record writes commit together or not at all.
pub struct LedgerService {
    pub(super) repo: Repository,
    overdraft: OverdraftPolicy,
}

/// Partial wallet update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct WalletUpdate {
    pub title: Option<String>,
    pub color: Option<String>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            overdraft: OverdraftPolicy::default(),
        }
    }

    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn with_overdraft_policy(mut self, policy: OverdraftPolicy) -> Self {
        self.overdraft = policy;
        self
    }

    pub fn overdraft_policy(&self) -> OverdraftPolicy {
        self.overdraft
    }

    // ========================
    // Wallet operations
    // ========================

    /// Create a wallet with an opening balance.
    pub async fn create_wallet(
        &self,
        user: &UserId,
        title: String,
        balance: Cents,
        color: Option<String>,
    ) -> Result<Wallet, AppError> {
        let mut wallet = Wallet::new(user.clone(), title, balance);
        if let Some(color) = clean_text(color) {
            wallet = wallet.with_color(color);
        }
        wallet.validate()?;

        let mut uow = self.repo.begin().await?;
        if uow.wallet_title_taken(user, &wallet.title, None).await? {
            return Err(AppError::WalletAlreadyExists(wallet.title));
        }
        uow.insert_wallet(&wallet).await?;
        uow.commit().await?;

        info!(
            wallet = %wallet.id,
            title = %wallet.title,
            balance = wallet.balance,
            "wallet created"
        );
        Ok(wallet)
    }

    pub async fn get_wallet(&self, user: &UserId, id: WalletId) -> Result<Wallet, AppError> {
        self.repo
            .get_wallet(user, id)
            .await?
            .ok_or_else(|| AppError::WalletNotFound(id.to_string()))
    }

    pub async fn list_wallets(&self, user: &UserId) -> Result<Vec<Wallet>, AppError> {
        Ok(self.repo.list_wallets(user).await?)
    }

    /// Rename or recolour a wallet. The balance only moves through the ledger.
    pub async fn update_wallet(
        &self,
        user: &UserId,
        id: WalletId,
        update: WalletUpdate,
    ) -> Result<Wallet, AppError> {
        let mut uow = self.repo.begin().await?;
        let mut wallet = find_wallet(&mut uow, user, id).await?;

        if let Some(title) = update.title {
            wallet.title = title.trim().to_string();
        }
        if let Some(color) = clean_text(update.color) {
            wallet.color = color;
        }
        wallet.validate()?;

        if uow
            .wallet_title_taken(user, &wallet.title, Some(wallet.id))
            .await?
        {
            return Err(AppError::WalletAlreadyExists(wallet.title));
        }

        wallet.updated_at = chrono::Utc::now();
        uow.update_wallet_details(&wallet).await?;
        uow.commit().await?;

        info!(wallet = %wallet.id, title = %wallet.title, "wallet updated");
        Ok(wallet)
    }

    /// Delete a wallet. Expenses, incomes and transfers that pointed at it
    /// stay, with their wallet reference cleared.
    pub async fn delete_wallet(&self, user: &UserId, id: WalletId) -> Result<Wallet, AppError> {
        let mut uow = self.repo.begin().await?;
        let wallet = find_wallet(&mut uow, user, id).await?;

        let transfers = uow.count_transfers_for_wallet(wallet.id).await?;
        if transfers > 0 {
            warn!(
                wallet = %wallet.id,
                transfers,
                "deleting a wallet referenced by transfers; their later reversal will be one-sided"
            );
        }

        uow.delete_wallet(wallet.id).await?;
        uow.commit().await?;

        info!(wallet = %wallet.id, title = %wallet.title, "wallet deleted");
        Ok(wallet)
    }

    // ========================
    // Ledger primitives
    // ========================

    /// Add money to a wallet. Returns the updated wallet.
    pub async fn deposit(
        &self,
        user: &UserId,
        wallet: WalletId,
        amount: Cents,
    ) -> Result<Wallet, AppError> {
        self.single_wallet_op(user, wallet, amount, |wallet, amount| LedgerOp::Deposit {
            wallet,
            amount,
        })
        .await
    }

    /// Take money out of a wallet. Returns the updated wallet.
    pub async fn withdraw(
        &self,
        user: &UserId,
        wallet: WalletId,
        amount: Cents,
    ) -> Result<Wallet, AppError> {
        self.single_wallet_op(user, wallet, amount, |wallet, amount| LedgerOp::Withdraw {
            wallet,
            amount,
        })
        .await
    }

    /// Move money between two wallets without recording a transfer.
    /// Returns the updated source and destination wallets.
    pub async fn transfer_balance(
        &self,
        user: &UserId,
        source: WalletId,
        destination: WalletId,
        amount: Cents,
    ) -> Result<(Wallet, Wallet), AppError> {
        check_positive(amount)?;
        if source == destination {
            return Err(AppError::SameWalletTransfer);
        }

        let mut uow = self.repo.begin().await?;
        find_wallet(&mut uow, user, source).await?;
        find_wallet(&mut uow, user, destination).await?;

        self.apply_ops(
            &mut uow,
            &[LedgerOp::Transfer {
                source,
                destination,
                amount,
            }],
        )
        .await?;
        let source_wallet = find_wallet(&mut uow, user, source).await?;
        let destination_wallet = find_wallet(&mut uow, user, destination).await?;
        uow.commit().await?;

        info!(%source, %destination, amount, "balance transferred");
        Ok((source_wallet, destination_wallet))
    }

    async fn single_wallet_op(
        &self,
        user: &UserId,
        id: WalletId,
        amount: Cents,
        op: impl FnOnce(WalletId, Cents) -> LedgerOp,
    ) -> Result<Wallet, AppError> {
        check_positive(amount)?;

        let mut uow = self.repo.begin().await?;
        find_wallet(&mut uow, user, id).await?;
        let op = op(id, amount);
        self.apply_ops(&mut uow, &[op]).await?;
        let wallet = find_wallet(&mut uow, user, id).await?;
        uow.commit().await?;

        info!(wallet = %wallet.id, ?op, balance = wallet.balance, "wallet balance adjusted");
        Ok(wallet)
    }

    /// Execute planned ledger operations inside `uow`.
    ///
    /// The overdraft policy is checked once all operations ran, against the
    /// final balance of every wallet the plan takes money out of on net.
    /// A re-amounted transfer first moves the whole old amount back, so
    /// intermediate balances may dip below zero without the result doing so.
    pub(super) async fn apply_ops(
        &self,
        uow: &mut UnitOfWork,
        ops: &[LedgerOp],
    ) -> Result<(), AppError> {
        let mut balances: HashMap<WalletId, Cents> = HashMap::new();
        for op in ops {
            match *op {
                LedgerOp::Deposit { wallet, amount } => {
                    let balance = uow.deposit(wallet, amount).await?;
                    debug!(%wallet, amount, balance, "deposit");
                    balances.insert(wallet, balance);
                }
                LedgerOp::Withdraw { wallet, amount } => {
                    let balance = uow.withdraw(wallet, amount).await?;
                    debug!(%wallet, amount, balance, "withdraw");
                    balances.insert(wallet, balance);
                }
                LedgerOp::Transfer {
                    source,
                    destination,
                    amount,
                } => {
                    let (source_balance, destination_balance) =
                        uow.transfer_balance(source, destination, amount).await?;
                    debug!(
                        %source,
                        %destination,
                        amount,
                        source_balance,
                        destination_balance,
                        "transfer_balance"
                    );
                    balances.insert(source, source_balance);
                    balances.insert(destination, destination_balance);
                }
            }
        }

        for (wallet, net) in net_by_wallet(ops) {
            if net >= 0 {
                continue;
            }
            if let Some(&balance_after) = balances.get(&wallet) {
                self.check_overdraft(wallet, balance_after)?;
            }
        }
        Ok(())
    }

    fn check_overdraft(&self, wallet: WalletId, balance_after: Cents) -> Result<(), AppError> {
        if self.overdraft.permits(balance_after) {
            Ok(())
        } else {
            Err(AppError::InsufficientFunds {
                wallet,
                balance_after,
            })
        }
    }
}

/// Reject zero, negative and out-of-range amounts for money movements.
pub(super) fn check_positive(amount: Cents) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::NonPositiveAmount(amount));
    }
    validate_amount(amount)?;
    Ok(())
}

/// Owner-scoped wallet lookup inside an open unit of work.
pub(super) async fn find_wallet(
    uow: &mut UnitOfWork,
    user: &UserId,
    id: WalletId,
) -> Result<Wallet, AppError> {
    uow.find_wallet(user, id)
        .await?
        .ok_or_else(|| AppError::WalletNotFound(id.to_string()))
}
