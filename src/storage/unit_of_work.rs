use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, Sqlite, Transaction};

use crate::domain::{
    Category, CategoryId, CategoryKind, Cents, MAX_BALANCE_CENTS, Movement, MovementId,
    MovementKind, Transfer, TransferId, UserId, Wallet, WalletId,
};

use super::rows::{
    CATEGORY_COLUMNS, MOVEMENT_COLUMNS, TRANSFER_COLUMNS, WALLET_COLUMNS, date_param,
    row_to_category, row_to_movement, row_to_transfer, row_to_wallet,
};

/// One atomic unit of work over a single SQL transaction.
///
/// Every balance write and record write of a service operation goes through
/// the same `UnitOfWork`. Nothing is visible to other connections until
/// [`commit`](Self::commit); dropping the value without committing rolls
/// everything back.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    /// Make every write of this unit durable.
    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")
    }

    // ========================
    // Ledger primitives
    // ========================

    /// Add `amount` to the wallet's balance. Returns the new balance.
    pub async fn deposit(&mut self, wallet: WalletId, amount: Cents) -> Result<Cents> {
        self.adjust_balance(wallet, amount)
            .await
            .context("Failed to deposit")
    }

    /// Subtract `amount` from the wallet's balance. Returns the new balance,
    /// which may be negative.
    pub async fn withdraw(&mut self, wallet: WalletId, amount: Cents) -> Result<Cents> {
        self.adjust_balance(wallet, -amount)
            .await
            .context("Failed to withdraw")
    }

    /// Withdraw from `source` then deposit into `destination`.
    /// Returns both new balances.
    pub async fn transfer_balance(
        &mut self,
        source: WalletId,
        destination: WalletId,
        amount: Cents,
    ) -> Result<(Cents, Cents)> {
        let source_balance = self.withdraw(source, amount).await?;
        let destination_balance = self.deposit(destination, amount).await?;
        Ok((source_balance, destination_balance))
    }

    /// In-place increment so concurrent writers cannot lose an update.
    async fn adjust_balance(&mut self, wallet: WalletId, delta: Cents) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance + ?, updated_at = ?
            WHERE id = ?
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(Utc::now().to_rfc3339())
        .bind(wallet.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to update wallet balance")?;

        let Some(row) = row else {
            anyhow::bail!("Wallet {} disappeared during balance update", wallet);
        };
        let balance: Cents = row
            .try_get("balance")
            .context("Wallet balance is no longer an integer")?;
        anyhow::ensure!(
            balance.abs() <= MAX_BALANCE_CENTS,
            "Wallet {} balance out of range: {}",
            wallet,
            balance
        );
        Ok(balance)
    }

    // ========================
    // Wallets
    // ========================

    /// Look up a wallet owned by `owner`.
    pub async fn find_wallet(&mut self, owner: &UserId, id: WalletId) -> Result<Option<Wallet>> {
        let query = format!(
            "SELECT {} FROM wallets WHERE id = ? AND owner = ?",
            WALLET_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch wallet")?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    /// Whether another wallet of `owner` already uses `title`.
    pub async fn wallet_title_taken(
        &mut self,
        owner: &UserId,
        title: &str,
        except: Option<WalletId>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM wallets WHERE owner = ? AND title = ? AND id != ?",
        )
        .bind(owner.as_str())
        .bind(title)
        .bind(except.map(|id| id.to_string()).unwrap_or_default())
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to check wallet title")?
        .get("count");
        Ok(count > 0)
    }

    pub async fn insert_wallet(&mut self, wallet: &Wallet) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallets (id, owner, title, balance, color, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(wallet.id.to_string())
        .bind(wallet.owner.as_str())
        .bind(&wallet.title)
        .bind(wallet.balance)
        .bind(&wallet.color)
        .bind(wallet.created_at.to_rfc3339())
        .bind(wallet.updated_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to save wallet")?;
        Ok(())
    }

    /// Persist title and colour. The balance column is only ever moved by
    /// the ledger primitives.
    pub async fn update_wallet_details(&mut self, wallet: &Wallet) -> Result<()> {
        sqlx::query("UPDATE wallets SET title = ?, color = ?, updated_at = ? WHERE id = ?")
            .bind(&wallet.title)
            .bind(&wallet.color)
            .bind(wallet.updated_at.to_rfc3339())
            .bind(wallet.id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to update wallet")?;
        Ok(())
    }

    /// Delete a wallet. Records pointing at it keep existing with a NULL wallet.
    pub async fn delete_wallet(&mut self, id: WalletId) -> Result<()> {
        sqlx::query("DELETE FROM wallets WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete wallet")?;
        Ok(())
    }

    /// Number of transfers that reference the wallet on either side.
    pub async fn count_transfers_for_wallet(&mut self, id: WalletId) -> Result<i64> {
        let id_str = id.to_string();
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM transfers
            WHERE source_wallet_id = ? OR destination_wallet_id = ?
            "#,
        )
        .bind(&id_str)
        .bind(&id_str)
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to count transfers for wallet")?
        .get("count");
        Ok(count)
    }

    // ========================
    // Categories
    // ========================

    pub async fn find_category(
        &mut self,
        owner: &UserId,
        kind: CategoryKind,
        id: CategoryId,
    ) -> Result<Option<Category>> {
        let query = format!(
            "SELECT {} FROM categories WHERE id = ? AND owner = ? AND kind = ?",
            CATEGORY_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner.as_str())
            .bind(kind.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch category")?;

        row.as_ref().map(row_to_category).transpose()
    }

    pub async fn category_title_taken(
        &mut self,
        owner: &UserId,
        kind: CategoryKind,
        title: &str,
        except: Option<CategoryId>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM categories
            WHERE owner = ? AND kind = ? AND title = ? AND id != ?
            "#,
        )
        .bind(owner.as_str())
        .bind(kind.as_str())
        .bind(title)
        .bind(except.map(|id| id.to_string()).unwrap_or_default())
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to check category title")?
        .get("count");
        Ok(count > 0)
    }

    pub async fn insert_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, kind, owner, title, description, color_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(category.id.to_string())
        .bind(category.kind.as_str())
        .bind(category.owner.as_str())
        .bind(&category.title)
        .bind(&category.description)
        .bind(&category.color_code)
        .bind(category.created_at.to_rfc3339())
        .bind(category.updated_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to save category")?;
        Ok(())
    }

    pub async fn update_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE categories
            SET title = ?, description = ?, color_code = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&category.title)
        .bind(&category.description)
        .bind(&category.color_code)
        .bind(category.updated_at.to_rfc3339())
        .bind(category.id.to_string())
        .execute(&mut *self.tx)
        .await
        .context("Failed to update category")?;
        Ok(())
    }

    pub async fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete category")?;
        Ok(())
    }

    // ========================
    // Expenses and incomes
    // ========================

    pub async fn find_movement(
        &mut self,
        owner: &UserId,
        kind: MovementKind,
        id: MovementId,
    ) -> Result<Option<Movement>> {
        let query = format!(
            "SELECT {} FROM movements m WHERE m.id = ? AND m.owner = ? AND m.kind = ?",
            MOVEMENT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner.as_str())
            .bind(kind.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch movement")?;

        row.as_ref().map(row_to_movement).transpose()
    }

    pub async fn insert_movement(&mut self, movement: &Movement) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO movements (id, kind, owner, title, description, amount, date, category_id, wallet_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(movement.id.to_string())
        .bind(movement.kind.as_str())
        .bind(movement.owner.as_str())
        .bind(&movement.title)
        .bind(&movement.description)
        .bind(movement.amount)
        .bind(date_param(movement.date))
        .bind(movement.category.map(|id| id.to_string()))
        .bind(movement.wallet.map(|id| id.to_string()))
        .bind(movement.created_at.to_rfc3339())
        .bind(movement.updated_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to save movement")?;
        Ok(())
    }

    pub async fn update_movement(&mut self, movement: &Movement) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE movements
            SET title = ?, description = ?, amount = ?, date = ?, category_id = ?, wallet_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&movement.title)
        .bind(&movement.description)
        .bind(movement.amount)
        .bind(date_param(movement.date))
        .bind(movement.category.map(|id| id.to_string()))
        .bind(movement.wallet.map(|id| id.to_string()))
        .bind(movement.updated_at.to_rfc3339())
        .bind(movement.id.to_string())
        .execute(&mut *self.tx)
        .await
        .context("Failed to update movement")?;
        Ok(())
    }

    pub async fn delete_movement(&mut self, id: MovementId) -> Result<()> {
        sqlx::query("DELETE FROM movements WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete movement")?;
        Ok(())
    }

    // ========================
    // Transfers
    // ========================

    pub async fn find_transfer(
        &mut self,
        owner: &UserId,
        id: TransferId,
    ) -> Result<Option<Transfer>> {
        let query = format!(
            "SELECT {} FROM transfers t WHERE t.id = ? AND t.owner = ?",
            TRANSFER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch transfer")?;

        row.as_ref().map(row_to_transfer).transpose()
    }

    pub async fn insert_transfer(&mut self, transfer: &Transfer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transfers (id, owner, source_wallet_id, destination_wallet_id, amount, description, date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transfer.id.to_string())
        .bind(transfer.owner.as_str())
        .bind(transfer.source_wallet.map(|id| id.to_string()))
        .bind(transfer.destination_wallet.map(|id| id.to_string()))
        .bind(transfer.amount)
        .bind(&transfer.description)
        .bind(date_param(transfer.date))
        .bind(transfer.created_at.to_rfc3339())
        .bind(transfer.updated_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to save transfer")?;
        Ok(())
    }

    pub async fn update_transfer(&mut self, transfer: &Transfer) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transfers
            SET amount = ?, description = ?, date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(transfer.amount)
        .bind(&transfer.description)
        .bind(date_param(transfer.date))
        .bind(transfer.updated_at.to_rfc3339())
        .bind(transfer.id.to_string())
        .execute(&mut *self.tx)
        .await
        .context("Failed to update transfer")?;
        Ok(())
    }

    pub async fn delete_transfer(&mut self, id: TransferId) -> Result<()> {
        sqlx::query("DELETE FROM transfers WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete transfer")?;
        Ok(())
    }
}
