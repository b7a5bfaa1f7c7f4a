use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::domain::{
    Category, CategoryId, CategoryKind, FeedEntry, Movement, MovementEntry, MovementFilter,
    MovementId, MovementKind, Period, Transfer, TransferEntry, TransferId, UserId, Wallet,
    WalletId,
};

use super::MIGRATION_001_INITIAL;
use super::UnitOfWork;
use super::rows::{
    CATEGORY_COLUMNS, MOVEMENT_COLUMNS, TRANSFER_COLUMNS, WALLET_COLUMNS, date_param,
    joined_category, joined_wallet, row_to_category, row_to_movement, row_to_transfer,
    row_to_wallet,
};

/// Pool-level access to wallets, categories, movements and transfers.
///
/// Reads go straight to the pool. Every write goes through a
/// [`UnitOfWork`] obtained from [`begin`](Self::begin).
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to an existing SQLite database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::open(database_url, false).await
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (create if missing + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::open(database_url, true).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    async fn open(database_url: &str, create: bool) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database location: {}", database_url))?
            .create_if_missing(create)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Start an atomic unit of work.
    pub async fn begin(&self) -> Result<UnitOfWork> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(UnitOfWork::new(tx))
    }

    // ========================
    // Wallets
    // ========================

    pub async fn get_wallet(&self, owner: &UserId, id: WalletId) -> Result<Option<Wallet>> {
        let query = format!(
            "SELECT {} FROM wallets WHERE id = ? AND owner = ?",
            WALLET_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch wallet")?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    /// All wallets of a user, by title.
    pub async fn list_wallets(&self, owner: &UserId) -> Result<Vec<Wallet>> {
        let query = format!(
            "SELECT {} FROM wallets WHERE owner = ? ORDER BY title",
            WALLET_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list wallets")?;

        rows.iter().map(row_to_wallet).collect()
    }

    // ========================
    // Categories
    // ========================

    pub async fn get_category(
        &self,
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
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category")?;

        row.as_ref().map(row_to_category).transpose()
    }

    pub async fn list_categories(
        &self,
        owner: &UserId,
        kind: CategoryKind,
    ) -> Result<Vec<Category>> {
        let query = format!(
            "SELECT {} FROM categories WHERE owner = ? AND kind = ? ORDER BY title",
            CATEGORY_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(owner.as_str())
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter().map(row_to_category).collect()
    }

    // ========================
    // Expenses and incomes
    // ========================

    pub async fn get_movement(
        &self,
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
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch movement")?;

        row.as_ref().map(row_to_movement).transpose()
    }

    /// List expenses or incomes, newest date first.
    ///
    /// `today` anchors the relative `date_filter` presets.
    pub async fn list_movements(
        &self,
        owner: &UserId,
        kind: MovementKind,
        filter: &MovementFilter,
        today: NaiveDate,
    ) -> Result<Vec<Movement>> {
        let mut query = format!(
            "SELECT {} FROM movements m WHERE m.owner = ? AND m.kind = ?",
            MOVEMENT_COLUMNS
        );

        let range = filter.date_range(today);
        let title = filter.title.as_deref().map(str::to_lowercase);
        let category_str = filter.category.map(|id| id.to_string());
        let from_str = range.from.map(date_param);
        let to_str = range.to.map(date_param);

        if title.is_some() {
            query.push_str(" AND instr(lower(coalesce(m.title, '')), ?) > 0");
        }
        if category_str.is_some() {
            query.push_str(" AND m.category_id = ?");
        }
        if from_str.is_some() {
            query.push_str(" AND m.date >= ?");
        }
        if to_str.is_some() {
            query.push_str(" AND m.date <= ?");
        }
        query.push_str(" ORDER BY m.date DESC, m.created_at DESC");

        let mut sql_query = sqlx::query(&query).bind(owner.as_str()).bind(kind.as_str());
        if let Some(ref title) = title {
            sql_query = sql_query.bind(title);
        }
        if let Some(ref category) = category_str {
            sql_query = sql_query.bind(category);
        }
        if let Some(ref from) = from_str {
            sql_query = sql_query.bind(from);
        }
        if let Some(ref to) = to_str {
            sql_query = sql_query.bind(to);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list movements")?;

        rows.iter().map(row_to_movement).collect()
    }

    // ========================
    // Transfers
    // ========================

    pub async fn get_transfer(&self, owner: &UserId, id: TransferId) -> Result<Option<Transfer>> {
        let query = format!(
            "SELECT {} FROM transfers t WHERE t.id = ? AND t.owner = ?",
            TRANSFER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch transfer")?;

        row.as_ref().map(row_to_transfer).transpose()
    }

    /// All transfers of a user, newest first.
    pub async fn list_transfers(&self, owner: &UserId) -> Result<Vec<Transfer>> {
        let query = format!(
            "SELECT {} FROM transfers t WHERE t.owner = ? ORDER BY t.created_at DESC, t.rowid DESC",
            TRANSFER_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transfers")?;

        rows.iter().map(row_to_transfer).collect()
    }

    // ========================
    // Feed rows
    // ========================

    /// Expenses or incomes inside `period`, ascending by date, as feed entries.
    pub async fn movement_feed_entries(
        &self,
        owner: &UserId,
        kind: MovementKind,
        period: &Period,
    ) -> Result<Vec<FeedEntry>> {
        let query = format!(
            r#"
            SELECT {},
                   c.title AS category_title, c.color_code AS category_color,
                   w.title AS wallet_title
            FROM movements m
            LEFT JOIN categories c ON c.id = m.category_id
            LEFT JOIN wallets w ON w.id = m.wallet_id
            WHERE m.owner = ? AND m.kind = ? AND m.date >= ? AND m.date < ?
            ORDER BY m.date, m.created_at, m.rowid
            "#,
            MOVEMENT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(owner.as_str())
            .bind(kind.as_str())
            .bind(date_param(period.start()))
            .bind(date_param(period.end()))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch feed movements")?;

        rows.iter()
            .map(|row| -> Result<FeedEntry> {
                let movement = row_to_movement(row)?;
                let category = joined_category(row, &movement);
                let wallet = joined_wallet(row, movement.wallet, "wallet_title");
                Ok(FeedEntry::movement(
                    kind,
                    MovementEntry::new(&movement, category, wallet),
                ))
            })
            .collect()
    }

    /// Transfers inside `period`, ascending by date, as feed entries.
    pub async fn transfer_feed_entries(
        &self,
        owner: &UserId,
        period: &Period,
    ) -> Result<Vec<FeedEntry>> {
        let query = format!(
            r#"
            SELECT {},
                   s.title AS source_title, d.title AS destination_title
            FROM transfers t
            LEFT JOIN wallets s ON s.id = t.source_wallet_id
            LEFT JOIN wallets d ON d.id = t.destination_wallet_id
            WHERE t.owner = ? AND t.date >= ? AND t.date < ?
            ORDER BY t.date, t.created_at, t.rowid
            "#,
            TRANSFER_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(owner.as_str())
            .bind(date_param(period.start()))
            .bind(date_param(period.end()))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch feed transfers")?;

        rows.iter()
            .map(|row| -> Result<FeedEntry> {
                let transfer = row_to_transfer(row)?;
                let source = joined_wallet(row, transfer.source_wallet, "source_title");
                let destination =
                    joined_wallet(row, transfer.destination_wallet, "destination_title");
                Ok(FeedEntry::Transfer(TransferEntry::new(
                    &transfer,
                    source,
                    destination,
                )))
            })
            .collect()
    }
}
