use tracing::debug;

use crate::domain::{FeedBuilder, MovementKind, Period, TransactionFeed, TransactionType, UserId};

use super::{AppError, LedgerService};

impl LedgerService {
    /// Expenses, incomes and transfers of a year (or one month of it),
    /// grouped by day with each day's net amount.
    ///
    /// Recomputed on every call. Entries of a day keep fetch order:
    /// expenses, then incomes, then transfers.
    pub async fn transaction_feed(
        &self,
        user: &UserId,
        year: i32,
        month: Option<u32>,
        transaction_type: TransactionType,
    ) -> Result<TransactionFeed, AppError> {
        let period = Period::new(year, month)?;
        let mut builder = FeedBuilder::new();

        if transaction_type.includes_expenses() {
            builder.extend(
                self.repo
                    .movement_feed_entries(user, MovementKind::Expense, &period)
                    .await?,
            );
        }
        if transaction_type.includes_incomes() {
            builder.extend(
                self.repo
                    .movement_feed_entries(user, MovementKind::Income, &period)
                    .await?,
            );
        }
        if transaction_type.includes_transfers() {
            builder.extend(self.repo.transfer_feed_entries(user, &period).await?);
        }

        let feed = builder.finish();
        debug!(
            year,
            ?month,
            transaction_type = transaction_type.as_str(),
            days = feed.len(),
            "feed built"
        );
        Ok(feed)
    }

    /// Same as [`transaction_feed`](Self::transaction_feed) with the type
    /// given as text (`all`, `expense`, `income`, `transfer`). An unknown
    /// value fails before anything is read.
    pub async fn transaction_feed_str(
        &self,
        user: &UserId,
        year: i32,
        month: Option<u32>,
        transaction_type: &str,
    ) -> Result<TransactionFeed, AppError> {
        let transaction_type: TransactionType = transaction_type.parse()?;
        self.transaction_feed(user, year, month, transaction_type)
            .await
    }
}
