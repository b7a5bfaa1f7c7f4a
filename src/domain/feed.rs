//! The unified transaction feed: expenses, incomes and transfers for a
//! period, grouped by calendar day with the day's net amount.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::{
    CategoryId, Cents, InvalidArgument, Movement, MovementId, MovementKind, Transfer, TransferId,
    WalletId,
};

/// Which record types a feed request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionType {
    #[default]
    All,
    Expense,
    Income,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::All => "all",
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn includes_expenses(&self) -> bool {
        matches!(self, TransactionType::All | TransactionType::Expense)
    }

    pub fn includes_incomes(&self) -> bool {
        matches!(self, TransactionType::All | TransactionType::Income)
    }

    pub fn includes_transfers(&self) -> bool {
        matches!(self, TransactionType::All | TransactionType::Transfer)
    }
}

impl FromStr for TransactionType {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TransactionType::All),
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            "transfer" => Ok(TransactionType::Transfer),
            other => Err(InvalidArgument(format!(
                "Invalid transaction type '{}'. Valid options are all, expense, income, transfer.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub title: String,
    pub color_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    pub id: WalletId,
    pub title: String,
}

/// An expense or income as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementEntry {
    pub id: MovementId,
    pub date: NaiveDate,
    pub title: String,
    pub amount: Cents,
    pub description: Option<String>,
    pub category: Option<CategorySummary>,
    pub wallet: Option<WalletSummary>,
}

impl MovementEntry {
    pub fn new(
        movement: &Movement,
        category: Option<CategorySummary>,
        wallet: Option<WalletSummary>,
    ) -> Self {
        Self {
            id: movement.id,
            date: movement.date,
            title: movement.display_title().to_string(),
            amount: movement.amount,
            description: movement.description.clone(),
            category,
            wallet,
        }
    }
}

/// A transfer as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEntry {
    pub id: TransferId,
    pub date: NaiveDate,
    pub title: String,
    pub amount: Cents,
    pub description: Option<String>,
    pub source_wallet: Option<WalletSummary>,
    pub destination_wallet: Option<WalletSummary>,
}

impl TransferEntry {
    pub fn new(
        transfer: &Transfer,
        source_wallet: Option<WalletSummary>,
        destination_wallet: Option<WalletSummary>,
    ) -> Self {
        let title = match (&source_wallet, &destination_wallet) {
            (Some(source), Some(destination)) => {
                format!("Transfer: {} → {}", source.title, destination.title)
            }
            _ => "Transfer".to_string(),
        };
        Self {
            id: transfer.id,
            date: transfer.date,
            title,
            amount: transfer.amount,
            description: transfer.description.clone(),
            source_wallet,
            destination_wallet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "transaction_type", rename_all = "lowercase")]
pub enum FeedEntry {
    Expense(MovementEntry),
    Income(MovementEntry),
    Transfer(TransferEntry),
}

impl FeedEntry {
    pub fn movement(kind: MovementKind, entry: MovementEntry) -> Self {
        match kind {
            MovementKind::Expense => FeedEntry::Expense(entry),
            MovementKind::Income => FeedEntry::Income(entry),
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            FeedEntry::Expense(e) | FeedEntry::Income(e) => e.date,
            FeedEntry::Transfer(t) => t.date,
        }
    }

    pub fn amount(&self) -> Cents {
        match self {
            FeedEntry::Expense(e) | FeedEntry::Income(e) => e.amount,
            FeedEntry::Transfer(t) => t.amount,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            FeedEntry::Expense(e) | FeedEntry::Income(e) => &e.title,
            FeedEntry::Transfer(t) => &t.title,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            FeedEntry::Expense(_) => TransactionType::Expense,
            FeedEntry::Income(_) => TransactionType::Income,
            FeedEntry::Transfer(_) => TransactionType::Transfer,
        }
    }

    /// Contribution to the day's net amount. Transfers stay inside the
    /// user's own wallets and contribute nothing.
    pub fn net_effect(&self) -> Cents {
        match self {
            FeedEntry::Expense(e) => MovementKind::Expense.effect(e.amount),
            FeedEntry::Income(e) => MovementKind::Income.effect(e.amount),
            FeedEntry::Transfer(_) => 0,
        }
    }
}

/// All feed entries of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    /// Incomes minus expenses for the day
    pub amount: Cents,
    pub transactions: Vec<FeedEntry>,
}

impl DateGroup {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            amount: 0,
            transactions: Vec::new(),
        }
    }
}

/// Accumulates entries into per-day groups in one pass.
///
/// Entries keep their push order inside a day; days come out ascending.
#[derive(Debug, Default)]
pub struct FeedBuilder {
    groups: BTreeMap<NaiveDate, DateGroup>,
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FeedEntry) {
        let date = entry.date();
        let group = self
            .groups
            .entry(date)
            .or_insert_with(|| DateGroup::new(date));
        group.amount += entry.net_effect();
        group.transactions.push(entry);
    }

    pub fn extend<I: IntoIterator<Item = FeedEntry>>(&mut self, entries: I) {
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn finish(self) -> TransactionFeed {
        TransactionFeed {
            groups: self.groups,
        }
    }
}

/// The grouped feed, consumed as an ascending sequence of [`DateGroup`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFeed {
    groups: BTreeMap<NaiveDate, DateGroup>,
}

impl TransactionFeed {
    pub fn iter(&self) -> impl Iterator<Item = &DateGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DateGroup> {
        self.groups.get(&date)
    }

    /// Net amount over the whole period.
    pub fn total(&self) -> Cents {
        self.groups.values().map(|g| g.amount).sum()
    }
}

impl IntoIterator for TransactionFeed {
    type Item = DateGroup;
    type IntoIter = std::collections::btree_map::IntoValues<NaiveDate, DateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_values()
    }
}

impl Serialize for TransactionFeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.groups.values())
    }
}
