use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::application::{
    CategoryUpdate, LedgerService, MovementUpdate, NewMovement, TransferUpdate, WalletUpdate,
};
use crate::config::Settings;
use crate::domain::{
    CategoryId, CategoryKind, DateFilter, FeedEntry, Movement, MovementFilter, MovementKind,
    TransactionType, UserId, WalletId, format_cents, parse_cents, parse_date,
};

/// fintrack - personal finance tracker
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Track wallets, expenses, incomes and transfers from the command line")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, env = "FINTRACK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Database file path (overrides the settings file)
    #[arg(long, env = "FINTRACK_DB", global = true)]
    pub database: Option<String>,

    /// Identity all records belong to
    #[arg(long, env = "FINTRACK_USER", default_value = "default", global = true)]
    pub user: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Wallet management commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Expense and income category commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Expense commands
    #[command(subcommand)]
    Expense(MovementCommands),

    /// Income commands
    #[command(subcommand)]
    Income(MovementCommands),

    /// Transfers between your own wallets
    #[command(subcommand)]
    Transfer(TransferCommands),

    /// Transactions of a year or month, grouped by day
    Feed {
        #[arg(long)]
        year: i32,

        /// Month 1-12 (omit for the whole year)
        #[arg(long)]
        month: Option<u32>,

        /// all, expense, income or transfer
        #[arg(short = 't', long = "type", default_value = "all")]
        transaction_type: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet
    Create {
        /// Wallet title (unique)
        title: String,

        /// Opening balance (e.g., "100.00")
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        balance: String,

        /// Colour as #RRGGBB
        #[arg(short, long)]
        color: Option<String>,
    },

    /// List all wallets
    List,

    /// Show a wallet
    Show {
        /// Wallet title or ID
        wallet: String,
    },

    /// Rename or recolour a wallet
    Update {
        /// Wallet title or ID
        wallet: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },

    /// Delete a wallet (records keep existing without it)
    Delete {
        /// Wallet title or ID
        wallet: String,
    },

    /// Add money to a wallet
    Deposit {
        /// Wallet title or ID
        wallet: String,
        amount: String,
    },

    /// Take money out of a wallet
    Withdraw {
        /// Wallet title or ID
        wallet: String,
        amount: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Expense,
    Income,
}

impl From<KindArg> for CategoryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Expense => CategoryKind::Expense,
            KindArg::Income => CategoryKind::Income,
        }
    }
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a category
    Create {
        #[arg(short, long, value_enum)]
        kind: KindArg,

        title: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },

    /// List categories of one kind
    List {
        #[arg(short, long, value_enum)]
        kind: KindArg,
    },

    /// Update a category
    Update {
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Category title or ID
        category: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },

    /// Delete a category (records become uncategorized)
    Delete {
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Category title or ID
        category: String,
    },
}

#[derive(Args)]
pub struct MovementFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Category title or ID
    #[arg(short, long)]
    pub category: Option<String>,

    /// Wallet title or ID
    #[arg(short, long)]
    pub wallet: Option<String>,
}

#[derive(Subcommand)]
pub enum MovementCommands {
    /// Record a new entry
    Add {
        /// Amount (e.g., "12.50")
        amount: String,

        #[command(flatten)]
        fields: MovementFields,
    },

    /// List entries
    List {
        /// Case-insensitive title search
        #[arg(long)]
        title: Option<String>,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Category title or ID
        #[arg(short, long)]
        category: Option<String>,

        /// today, yesterday, last_7_days, last_15_days, last_30_days, last_90_days, last_365_days
        #[arg(long)]
        date_filter: Option<String>,
    },

    /// Show one entry
    Show { id: String },

    /// Change an entry; omitted fields are kept
    Update {
        id: String,

        #[arg(short, long)]
        amount: Option<String>,

        #[command(flatten)]
        fields: MovementFields,
    },

    /// Delete an entry and undo its effect on the wallet
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TransferCommands {
    /// Move money between two wallets
    Create {
        amount: String,

        /// Source wallet title or ID
        #[arg(long)]
        from: String,

        /// Destination wallet title or ID
        #[arg(long)]
        to: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transfers, newest first
    List,

    /// Show a transfer
    Show { id: String },

    /// Change amount, description or date
    Update {
        id: String,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a transfer and move the money back
    Delete { id: String },
}

impl Cli {
    /// Settings file merged with command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(database) = &self.database {
            settings.database = database.clone();
        }
        Ok(settings)
    }

    pub async fn run(self, settings: Settings) -> Result<()> {
        let user = UserId::new(self.user.clone());

        if let Commands::Init = self.command {
            LedgerService::init(&settings.database).await?;
            println!("Database initialized: {}", settings.database);
            return Ok(());
        }

        let service = LedgerService::connect(&settings.database)
            .await?
            .with_overdraft_policy(settings.overdraft);

        match self.command {
            Commands::Init => {}
            Commands::Wallet(cmd) => run_wallet_command(&service, &user, cmd).await?,
            Commands::Category(cmd) => run_category_command(&service, &user, cmd).await?,
            Commands::Expense(cmd) => {
                run_movement_command(&service, &user, MovementKind::Expense, cmd).await?
            }
            Commands::Income(cmd) => {
                run_movement_command(&service, &user, MovementKind::Income, cmd).await?
            }
            Commands::Transfer(cmd) => run_transfer_command(&service, &user, cmd).await?,
            Commands::Feed {
                year,
                month,
                transaction_type,
                json,
            } => run_feed_command(&service, &user, year, month, &transaction_type, json).await?,
        }

        Ok(())
    }
}

async fn run_wallet_command(
    service: &LedgerService,
    user: &UserId,
    cmd: WalletCommands,
) -> Result<()> {
    match cmd {
        WalletCommands::Create {
            title,
            balance,
            color,
        } => {
            let balance = parse_amount(&balance)?;
            let wallet = service.create_wallet(user, title, balance, color).await?;
            println!(
                "Created wallet: {} ({}) {}",
                wallet.title,
                wallet.id,
                format_cents(wallet.balance)
            );
        }

        WalletCommands::List => {
            let wallets = service.list_wallets(user).await?;
            if wallets.is_empty() {
                println!("No wallets found.");
            } else {
                println!("{:<24} {:>14} {:<8}", "TITLE", "BALANCE", "COLOR");
                println!("{}", "-".repeat(48));
                for wallet in wallets {
                    println!(
                        "{:<24} {:>14} {:<8}",
                        truncate(&wallet.title, 24),
                        format_cents(wallet.balance),
                        wallet.color
                    );
                }
            }
        }

        WalletCommands::Show { wallet } => {
            let id = resolve_wallet(service, user, &wallet).await?;
            let wallet = service.get_wallet(user, id).await?;
            println!("Wallet: {}", wallet.title);
            println!("  ID:      {}", wallet.id);
            println!("  Balance: {}", format_cents(wallet.balance));
            println!("  Color:   {}", wallet.color);
            println!(
                "  Created: {}",
                wallet.created_at.format("%Y-%m-%d %H:%M:%S")
            );
        }

        WalletCommands::Update {
            wallet,
            title,
            color,
        } => {
            let id = resolve_wallet(service, user, &wallet).await?;
            let wallet = service
                .update_wallet(user, id, WalletUpdate { title, color })
                .await?;
            println!("Updated wallet: {} ({})", wallet.title, wallet.color);
        }

        WalletCommands::Delete { wallet } => {
            let id = resolve_wallet(service, user, &wallet).await?;
            let wallet = service.delete_wallet(user, id).await?;
            println!("Deleted wallet: {}", wallet.title);
        }

        WalletCommands::Deposit { wallet, amount } => {
            let id = resolve_wallet(service, user, &wallet).await?;
            let wallet = service.deposit(user, id, parse_amount(&amount)?).await?;
            println!(
                "Deposited into {}: balance {}",
                wallet.title,
                format_cents(wallet.balance)
            );
        }

        WalletCommands::Withdraw { wallet, amount } => {
            let id = resolve_wallet(service, user, &wallet).await?;
            let wallet = service.withdraw(user, id, parse_amount(&amount)?).await?;
            println!(
                "Withdrew from {}: balance {}",
                wallet.title,
                format_cents(wallet.balance)
            );
        }
    }
    Ok(())
}

async fn run_category_command(
    service: &LedgerService,
    user: &UserId,
    cmd: CategoryCommands,
) -> Result<()> {
    match cmd {
        CategoryCommands::Create {
            kind,
            title,
            description,
            color,
        } => {
            let category = service
                .create_category(user, kind.into(), title, description, color)
                .await?;
            println!(
                "Created {} category: {} ({})",
                category.kind, category.title, category.id
            );
        }

        CategoryCommands::List { kind } => {
            let categories = service.list_categories(user, kind.into()).await?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:<24} {:<10} {}", "TITLE", "COLOR", "DESCRIPTION");
                println!("{}", "-".repeat(60));
                for category in categories {
                    println!(
                        "{:<24} {:<10} {}",
                        truncate(&category.title, 24),
                        category.color_code,
                        category.description.as_deref().unwrap_or("")
                    );
                }
            }
        }

        CategoryCommands::Update {
            kind,
            category,
            title,
            description,
            color,
        } => {
            let id = resolve_category(service, user, kind.into(), &category).await?;
            let update = CategoryUpdate {
                title,
                description,
                color_code: color,
            };
            let category = service
                .update_category(user, kind.into(), id, update)
                .await?;
            println!("Updated category: {}", category.title);
        }

        CategoryCommands::Delete { kind, category } => {
            let id = resolve_category(service, user, kind.into(), &category).await?;
            let category = service.delete_category(user, kind.into(), id).await?;
            println!("Deleted category: {}", category.title);
        }
    }
    Ok(())
}

async fn run_movement_command(
    service: &LedgerService,
    user: &UserId,
    kind: MovementKind,
    cmd: MovementCommands,
) -> Result<()> {
    match cmd {
        MovementCommands::Add { amount, fields } => {
            let mut new = NewMovement::new(
                parse_amount(&amount)?,
                fields
                    .date
                    .as_deref()
                    .map(parse_date)
                    .transpose()?
                    .unwrap_or_else(today),
            );
            new.title = fields.title;
            new.description = fields.description;
            new.category = resolve_optional_category(service, user, kind, fields.category).await?;
            new.wallet = resolve_optional_wallet(service, user, fields.wallet).await?;

            let movement = service.create_movement(user, kind, new).await?;
            println!(
                "Recorded {}: {} {} ({})",
                kind,
                movement.display_title(),
                format_cents(movement.amount),
                movement.id
            );
        }

        MovementCommands::List {
            title,
            start_date,
            end_date,
            category,
            date_filter,
        } => {
            let filter = MovementFilter {
                title,
                start_date: start_date.as_deref().map(parse_date).transpose()?,
                end_date: end_date.as_deref().map(parse_date).transpose()?,
                category: resolve_optional_category(service, user, kind, category).await?,
                date_filter: date_filter
                    .as_deref()
                    .map(str::parse::<DateFilter>)
                    .transpose()?,
            };
            let movements = service.list_movements(user, kind, &filter).await?;
            print_movements(&movements);
        }

        MovementCommands::Show { id } => {
            let movement = service.get_movement(user, kind, parse_id(&id)?).await?;
            println!("{}: {}", kind, movement.display_title());
            println!("  ID:          {}", movement.id);
            println!("  Date:        {}", movement.date);
            println!("  Amount:      {}", format_cents(movement.amount));
            if let Some(description) = &movement.description {
                println!("  Description: {}", description);
            }
            if let Some(category) = movement.category {
                println!("  Category:    {}", category);
            }
            if let Some(wallet) = movement.wallet {
                println!("  Wallet:      {}", wallet);
            }
        }

        MovementCommands::Update { id, amount, fields } => {
            let update = MovementUpdate {
                title: fields.title,
                description: fields.description,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                date: fields.date.as_deref().map(parse_date).transpose()?,
                category: resolve_optional_category(service, user, kind, fields.category).await?,
                wallet: resolve_optional_wallet(service, user, fields.wallet).await?,
            };
            let movement = service
                .update_movement(user, kind, parse_id(&id)?, update)
                .await?;
            println!(
                "Updated {}: {} {}",
                kind,
                movement.display_title(),
                format_cents(movement.amount)
            );
        }

        MovementCommands::Delete { id } => {
            let movement = service
                .delete_movement(user, kind, parse_id(&id)?)
                .await?;
            println!(
                "Deleted {}: {} {}",
                kind,
                movement.display_title(),
                format_cents(movement.amount)
            );
        }
    }
    Ok(())
}

fn print_movements(movements: &[Movement]) {
    if movements.is_empty() {
        println!("No entries found.");
        return;
    }
    println!("{:<10} {:<24} {:>12} {:<36}", "DATE", "TITLE", "AMOUNT", "ID");
    println!("{}", "-".repeat(85));
    for movement in movements {
        println!(
            "{:<10} {:<24} {:>12} {:<36}",
            movement.date,
            truncate(movement.display_title(), 24),
            format_cents(movement.amount),
            movement.id
        );
    }
}

async fn run_transfer_command(
    service: &LedgerService,
    user: &UserId,
    cmd: TransferCommands,
) -> Result<()> {
    match cmd {
        TransferCommands::Create {
            amount,
            from,
            to,
            description,
            date,
        } => {
            let source = resolve_wallet(service, user, &from).await?;
            let destination = resolve_wallet(service, user, &to).await?;
            let date = date
                .as_deref()
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(today);

            let transfer = service
                .create_transfer(
                    user,
                    source,
                    destination,
                    parse_amount(&amount)?,
                    date,
                    description,
                )
                .await?;
            println!(
                "Recorded transfer: {} {} -> {} ({})",
                format_cents(transfer.amount),
                from,
                to,
                transfer.id
            );
        }

        TransferCommands::List => {
            let transfers = service.list_transfers(user).await?;
            if transfers.is_empty() {
                println!("No transfers found.");
            } else {
                let titles = wallet_titles(service, user).await?;
                println!(
                    "{:<10} {:<16} {:<16} {:>12} {:<36}",
                    "DATE", "FROM", "TO", "AMOUNT", "ID"
                );
                println!("{}", "-".repeat(94));
                for transfer in transfers {
                    println!(
                        "{:<10} {:<16} {:<16} {:>12} {:<36}",
                        transfer.date,
                        truncate(&wallet_label(&titles, transfer.source_wallet), 16),
                        truncate(&wallet_label(&titles, transfer.destination_wallet), 16),
                        format_cents(transfer.amount),
                        transfer.id
                    );
                }
            }
        }

        TransferCommands::Show { id } => {
            let transfer = service.get_transfer(user, parse_id(&id)?).await?;
            let titles = wallet_titles(service, user).await?;
            println!("Transfer: {}", transfer.id);
            println!("  Date:        {}", transfer.date);
            println!("  Amount:      {}", format_cents(transfer.amount));
            println!(
                "  From:        {}",
                wallet_label(&titles, transfer.source_wallet)
            );
            println!(
                "  To:          {}",
                wallet_label(&titles, transfer.destination_wallet)
            );
            if let Some(description) = &transfer.description {
                println!("  Description: {}", description);
            }
        }

        TransferCommands::Update {
            id,
            amount,
            description,
            date,
        } => {
            let update = TransferUpdate {
                amount: amount.as_deref().map(parse_amount).transpose()?,
                description,
                date: date.as_deref().map(parse_date).transpose()?,
            };
            let transfer = service
                .update_transfer(user, parse_id(&id)?, update)
                .await?;
            println!(
                "Updated transfer {}: {}",
                transfer.id,
                format_cents(transfer.amount)
            );
        }

        TransferCommands::Delete { id } => {
            let transfer = service.delete_transfer(user, parse_id(&id)?).await?;
            println!(
                "Deleted transfer {}: {} moved back",
                transfer.id,
                format_cents(transfer.amount)
            );
        }
    }
    Ok(())
}

async fn run_feed_command(
    service: &LedgerService,
    user: &UserId,
    year: i32,
    month: Option<u32>,
    transaction_type: &str,
    json: bool,
) -> Result<()> {
    let transaction_type: TransactionType = transaction_type.parse()?;
    let feed = service
        .transaction_feed(user, year, month, transaction_type)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&feed)?);
        return Ok(());
    }

    if feed.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    for group in feed.iter() {
        println!("{}  {:>12}", group.date, format_cents(group.amount));
        for entry in &group.transactions {
            let sign = match entry {
                FeedEntry::Expense(_) => "-",
                FeedEntry::Income(_) => "+",
                FeedEntry::Transfer(_) => " ",
            };
            println!(
                "    {:<9} {:<40} {}{:>11}",
                entry.transaction_type().as_str(),
                truncate(entry.title(), 40),
                sign,
                format_cents(entry.amount())
            );
        }
    }
    println!("{}", "-".repeat(68));
    println!("Net: {}", format_cents(feed.total()));
    Ok(())
}

// ========================
// Argument helpers
// ========================

fn parse_amount(input: &str) -> Result<i64> {
    parse_cents(input).context("Invalid amount format. Use '50.00' or '50'")
}

fn parse_id(input: &str) -> Result<Uuid> {
    Uuid::parse_str(input.trim()).context("Invalid ID format (expected UUID)")
}

/// Accept a wallet ID or its exact title.
async fn resolve_wallet(service: &LedgerService, user: &UserId, input: &str) -> Result<WalletId> {
    if let Ok(id) = Uuid::parse_str(input.trim()) {
        return Ok(id);
    }
    service
        .list_wallets(user)
        .await?
        .into_iter()
        .find(|w| w.title == input.trim())
        .map(|w| w.id)
        .with_context(|| format!("Wallet not found: {}", input))
}

async fn resolve_optional_wallet(
    service: &LedgerService,
    user: &UserId,
    input: Option<String>,
) -> Result<Option<WalletId>> {
    match input {
        Some(input) => Ok(Some(resolve_wallet(service, user, &input).await?)),
        None => Ok(None),
    }
}

/// Accept a category ID or its exact title.
async fn resolve_category(
    service: &LedgerService,
    user: &UserId,
    kind: CategoryKind,
    input: &str,
) -> Result<CategoryId> {
    if let Ok(id) = Uuid::parse_str(input.trim()) {
        return Ok(id);
    }
    service
        .list_categories(user, kind)
        .await?
        .into_iter()
        .find(|c| c.title == input.trim())
        .map(|c| c.id)
        .with_context(|| format!("Category not found: {}", input))
}

async fn resolve_optional_category(
    service: &LedgerService,
    user: &UserId,
    kind: MovementKind,
    input: Option<String>,
) -> Result<Option<CategoryId>> {
    match input {
        Some(input) => Ok(Some(
            resolve_category(service, user, kind.category_kind(), &input).await?,
        )),
        None => Ok(None),
    }
}

async fn wallet_titles(
    service: &LedgerService,
    user: &UserId,
) -> Result<std::collections::HashMap<WalletId, String>> {
    Ok(service
        .list_wallets(user)
        .await?
        .into_iter()
        .map(|w| (w.id, w.title))
        .collect())
}

fn wallet_label(
    titles: &std::collections::HashMap<WalletId, String>,
    wallet: Option<WalletId>,
) -> String {
    wallet
        .and_then(|id| titles.get(&id).cloned())
        .unwrap_or_else(|| "(deleted)".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
