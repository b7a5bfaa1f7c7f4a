//! Column lists and row decoding shared by [`Repository`](super::Repository)
//! and [`UnitOfWork`](super::UnitOfWork).

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::domain::{
    Category, CategoryKind, CategorySummary, Movement, MovementKind, Transfer, UserId, Wallet,
    WalletSummary,
};

pub(crate) const WALLET_COLUMNS: &str =
    "id, owner, title, balance, color, created_at, updated_at";

pub(crate) const CATEGORY_COLUMNS: &str =
    "id, kind, owner, title, description, color_code, created_at, updated_at";

pub(crate) const MOVEMENT_COLUMNS: &str =
    "m.id AS id, m.kind AS kind, m.owner AS owner, m.title AS title, \
     m.description AS description, m.amount AS amount, m.date AS date, \
     m.category_id AS category_id, m.wallet_id AS wallet_id, \
     m.created_at AS created_at, m.updated_at AS updated_at";

pub(crate) const TRANSFER_COLUMNS: &str = "t.id AS id, t.owner AS owner, \
     t.source_wallet_id AS source_wallet_id, t.destination_wallet_id AS destination_wallet_id, \
     t.amount AS amount, t.description AS description, t.date AS date, \
     t.created_at AS created_at, t.updated_at AS updated_at";

pub(crate) fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid {} ID: {}", what, value))
}

fn parse_optional_uuid(value: Option<String>, what: &str) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(&v, what)).transpose()
}

fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid {} timestamp", what))?
        .with_timezone(&Utc))
}

fn parse_stored_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid stored date: {}", value))
}

pub(crate) fn row_to_wallet(row: &SqliteRow) -> Result<Wallet> {
    let id_str: String = row.get("id");
    let owner: String = row.get("owner");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Wallet {
        id: parse_uuid(&id_str, "wallet")?,
        owner: UserId::new(owner),
        title: row.get("title"),
        balance: row.get("balance"),
        color: row.get("color"),
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

pub(crate) fn row_to_category(row: &SqliteRow) -> Result<Category> {
    let id_str: String = row.get("id");
    let kind_str: String = row.get("kind");
    let owner: String = row.get("owner");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Category {
        id: parse_uuid(&id_str, "category")?,
        kind: CategoryKind::from_str(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid category kind: {}", kind_str))?,
        owner: UserId::new(owner),
        title: row.get("title"),
        description: row.get("description"),
        color_code: row.get("color_code"),
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

pub(crate) fn row_to_movement(row: &SqliteRow) -> Result<Movement> {
    let id_str: String = row.get("id");
    let kind_str: String = row.get("kind");
    let owner: String = row.get("owner");
    let date_str: String = row.get("date");
    let category_str: Option<String> = row.get("category_id");
    let wallet_str: Option<String> = row.get("wallet_id");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Movement {
        id: parse_uuid(&id_str, "movement")?,
        kind: MovementKind::from_str(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid movement kind: {}", kind_str))?,
        owner: UserId::new(owner),
        title: row.get("title"),
        description: row.get("description"),
        amount: row.get("amount"),
        date: parse_stored_date(&date_str)?,
        category: parse_optional_uuid(category_str, "category")?,
        wallet: parse_optional_uuid(wallet_str, "wallet")?,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

pub(crate) fn row_to_transfer(row: &SqliteRow) -> Result<Transfer> {
    let id_str: String = row.get("id");
    let owner: String = row.get("owner");
    let source_str: Option<String> = row.get("source_wallet_id");
    let destination_str: Option<String> = row.get("destination_wallet_id");
    let date_str: String = row.get("date");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Transfer {
        id: parse_uuid(&id_str, "transfer")?,
        owner: UserId::new(owner),
        source_wallet: parse_optional_uuid(source_str, "source wallet")?,
        destination_wallet: parse_optional_uuid(destination_str, "destination wallet")?,
        amount: row.get("amount"),
        description: row.get("description"),
        date: parse_stored_date(&date_str)?,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

/// Category summary from a joined feed row, if the category still exists.
pub(crate) fn joined_category(row: &SqliteRow, movement: &Movement) -> Option<CategorySummary> {
    let title: Option<String> = row.get("category_title");
    let color_code: Option<String> = row.get("category_color");
    match (movement.category, title, color_code) {
        (Some(id), Some(title), Some(color_code)) => Some(CategorySummary {
            id,
            title,
            color_code,
        }),
        _ => None,
    }
}

/// Wallet summary from a joined feed row, if the wallet still exists.
pub(crate) fn joined_wallet(
    row: &SqliteRow,
    id: Option<Uuid>,
    title_column: &str,
) -> Option<WalletSummary> {
    let title: Option<String> = row.get(title_column);
    match (id, title) {
        (Some(id), Some(title)) => Some(WalletSummary { id, title }),
        _ => None,
    }
}
