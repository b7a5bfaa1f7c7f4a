//! Expense and income lifecycle.
//!
//! Both kinds follow the same steps: resolve references, plan the ledger
//! effect, apply it and persist the record inside one unit of work.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::domain::{
    Binding, CategoryId, Cents, Movement, MovementFilter, MovementId, MovementKind, UserId,
    WalletId, clean_text, plan_movement_create, plan_movement_delete, plan_movement_update,
};
use crate::storage::UnitOfWork;

use super::service::find_wallet;
use super::{AppError, LedgerService};

/// Fields for a new expense or income.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Cents,
    pub date: NaiveDate,
    pub category: Option<CategoryId>,
    pub wallet: Option<WalletId>,
}

impl NewMovement {
    pub fn new(amount: Cents, date: NaiveDate) -> Self {
        Self {
            title: None,
            description: None,
            amount,
            date,
            category: None,
            wallet: None,
        }
    }
}

/// Partial update of an expense or income. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct MovementUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Cents>,
    pub date: Option<NaiveDate>,
    pub category: Option<CategoryId>,
    pub wallet: Option<WalletId>,
}

fn not_found(kind: MovementKind, id: MovementId) -> AppError {
    match kind {
        MovementKind::Expense => AppError::ExpenseNotFound(id.to_string()),
        MovementKind::Income => AppError::IncomeNotFound(id.to_string()),
    }
}

async fn resolve_category(
    uow: &mut UnitOfWork,
    user: &UserId,
    kind: MovementKind,
    id: CategoryId,
) -> Result<(), AppError> {
    uow.find_category(user, kind.category_kind(), id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))
}

impl LedgerService {
    /// Record an expense or income and apply its effect to the wallet.
    pub async fn create_movement(
        &self,
        user: &UserId,
        kind: MovementKind,
        new: NewMovement,
    ) -> Result<Movement, AppError> {
        let movement = Movement::new(kind, user.clone(), new.amount, new.date)
            .with_title(clean_text(new.title))
            .with_description(clean_text(new.description))
            .with_category(new.category)
            .with_wallet(new.wallet);
        movement.validate()?;

        let mut uow = self.repo.begin().await?;
        if let Some(category) = movement.category {
            resolve_category(&mut uow, user, kind, category).await?;
        }
        if let Some(wallet) = movement.wallet {
            find_wallet(&mut uow, user, wallet).await?;
        }

        let ops = plan_movement_create(kind, Binding::new(movement.wallet, movement.amount));
        self.apply_ops(&mut uow, &ops).await?;
        uow.insert_movement(&movement).await?;
        uow.commit().await?;

        info!(
            %kind,
            id = %movement.id,
            amount = movement.amount,
            wallet = ?movement.wallet,
            "movement created"
        );
        Ok(movement)
    }

    /// Apply a partial update, moving the ledger effect along with it.
    pub async fn update_movement(
        &self,
        user: &UserId,
        kind: MovementKind,
        id: MovementId,
        update: MovementUpdate,
    ) -> Result<Movement, AppError> {
        let mut uow = self.repo.begin().await?;
        let mut movement = uow
            .find_movement(user, kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))?;
        let before = Binding::new(movement.wallet, movement.amount);

        if let Some(title) = update.title {
            movement.title = clean_text(Some(title));
        }
        if let Some(description) = update.description {
            movement.description = clean_text(Some(description));
        }
        if let Some(amount) = update.amount {
            movement.amount = amount;
        }
        if let Some(date) = update.date {
            movement.date = date;
        }
        if let Some(category) = update.category {
            resolve_category(&mut uow, user, kind, category).await?;
            movement.category = Some(category);
        }
        if let Some(wallet) = update.wallet {
            find_wallet(&mut uow, user, wallet).await?;
            movement.wallet = Some(wallet);
        }
        movement.validate()?;

        let after = Binding::new(movement.wallet, movement.amount);
        let ops = plan_movement_update(kind, before, after);
        self.apply_ops(&mut uow, &ops).await?;

        movement.updated_at = Utc::now();
        uow.update_movement(&movement).await?;
        uow.commit().await?;

        info!(
            %kind,
            id = %movement.id,
            amount = movement.amount,
            wallet = ?movement.wallet,
            adjustments = ops.len(),
            "movement updated"
        );
        Ok(movement)
    }

    /// Reverse the record's effect and remove it.
    pub async fn delete_movement(
        &self,
        user: &UserId,
        kind: MovementKind,
        id: MovementId,
    ) -> Result<Movement, AppError> {
        let mut uow = self.repo.begin().await?;
        let movement = uow
            .find_movement(user, kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        let ops = plan_movement_delete(kind, Binding::new(movement.wallet, movement.amount));
        self.apply_ops(&mut uow, &ops).await?;
        uow.delete_movement(movement.id).await?;
        uow.commit().await?;

        info!(%kind, id = %movement.id, amount = movement.amount, "movement deleted");
        Ok(movement)
    }

    pub async fn get_movement(
        &self,
        user: &UserId,
        kind: MovementKind,
        id: MovementId,
    ) -> Result<Movement, AppError> {
        self.repo
            .get_movement(user, kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    /// List records of one kind, newest first.
    pub async fn list_movements(
        &self,
        user: &UserId,
        kind: MovementKind,
        filter: &MovementFilter,
    ) -> Result<Vec<Movement>, AppError> {
        let today = Utc::now().date_naive();
        Ok(self.repo.list_movements(user, kind, filter, today).await?)
    }

    // Kind-specific entry points

    pub async fn create_expense(
        &self,
        user: &UserId,
        new: NewMovement,
    ) -> Result<Movement, AppError> {
        self.create_movement(user, MovementKind::Expense, new).await
    }

    pub async fn update_expense(
        &self,
        user: &UserId,
        id: MovementId,
        update: MovementUpdate,
    ) -> Result<Movement, AppError> {
        self.update_movement(user, MovementKind::Expense, id, update)
            .await
    }

    pub async fn delete_expense(
        &self,
        user: &UserId,
        id: MovementId,
    ) -> Result<Movement, AppError> {
        self.delete_movement(user, MovementKind::Expense, id).await
    }

    pub async fn create_income(
        &self,
        user: &UserId,
        new: NewMovement,
    ) -> Result<Movement, AppError> {
        self.create_movement(user, MovementKind::Income, new).await
    }

    pub async fn update_income(
        &self,
        user: &UserId,
        id: MovementId,
        update: MovementUpdate,
    ) -> Result<Movement, AppError> {
        self.update_movement(user, MovementKind::Income, id, update)
            .await
    }

    pub async fn delete_income(&self, user: &UserId, id: MovementId) -> Result<Movement, AppError> {
        self.delete_movement(user, MovementKind::Income, id).await
    }
}
