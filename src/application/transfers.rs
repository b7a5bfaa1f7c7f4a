use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::domain::{
    Cents, Transfer, TransferId, UserId, WalletId, clean_text, plan_transfer,
    plan_transfer_reversal, plan_transfer_update,
};

use super::service::{check_positive, find_wallet};
use super::{AppError, LedgerService};

/// Partial transfer update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TransferUpdate {
    pub amount: Option<Cents>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

fn warn_if_detached(transfer: &Transfer, action: &str) {
    if transfer.is_detached() {
        warn!(
            id = %transfer.id,
            source = ?transfer.source_wallet,
            destination = ?transfer.destination_wallet,
            action,
            "transfer references a deleted wallet; skipping that side"
        );
    }
}

impl LedgerService {
    /// Move money between two of the user's wallets and record it.
    pub async fn create_transfer(
        &self,
        user: &UserId,
        source: WalletId,
        destination: WalletId,
        amount: Cents,
        date: NaiveDate,
        description: Option<String>,
    ) -> Result<Transfer, AppError> {
        check_positive(amount)?;

        let mut uow = self.repo.begin().await?;
        find_wallet(&mut uow, user, source).await?;
        find_wallet(&mut uow, user, destination).await?;
        if source == destination {
            return Err(AppError::SameWalletTransfer);
        }

        let transfer = Transfer::new(user.clone(), source, destination, amount, date)
            .with_description(clean_text(description));

        let ops = plan_transfer(transfer.source_wallet, transfer.destination_wallet, amount);
        self.apply_ops(&mut uow, &ops).await?;
        uow.insert_transfer(&transfer).await?;
        uow.commit().await?;

        info!(id = %transfer.id, %source, %destination, amount, "transfer created");
        Ok(transfer)
    }

    /// Change amount, description or date. Only an amount change touches
    /// the wallets: the old amount is moved back, then the new one applied.
    pub async fn update_transfer(
        &self,
        user: &UserId,
        id: TransferId,
        update: TransferUpdate,
    ) -> Result<Transfer, AppError> {
        if let Some(amount) = update.amount {
            check_positive(amount)?;
        }

        let mut uow = self.repo.begin().await?;
        let mut transfer = uow
            .find_transfer(user, id)
            .await?
            .ok_or_else(|| AppError::TransferNotFound(id.to_string()))?;

        if let Some(amount) = update.amount {
            let ops = plan_transfer_update(
                transfer.source_wallet,
                transfer.destination_wallet,
                transfer.amount,
                amount,
            );
            if !ops.is_empty() {
                warn_if_detached(&transfer, "update");
            }
            self.apply_ops(&mut uow, &ops).await?;
            transfer.amount = amount;
        }
        if let Some(description) = update.description {
            transfer.description = clean_text(Some(description));
        }
        if let Some(date) = update.date {
            transfer.date = date;
        }

        transfer.updated_at = Utc::now();
        uow.update_transfer(&transfer).await?;
        uow.commit().await?;

        info!(id = %transfer.id, amount = transfer.amount, "transfer updated");
        Ok(transfer)
    }

    /// Move the amount back from destination to source and remove the record.
    pub async fn delete_transfer(
        &self,
        user: &UserId,
        id: TransferId,
    ) -> Result<Transfer, AppError> {
        let mut uow = self.repo.begin().await?;
        let transfer = uow
            .find_transfer(user, id)
            .await?
            .ok_or_else(|| AppError::TransferNotFound(id.to_string()))?;

        warn_if_detached(&transfer, "delete");
        let ops = plan_transfer_reversal(
            transfer.source_wallet,
            transfer.destination_wallet,
            transfer.amount,
        );
        self.apply_ops(&mut uow, &ops).await?;
        uow.delete_transfer(transfer.id).await?;
        uow.commit().await?;

        info!(id = %transfer.id, amount = transfer.amount, "transfer deleted");
        Ok(transfer)
    }

    pub async fn get_transfer(&self, user: &UserId, id: TransferId) -> Result<Transfer, AppError> {
        self.repo
            .get_transfer(user, id)
            .await?
            .ok_or_else(|| AppError::TransferNotFound(id.to_string()))
    }

    /// All transfers of the user, newest first.
    pub async fn list_transfers(&self, user: &UserId) -> Result<Vec<Transfer>, AppError> {
        Ok(self.repo.list_transfers(user).await?)
    }
}
