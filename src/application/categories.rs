use chrono::Utc;
use tracing::info;

use crate::domain::{Category, CategoryId, CategoryKind, UserId, clean_text};

use super::{AppError, LedgerService};

/// Partial category update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color_code: Option<String>,
}

impl LedgerService {
    pub async fn create_category(
        &self,
        user: &UserId,
        kind: CategoryKind,
        title: String,
        description: Option<String>,
        color_code: Option<String>,
    ) -> Result<Category, AppError> {
        let mut category =
            Category::new(kind, user.clone(), title).with_description(clean_text(description));
        if let Some(color_code) = clean_text(color_code) {
            category = category.with_color_code(color_code);
        }
        category.validate()?;

        let mut uow = self.repo.begin().await?;
        if uow
            .category_title_taken(user, kind, &category.title, None)
            .await?
        {
            return Err(AppError::CategoryAlreadyExists(category.title));
        }
        uow.insert_category(&category).await?;
        uow.commit().await?;

        info!(%kind, id = %category.id, title = %category.title, "category created");
        Ok(category)
    }

    pub async fn get_category(
        &self,
        user: &UserId,
        kind: CategoryKind,
        id: CategoryId,
    ) -> Result<Category, AppError> {
        self.repo
            .get_category(user, kind, id)
            .await?
            .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))
    }

    pub async fn list_categories(
        &self,
        user: &UserId,
        kind: CategoryKind,
    ) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories(user, kind).await?)
    }

    pub async fn update_category(
        &self,
        user: &UserId,
        kind: CategoryKind,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, AppError> {
        let mut uow = self.repo.begin().await?;
        let mut category = uow
            .find_category(user, kind, id)
            .await?
            .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))?;

        if let Some(title) = update.title {
            category.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            category.description = clean_text(Some(description));
        }
        if let Some(color_code) = update.color_code {
            category.color_code = color_code.trim().to_string();
        }
        category.validate()?;

        if uow
            .category_title_taken(user, kind, &category.title, Some(category.id))
            .await?
        {
            return Err(AppError::CategoryAlreadyExists(category.title));
        }

        category.updated_at = Utc::now();
        uow.update_category(&category).await?;
        uow.commit().await?;

        info!(%kind, id = %category.id, "category updated");
        Ok(category)
    }

    /// Delete a category. Records filed under it become uncategorized.
    pub async fn delete_category(
        &self,
        user: &UserId,
        kind: CategoryKind,
        id: CategoryId,
    ) -> Result<Category, AppError> {
        let mut uow = self.repo.begin().await?;
        let category = uow
            .find_category(user, kind, id)
            .await?
            .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))?;
        uow.delete_category(category.id).await?;
        uow.commit().await?;

        info!(%kind, id = %category.id, "category deleted");
        Ok(category)
    }
}
