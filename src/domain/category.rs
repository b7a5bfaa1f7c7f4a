use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;
use super::validation::{ValidationError, check_required};

pub type CategoryId = Uuid;

pub const DEFAULT_CATEGORY_COLOR: &str = "#000000";
pub const CATEGORY_TITLE_MAX_LEN: usize = 255;
pub const CATEGORY_COLOR_MAX_LEN: usize = 10;

/// Expense and income categories live in separate namespaces: the same
/// title may exist once per kind for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expense" => Some(CategoryKind::Expense),
            "income" => Some(CategoryKind::Income),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub kind: CategoryKind,
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub color_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(kind: CategoryKind, owner: UserId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            owner,
            title: title.into().trim().to_string(),
            description: None,
            color_code: DEFAULT_CATEGORY_COLOR.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_color_code(mut self, color_code: impl Into<String>) -> Self {
        self.color_code = color_code.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("title", &self.title, CATEGORY_TITLE_MAX_LEN)?;
        check_required("color_code", &self.color_code, CATEGORY_COLOR_MAX_LEN)
    }
}
