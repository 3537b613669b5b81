use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{optional_text, required_text, ValidationError};
use crate::ids::CategoryId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub category_name: String,
    pub category_description: Option<String>,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
}

impl Category {
    pub fn create(id: CategoryId, new: NewCategory, now: DateTime<Utc>) -> Self {
        Self {
            id,
            category_name: new.category_name,
            category_description: new.category_description,
            is_active: true,
            created_date: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub category_name: Option<String>,
    pub category_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub category_name: String,
    pub category_description: Option<String>,
}

impl CreateCategoryRequest {
    pub fn validate(self) -> Result<NewCategory, ValidationError> {
        Ok(NewCategory {
            category_name: required_text(self.category_name, "category_name")?,
            category_description: optional_text(self.category_description),
        })
    }
}
