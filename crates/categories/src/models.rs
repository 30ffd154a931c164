use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub is_expense: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub is_expense: bool,
}

#[derive(Deserialize)]
pub struct RawCreateCategoryRequest {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_expense: bool,
}

#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_expense: bool,
}

pub const DEFAULT_ICON: &str = "ic_category_other";

impl CreateCategoryRequest {
    pub fn new(name: String, icon: String, color: String, is_expense: bool) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Category name cannot be empty".to_string());
        }
        if color.trim().is_empty() {
            return Err("Category color cannot be empty".to_string());
        }

        let icon = if icon.trim().is_empty() {
            DEFAULT_ICON.to_string()
        } else {
            icon.trim().to_string()
        };

        Ok(Self {
            name: name.trim().to_string(),
            icon,
            color: color.trim().to_string(),
            is_expense,
        })
    }
}
