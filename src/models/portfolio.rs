use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: String,
    pub title: Option<String>,
    pub image_url: String,
    pub category: Option<String>,
    pub created_at: NaiveDateTime,
}
