use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A treatment offered by the salon. Price and duration are display
/// strings; picking a service never changes the fixed one-hour slot length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: String,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub is_popular: bool,
    pub created_at: NaiveDateTime,
}
