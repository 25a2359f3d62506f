use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Popup,
    Banner,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::Popup => "popup",
            OfferType::Banner => "banner",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "banner" => OfferType::Banner,
            _ => OfferType::Popup,
        }
    }
}
