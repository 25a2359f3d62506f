use serde::{Deserialize, Serialize};

/// Single-row site appearance settings (row id is always 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettings {
    pub hero_bg_url: Option<String>,
}
