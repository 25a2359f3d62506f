use serde::Deserialize;

/// A page view as reported by the public site. Append-only; never read back
/// by this service (charting happens in external tooling).
#[derive(Debug, Clone, Deserialize)]
pub struct SiteVisit {
    pub page_path: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}
