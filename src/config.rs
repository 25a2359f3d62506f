use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub admin_user_id: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub vercel_token: String,
    pub vercel_project_id: String,
    pub banner_exclusive: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            admin_user_id: env::var("ADMIN_USER_ID").unwrap_or_else(|_| "admin".to_string()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").unwrap_or_default(),
            vercel_token: env::var("VERCEL_TOKEN").unwrap_or_default(),
            vercel_project_id: env::var("VERCEL_PROJECT_ID").unwrap_or_default(),
            banner_exclusive: env::var("BANNER_EXCLUSIVE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}
