use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};

use crate::db::queries;
use crate::models::Notification;
use crate::state::AppState;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn send_message(&self, text: &str) -> anyhow::Result<()>;
}

pub struct TelegramChatProvider {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramChatProvider {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatProvider for TelegramChatProvider {
    async fn send_message(&self, text: &str) -> anyhow::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        self.client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .context("failed to reach Telegram")?
            .error_for_status()
            .context("Telegram API returned error")?;

        Ok(())
    }
}

/// Stands in when no chat credentials are configured.
pub struct NoopChatProvider;

#[async_trait]
impl ChatProvider for NoopChatProvider {
    async fn send_message(&self, _text: &str) -> anyhow::Result<()> {
        tracing::debug!("chat notifications disabled, message dropped");
        Ok(())
    }
}

pub struct BookingSummary {
    pub customer_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub service_title: Option<String>,
}

/// Post-reservation side effects: a chat message to the owner and an entry
/// in the in-app notification feed. Both best-effort — a failure here is
/// logged and swallowed, never bounced back to the customer whose booking
/// already committed.
pub async fn dispatch_booking_notification(state: &AppState, summary: BookingSummary) {
    let date = summary.date.format("%a %d %b").to_string();
    let time = summary.start_time.format("%H:%M").to_string();

    let text = format!(
        "💅 *New booking!*\n\n👤 *Customer:* {}\n📅 *Date:* {}\n⏰ *Time:* {}\n💅 *Service:* {}",
        summary.customer_name,
        date,
        time,
        summary.service_title.as_deref().unwrap_or("unspecified"),
    );

    if let Err(e) = state.chat.send_message(&text).await {
        tracing::warn!(error = %e, "failed to send booking chat notification");
    }

    let notification = Notification {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: state.config.admin_user_id.clone(),
        title: "New booking".to_string(),
        message: format!(
            "{} booked {} at {} ({})",
            summary.customer_name,
            date,
            time,
            summary.service_title.as_deref().unwrap_or("in-store"),
        ),
        is_read: false,
        created_at: Utc::now().naive_utc(),
    };

    let inserted = {
        let db = state.db.lock().unwrap();
        queries::insert_notification(&db, &notification)
    };

    match inserted {
        Ok(()) => {
            // A send error just means nobody is on the live feed right now.
            let _ = state.notify_tx.send(notification);
        }
        Err(e) => tracing::warn!(error = %e, "failed to record booking notification"),
    }
}
