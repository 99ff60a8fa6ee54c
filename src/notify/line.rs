//! LINE Messaging API push notifications.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{ChangeReport, Item, ItemKind, NotifyConfig};
use crate::notify::Notifier;
use crate::utils::truncate_chars;

const PUSH_API_URL: &str = "https://api.line.me/v2/bot/message/push";

/// Longest text message the push API accepts.
pub const MAX_MESSAGE_CHARS: usize = 5000;

const TRUNCATION_NOTICE: &str = "\n...\n(文字数制限のため省略されました)";
const MAX_ITEMS_PER_KIND: usize = 3;
const MAX_LISTED_TITLE_CHARS: usize = 80;
const RULE: &str = "━━━━━━━━━━━━━━━━━━";

/// Kinds in the order they are listed in a message.
const KIND_ORDER: [ItemKind; 4] = [
    ItemKind::Heading,
    ItemKind::Banner,
    ItemKind::Link,
    ItemKind::Paragraph,
];

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Heading => "📌 見出し",
        ItemKind::Banner => "📢 バナー",
        ItemKind::Link => "🔗 リンク",
        ItemKind::Paragraph => "📝 本文",
    }
}

/// Cut `text` to the push API limit, appending a notice when shortened.
pub fn truncate_message(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return Cow::Borrowed(text);
    }
    let keep = MAX_MESSAGE_CHARS - TRUNCATION_NOTICE.chars().count();
    Cow::Owned(format!("{}{}", truncate_chars(text, keep), TRUNCATION_NOTICE))
}

/// Plain-text message listing new items grouped by kind.
pub fn format_changes(items: &[Item], detected_at: &str) -> String {
    let mut lines = vec![RULE.to_string(), "🎮 新着情報を検出しました".to_string(), RULE.to_string()];

    for kind in KIND_ORDER {
        let of_kind: Vec<&Item> = items.iter().filter(|i| i.kind == kind).collect();
        if of_kind.is_empty() {
            continue;
        }

        lines.push(String::new());
        lines.push(kind_label(kind).to_string());
        for item in of_kind.iter().take(MAX_ITEMS_PER_KIND) {
            lines.push(format!(
                "・{}",
                truncate_chars(item.title.trim(), MAX_LISTED_TITLE_CHARS)
            ));
            lines.push(format!("  {}", item.url));
        }
        if of_kind.len() > MAX_ITEMS_PER_KIND {
            lines.push(format!("  ...他 {}件", of_kind.len() - MAX_ITEMS_PER_KIND));
        }
    }

    lines.push(String::new());
    lines.push(RULE.to_string());
    lines.push(format!("検出時刻: {detected_at}"));
    lines.push(format!("検出総数: {}件", items.len()));
    lines.join("\n")
}

fn format_error(message: &str, occurred_at: &str) -> String {
    let body: Vec<String> = message
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("  {l}"))
        .collect();
    format!(
        "{RULE}\n⚠️ 監視でエラーが発生しました\n{RULE}\n{}\n\n発生時刻: {occurred_at}",
        body.join("\n")
    )
}

fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Sends plain-text pushes to a single LINE user or group.
pub struct LineNotifier {
    client: reqwest::Client,
    token: String,
    to: String,
}

impl LineNotifier {
    /// Create a notifier. The group id wins over the user id when both are set.
    pub fn new(
        client: reqwest::Client,
        token: impl Into<String>,
        user_id: &str,
        group_id: &str,
    ) -> Result<Self> {
        let to = if group_id.trim().is_empty() {
            user_id.trim()
        } else {
            group_id.trim()
        };
        if to.is_empty() {
            return Err(AppError::config(
                "LINE notifications need line_user_id or line_group_id",
            ));
        }
        Ok(Self {
            client,
            token: token.into(),
            to: to.to_string(),
        })
    }

    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Self::new(
            client,
            &config.line_channel_access_token,
            &config.line_user_id,
            &config.line_group_id,
        )
    }

    async fn send(&self, text: &str) -> Result<()> {
        let text = truncate_message(text);
        if matches!(text, Cow::Owned(_)) {
            log::warn!("Message exceeded {} characters and was truncated", MAX_MESSAGE_CHARS);
        }

        let body = json!({
            "to": self.to,
            "messages": [{ "type": "text", "text": text }],
        });
        let response = self
            .client
            .post(PUSH_API_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(AppError::notify)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                log::error!("LINE rejected the channel access token");
            }
            return Err(AppError::notify(format!(
                "LINE push failed with {status}: {detail}"
            )));
        }

        log::info!("LINE notification sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn notify_changes(&self, report: &ChangeReport) -> Result<()> {
        self.send(&format_changes(&report.new_items, &now())).await
    }

    async fn notify_test(&self) -> Result<()> {
        let message = format!(
            "{RULE}\n✅ テスト通知\n{RULE}\n監視システムは正常に動作しています。\n\n送信時刻: {}",
            now()
        );
        self.send(&message).await
    }

    async fn notify_error(&self, message: &str) -> Result<()> {
        self.send(&format_error(message, &now())).await
    }
}
