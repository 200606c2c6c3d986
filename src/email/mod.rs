//! Notification mailbox ingestion.
//!
//! Reads IFTTT-style notification emails from an IMAP inbox, pulls the single
//! `via ... https://...` link out of each body, resolves it through its
//! redirect chain and turns the message into a [`NewItem`]. Messages are only
//! removed from the inbox after the caller confirms delivery.

mod imap_mailbox;

pub use imap_mailbox::ImapMailbox;

use std::sync::LazyLock;

use async_trait::async_trait;
use mailparse::{MailHeaderMap, ParsedMail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::{FeedPocketError, Result};
use crate::domain::NewItem;
use crate::fetcher::Fetcher;

/// Notifications converted per run; the rest wait for the next run.
pub const MAX_ITEMS_PER_RUN: usize = 30;

pub const EMAIL_TAG: &str = "email";

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^via .+ (https://[^\r\n]*)[\s]*$").expect("valid notification link pattern")
});

/// `[email]` section. An empty `server` disables the mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// `host:port`; port 993 is assumed when omitted.
    pub server: String,
    pub username: String,
    pub app_password: String,
}

impl EmailConfig {
    pub fn is_enabled(&self) -> bool {
        !self.server.trim().is_empty()
    }

    pub fn host(&self) -> &str {
        let server = self.server.trim();
        match server.rsplit_once(':') {
            Some((host, port)) if port.parse::<u16>().is_ok() => host,
            _ => server,
        }
    }

    pub fn address(&self) -> String {
        let server = self.server.trim();
        if server.len() == self.host().len() {
            format!("{}:993", server)
        } else {
            server.to_string()
        }
    }
}

/// A message as stored on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub uid: u32,
    pub raw: Vec<u8>,
}

/// What a notification email says, before the link is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message_id: String,
    pub subject: String,
    pub time: Option<i64>,
    pub link: String,
}

/// A converted message, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub uid: u32,
    pub item: NewItem,
}

#[async_trait]
pub trait Mailbox {
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>>;

    /// Flag the given messages deleted and expunge them.
    async fn archive(&self, uids: &[u32]) -> Result<()>;
}

/// Parse a raw RFC 822 message into a [`Notification`].
pub fn parse_notification(raw: &[u8]) -> Result<Notification> {
    let mail = mailparse::parse_mail(raw)
        .map_err(|e| FeedPocketError::Mailbox(format!("parsing email body: {}", e)))?;

    let part = text_part(&mail).ok_or_else(|| {
        FeedPocketError::Mailbox(format!(
            "unsupported email content type: {}",
            mail.ctype.mimetype
        ))
    })?;
    debug!(kind = %part.ctype.mimetype, "Reading text part");

    let body = part
        .get_body()
        .map_err(|e| FeedPocketError::Mailbox(format!("decoding email body: {}", e)))?;
    let link = extract_link(&body)
        .ok_or_else(|| FeedPocketError::Mailbox("no IFTTT link in the body".into()))?;

    let headers = mail.get_headers();
    let time = headers
        .get_first_value("Date")
        .and_then(|date| mailparse::dateparse(&date).ok());

    Ok(Notification {
        message_id: headers.get_first_value("Message-ID").unwrap_or_default(),
        subject: headers.get_first_value("Subject").unwrap_or_default(),
        time,
        link,
    })
}

/// The URL following a `via <service> ` line prefix.
pub fn extract_link(body: &str) -> Option<String> {
    LINK_PATTERN
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().to_string())
}

fn text_part<'a, 'b>(mail: &'b ParsedMail<'a>) -> Option<&'b ParsedMail<'a>> {
    if mail.subparts.is_empty() {
        let kind = mail.ctype.mimetype.as_str();
        (kind == "text/plain" || kind == "text/html").then_some(mail)
    } else {
        mail.subparts.iter().find_map(|part| text_part(part))
    }
}

/// Fetch and convert notification messages. Messages that cannot be
/// converted are logged and left in the mailbox.
pub async fn collect_notifications(
    mailbox: &(dyn Mailbox + Send + Sync),
    fetcher: &(dyn Fetcher + Send + Sync),
) -> Result<Vec<NotificationItem>> {
    let messages = mailbox.fetch_messages().await?;
    info!(count = messages.len(), "Messages in inbox");

    let mut items = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        if items.len() >= MAX_ITEMS_PER_RUN {
            debug!(remaining = messages.len() - index, "Item limit reached");
            break;
        }
        debug!(uid = message.uid, "read item {}/{}", index + 1, messages.len());

        let notification = match parse_notification(&message.raw) {
            Ok(notification) => notification,
            Err(e) => {
                warn!(uid = message.uid, "Error while converting email: {}", e);
                continue;
            }
        };
        debug!(url = %notification.link, subject = %notification.subject, "IFTTT url");

        let url = match fetcher.resolve(&notification.link).await {
            Ok(url) => url,
            Err(e) => {
                warn!(uid = message.uid, "Failed to follow IFTTT url: {}", e);
                continue;
            }
        };
        debug!(url = %url, "Final url");

        let id = if notification.message_id.is_empty() {
            url.clone()
        } else {
            notification.message_id
        };
        items.push(NotificationItem {
            uid: message.uid,
            item: NewItem {
                id,
                url,
                title: notification.subject,
                time: notification.time,
                tags: vec![EMAIL_TAG.to_string()],
                body: String::new(),
            },
        });
    }

    Ok(items)
}
