use std::net::TcpStream;

use async_trait::async_trait;
use imap::Session;
use native_tls::{TlsConnector, TlsStream};
use tracing::{debug, info};

use crate::app::{FeedPocketError, Result};
use crate::email::{EmailConfig, Mailbox, RawMessage};

const INBOX: &str = "INBOX";

type ImapSession = Session<TlsStream<TcpStream>>;

/// IMAP over TLS. The `imap` client is blocking, so every operation runs on
/// the blocking thread pool with its own short-lived session.
pub struct ImapMailbox {
    config: EmailConfig,
}

impl ImapMailbox {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    async fn with_session<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ImapSession) -> Result<T> + Send + 'static,
    {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let mut session = connect(&config)?;
            let result = op(&mut session);
            if let Err(e) = session.logout() {
                debug!("IMAP logout failed: {}", e);
            }
            result
        })
        .await
        .map_err(|e| FeedPocketError::Mailbox(format!("mailbox task failed: {}", e)))?
    }
}

fn connect(config: &EmailConfig) -> Result<ImapSession> {
    let tls = TlsConnector::builder()
        .build()
        .map_err(|e| FeedPocketError::Mailbox(format!("creating TLS connector: {}", e)))?;

    let client = imap::connect(config.address(), config.host(), &tls)?;
    info!(server = %config.address(), "Connected to email server");

    let session = client
        .login(&config.username, &config.app_password)
        .map_err(|(e, _)| FeedPocketError::Mailbox(format!("failed to login: {}", e)))?;
    info!("Login successfully");
    Ok(session)
}

fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
        self.with_session(|session| {
            let mailbox = session.select(INBOX)?;
            info!(messages = mailbox.exists, "Selected INBOX");
            if mailbox.exists == 0 {
                return Ok(Vec::new());
            }

            let mut uids: Vec<u32> = session.uid_search("ALL")?.into_iter().collect();
            uids.sort_unstable();
            info!(count = uids.len(), "UIDs matching the search criteria");
            if uids.is_empty() {
                return Ok(Vec::new());
            }

            // PEEK leaves \Seen alone for messages we fail to convert.
            let fetches = session.uid_fetch(uid_set(&uids), "(UID BODY.PEEK[])")?;
            let messages = fetches
                .iter()
                .filter_map(|fetch| {
                    Some(RawMessage {
                        uid: fetch.uid?,
                        raw: fetch.body()?.to_vec(),
                    })
                })
                .collect();
            Ok(messages)
        })
        .await
    }

    async fn archive(&self, uids: &[u32]) -> Result<()> {
        if uids.is_empty() {
            return Ok(());
        }
        let set = uid_set(uids);
        self.with_session(move |session| {
            session.select(INBOX)?;
            session.uid_store(&set, "+FLAGS (\\Deleted)")?;
            session.expunge()?;
            Ok(())
        })
        .await
    }
}
