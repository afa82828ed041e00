use std::path::{Path, PathBuf};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::{config::AppConfig, models::ContactRequest};

/// Backoff ladder for contact relay retries, in seconds.
pub const RETRY_DELAYS_SECS: [u64; 3] = [5, 10, 15];

/// Errors that can occur when relaying a contact submission.
#[derive(Debug, Error)]
pub enum MailerError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid mailbox address.
    #[error("invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    /// SMTP relay is not configured.
    #[error("outbound email is not configured")]
    NotConfigured,
}

/// Mailer
///
/// Abstract contract for the outbound contact relay, so handler tests can
/// swap the SMTP transport for a recording mock.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_contact(&self, msg: &ContactRequest) -> Result<(), MailerError>;
}

/// MailerState
///
/// The concrete type used to share the mailer across the application state.
pub type MailerState = Arc<dyn Mailer>;

/// Placeholder used for empty optional fields in the email body.
fn field_or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "—",
    }
}

/// render_contact_html
///
/// Builds the HTML body relayed to the configured contact mailbox.
fn render_contact_html(msg: &ContactRequest) -> String {
    format!(
        "<h2>New contact request</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Phone:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Country:</strong> {}</p>\
         <p><strong>Company:</strong> {}</p>\
         <p><strong>Message:</strong></p>\
         <div style=\"background:#f5f5f5;padding:15px;border-left:4px solid #0066ff;\">{}</div>\
         <hr>\
         <small><strong>Received:</strong> {}</small>",
        field_or_dash(Some(&msg.name)),
        field_or_dash(Some(&msg.phone)),
        field_or_dash(msg.email.as_deref()),
        field_or_dash(msg.country.as_deref()),
        field_or_dash(msg.company.as_deref()),
        field_or_dash(Some(&msg.message)),
        chrono::Utc::now().to_rfc3339(),
    )
}

/// SmtpMailer
///
/// The production relay: one async SMTP transport (implicit TLS on 465,
/// STARTTLS otherwise) sending HTML mail to the configured contact mailbox,
/// with the submitter's address as reply-to when present.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl SmtpMailer {
    /// Builds the relay from configuration. Requires both an SMTP host and a
    /// destination contact address.
    pub fn new(config: &AppConfig) -> Result<Self, MailerError> {
        let host = config.smtp_host.as_deref().ok_or(MailerError::NotConfigured)?;
        let to = config
            .contact_email
            .clone()
            .ok_or(MailerError::NotConfigured)?;

        let mut builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        builder = builder.port(config.smtp_port);

        if !config.smtp_user.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_pass.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.smtp_user.clone(),
            to,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_contact(&self, msg: &ContactRequest) -> Result<(), MailerError> {
        let from: Mailbox = format!("\"Contact form\" <{}>", self.from).parse()?;
        let to: Mailbox = self.to.parse()?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject("New contact request")
            .header(ContentType::TEXT_HTML);

        if let Some(reply_to) = msg.email.as_deref() {
            if let Ok(mailbox) = reply_to.parse::<Mailbox>() {
                builder = builder.reply_to(mailbox);
            }
        }

        let email = builder.body(render_contact_html(msg))?;
        self.transport.send(email).await?;
        Ok(())
    }
}

/// DisabledMailer
///
/// Stands in when no SMTP host is configured: submissions are accepted and
/// audit-logged but never leave the process.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_contact(&self, msg: &ContactRequest) -> Result<(), MailerError> {
        tracing::warn!(name = %msg.name, "SMTP not configured; contact message not relayed");
        Ok(())
    }
}

// --- Mock Implementation (For Tests) ---

/// MockMailer
///
/// Records every delivered message; `fail_first` makes the first N attempts
/// fail so retry behavior can be exercised.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<ContactRequest>>,
    pub fail_first: AtomicUsize,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(attempts: usize) -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail_first: AtomicUsize::new(attempts),
        }
    }

    pub fn sent_messages(&self) -> Vec<ContactRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_contact(&self, msg: &ContactRequest) -> Result<(), MailerError> {
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(MailerError::NotConfigured);
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(msg.clone());
        Ok(())
    }
}

// --- Retry + Audit Pipeline ---

/// append_audit_line
///
/// Appends one JSON line per relay attempt to the file-based audit log.
/// Audit failures themselves are logged and swallowed.
async fn append_audit_line(
    audit_log: &Path,
    msg: &ContactRequest,
    attempt: usize,
    status: &str,
    error: Option<&MailerError>,
) {
    let line = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "attempt": attempt,
        "status": status,
        "error": error.map(|e| e.to_string()),
        "name": msg.name,
        "phone": msg.phone,
    });

    if let Some(parent) = audit_log.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
    }

    let open = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_log)
        .await;

    match open {
        Ok(mut file) => {
            if let Err(e) = file.write_all(format!("{line}\n").as_bytes()).await {
                tracing::warn!("failed to append contact audit line: {:?}", e);
            }
        }
        Err(e) => tracing::warn!("failed to open contact audit log: {:?}", e),
    }
}

/// relay_with_retry
///
/// The asynchronous delivery pipeline behind POST /contact: an immediate
/// attempt followed by up to three retries at 5s/10s/15s. Every attempt is
/// audit-logged; after the ladder is exhausted the message is dropped. The
/// caller has already answered the client, so nothing is surfaced.
pub async fn relay_with_retry(mailer: MailerState, msg: ContactRequest, audit_log: PathBuf) {
    for attempt in 0..=RETRY_DELAYS_SECS.len() {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_secs(RETRY_DELAYS_SECS[attempt - 1])).await;
        }

        match mailer.send_contact(&msg).await {
            Ok(()) => {
                append_audit_line(&audit_log, &msg, attempt + 1, "sent", None).await;
                return;
            }
            Err(e) => {
                tracing::warn!("contact relay attempt {} failed: {}", attempt + 1, e);
                append_audit_line(&audit_log, &msg, attempt + 1, "failed", Some(&e)).await;
            }
        }
    }

    tracing::error!(
        "contact message dropped after {} attempts",
        RETRY_DELAYS_SECS.len() + 1
    );
}
