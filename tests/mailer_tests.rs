use content_portal::{
    MockMailer,
    mailer::{self, MailerState},
    models::ContactRequest,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use uuid::Uuid;

fn contact() -> ContactRequest {
    ContactRequest {
        name: "Alice".to_string(),
        phone: "+100200300".to_string(),
        email: Some("alice@example.com".to_string()),
        country: None,
        company: None,
        message: "Hello there".to_string(),
    }
}

fn temp_audit_log() -> PathBuf {
    std::env::temp_dir().join(format!("portal-contact-audit-{}.log", Uuid::new_v4()))
}

async fn read_audit_lines(path: &PathBuf) -> Vec<serde_json::Value> {
    let contents = tokio::fs::read_to_string(path).await.unwrap_or_default();
    contents
        .lines()
        .map(|l| serde_json::from_str(l).expect("audit lines must be valid JSON"))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_relay_first_attempt_success() {
    let mailer = Arc::new(MockMailer::new());
    let audit_log = temp_audit_log();

    let started = tokio::time::Instant::now();
    let handle = tokio::spawn(mailer::relay_with_retry(
        mailer.clone() as MailerState,
        contact(),
        audit_log.clone(),
    ));
    handle.await.unwrap();

    // The first attempt is immediate; no backoff is spent on success.
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(mailer.sent_messages().len(), 1);

    let lines = read_audit_lines(&audit_log).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["status"], "sent");
    assert_eq!(lines[0]["attempt"], 1);
    assert_eq!(lines[0]["name"], "Alice");

    let _ = tokio::fs::remove_file(&audit_log).await;
}

#[tokio::test(start_paused = true)]
async fn test_relay_retries_until_success() {
    // First two attempts fail; the third (second retry) succeeds.
    let mailer = Arc::new(MockMailer::failing_first(2));
    let audit_log = temp_audit_log();

    let started = tokio::time::Instant::now();
    let handle = tokio::spawn(mailer::relay_with_retry(
        mailer.clone() as MailerState,
        contact(),
        audit_log.clone(),
    ));
    handle.await.unwrap();

    // Backoff schedule: 5s before the first retry, 10s before the second.
    assert_eq!(started.elapsed(), Duration::from_secs(15));
    assert_eq!(mailer.sent_messages().len(), 1);

    let lines = read_audit_lines(&audit_log).await;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["status"], "failed");
    assert_eq!(lines[1]["status"], "failed");
    assert_eq!(lines[2]["status"], "sent");
    assert_eq!(lines[2]["attempt"], 3);

    let _ = tokio::fs::remove_file(&audit_log).await;
}

#[tokio::test(start_paused = true)]
async fn test_relay_drops_message_after_ladder_exhausted() {
    // One initial attempt plus three retries, all failing.
    let mailer = Arc::new(MockMailer::failing_first(4));
    let audit_log = temp_audit_log();

    let started = tokio::time::Instant::now();
    let handle = tokio::spawn(mailer::relay_with_retry(
        mailer.clone() as MailerState,
        contact(),
        audit_log.clone(),
    ));
    handle.await.unwrap();

    // The full ladder is walked: 5s + 10s + 15s of virtual time.
    assert_eq!(started.elapsed(), Duration::from_secs(30));

    // Nothing delivered, and no fifth attempt.
    assert!(mailer.sent_messages().is_empty());

    let lines = read_audit_lines(&audit_log).await;
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l["status"] == "failed"));
    assert!(lines.iter().all(|l| !l["error"].is_null()));

    let _ = tokio::fs::remove_file(&audit_log).await;
}

#[tokio::test]
async fn test_mock_mailer_failure_budget() {
    let mailer = MockMailer::failing_first(1);
    use content_portal::mailer::Mailer;

    assert!(mailer.send_contact(&contact()).await.is_err());
    assert!(mailer.send_contact(&contact()).await.is_ok());
    assert_eq!(mailer.sent_messages().len(), 1);
}
