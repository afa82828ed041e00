use rand::Rng;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    error::AppError,
    models::{NewAdmin, Role},
    password,
    repository::{RepositoryState, StoreError},
};

/// Alphabet for generated bootstrap passwords: mixed case, digits, symbols.
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Length of a generated bootstrap password.
const PASSWORD_LEN: usize = 20;

/// generate_password
///
/// Draws from the fixed alphabet using the thread-local CSPRNG.
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LEN)
        .map(|_| PASSWORD_ALPHABET[rng.random_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

/// Randomized username fallback when SUPER_ADMIN_USERNAME is unset.
fn generate_username() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| (b'a' + rng.random_range(0..26u8)) as char)
        .collect();
    format!("root-{suffix}")
}

/// ensure_super_admin
///
/// Idempotently ensures one highest-privilege account exists, before the
/// listener starts accepting authorization-gated traffic.
///
/// - If any super_admin row exists: no-op; its username is logged for
///   operator visibility, its password is never revealed or reset.
/// - Otherwise a new account is created (credentials from configuration or
///   randomized fallbacks), with unrestricted site scope. The plaintext
///   password is emitted exactly once through the log and never persisted.
///
/// The check-then-insert is backed by the store's unique username index: a
/// duplicate-key insert means another instance won the race, which is logged
/// and treated as success.
pub async fn ensure_super_admin(
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<(), AppError> {
    if let Some(existing) = repo.find_super_admin().await {
        info!(username = %existing.username, "super admin already present, skipping bootstrap");
        return Ok(());
    }

    let username = config
        .super_admin_username
        .clone()
        .unwrap_or_else(generate_username);
    let plaintext = config
        .super_admin_password
        .clone()
        .unwrap_or_else(generate_password);

    let password_hash = password::hash_password(&plaintext)?;

    let created = repo
        .create_admin(NewAdmin {
            username: username.clone(),
            password_hash,
            role: Role::SuperAdmin,
            sites: vec!["*".to_string()],
        })
        .await;

    match created {
        Ok(admin) => {
            // The one and only place this password is ever visible.
            warn!(
                username = %admin.username,
                password = %plaintext,
                "created bootstrap super admin; store these credentials now, they will not be shown again"
            );
            Ok(())
        }
        Err(StoreError::Duplicate) => {
            info!(%username, "bootstrap lost the creation race; super admin already exists");
            Ok(())
        }
        Err(StoreError::Database) => Err(AppError::Internal),
    }
}
