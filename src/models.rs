use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of admin privilege tiers. Modelled as an enum (rather than
/// raw role strings) so the authorization policy can match exhaustively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "admin_role", rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    /// Highest tier: manages all admin records.
    SuperAdmin,
    /// Ordinary tier: may only edit its own username/password.
    #[default]
    Admin,
}

/// Admin
///
/// The canonical credential record from the `admins` table.
///
/// The `password` column holds either a bcrypt/Argon2 hash or, for legacy
/// rows, plaintext. It is loaded only where verification needs it and is
/// never serialized into any response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Admin {
    pub id: i64,
    /// Unique across all admins (case-sensitive, enforced by a DB constraint).
    pub username: String,
    /// Stored credential. Excluded from every read projection and response.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password: Option<String>,
    pub role: Role,
    /// Site scope identifiers; `"*"` denotes unrestricted scope.
    pub sites: Vec<String>,
}

/// News
///
/// A news article row. File-bearing columns store public URLs under
/// `/uploads/news/`; the database row is authoritative even if an on-disk
/// file lingers after a failed cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    /// Cover image URL.
    pub img: Option<String>,
    /// Gallery image URLs (up to 50).
    pub image: Vec<String>,
    #[serde(rename = "fullContent")]
    pub full_content: Option<String>,
    pub video: Option<String>,
}

/// CategoryTitle
///
/// Localized category title, persisted as a single JSONB column.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryTitle {
    pub ru: String,
    pub en: String,
}

/// Category
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    #[schema(value_type = CategoryTitle)]
    #[ts(type = "{ ru: string, en: string }")]
    pub title: Json<CategoryTitle>,
    pub img: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// LoginResponse
///
/// Output of a successful login: the signed bearer token plus the admin
/// record with the password column stripped.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub user: Admin,
}

/// CreateAdminRequest
///
/// Input payload for POST /admin (super_admin only). Created rows always get
/// the ordinary `admin` role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateAdminRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites: Option<Vec<String>>,
}

/// UpdateAdminRequest
///
/// Partial update payload for PUT /admin/{id}. Which fields the caller may
/// touch is decided by the authorization policy, not by this schema.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateAdminRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites: Option<Vec<String>>,
}

/// ContactRequest
///
/// Input payload for POST /contact. `name`, `phone` and `message` are
/// required; the rest is relayed as-is into the outbound email.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactRequest {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub message: String,
}

// --- Output Schemas ---

/// MessageResponse
///
/// Generic confirmation body for mutations that return no resource.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// ContactResponse
///
/// Always-success acknowledgement for contact submissions; delivery itself
/// is asynchronous and never reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// UploadResponse
///
/// Output of the generic POST /upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    /// Public URL under /uploads/files/.
    pub url: String,
    pub filename: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    pub size: usize,
    pub mimetype: String,
}

// --- Internal Write Models (Repository Layer) ---

/// NewAdmin
///
/// Insert payload for the credential store. The password here is always a
/// hash; plaintext never reaches the repository from application code.
#[derive(Debug, Clone, Default)]
pub struct NewAdmin {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub sites: Vec<String>,
}

/// AdminChanges
///
/// Partial update for an admin row; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct AdminChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub sites: Option<Vec<String>>,
}

/// NewsRecord
///
/// Full column set for a news row. Used for insert and for save-back after
/// the handler has merged uploads into an existing row.
#[derive(Debug, Clone, Default)]
pub struct NewsRecord {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub img: Option<String>,
    pub image: Vec<String>,
    pub full_content: Option<String>,
    pub video: Option<String>,
}

/// CategoryRecord
///
/// Full column set for a category row.
#[derive(Debug, Clone, Default)]
pub struct CategoryRecord {
    pub title: CategoryTitle,
    pub img: Option<String>,
}
