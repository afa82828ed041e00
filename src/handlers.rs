use crate::{
    AppState, auth,
    auth::AuthUser,
    error::AppError,
    mailer,
    models::{
        Admin, AdminChanges, Category, CategoryRecord, CategoryTitle, ContactRequest,
        ContactResponse, CreateAdminRequest, LoginRequest, LoginResponse, MessageResponse,
        NewAdmin, News, NewsRecord, Role, UpdateAdminRequest, UploadResponse,
    },
    password, policy,
    repository::StoreError,
    storage::StoredFile,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use std::path::PathBuf;

/// Upper bound on gallery images accepted in one news request.
const MAX_GALLERY_IMAGES: usize = 50;

// --- Authentication ---

/// login
///
/// [Public Route] Verifies the supplied credentials against the stored
/// admin record and mints a one-day bearer token embedding the identity.
///
/// Flow: lookup (404 when the username is unknown), reject passwordless rows
/// (401), run the password verifier (401 on mismatch), issue the token and
/// return the record with the password stripped.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Bad credentials"),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .repo
        .find_admin_by_username(&payload.username)
        .await
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    let stored = user
        .password
        .clone()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Admin has no password set".to_string()))?;

    if !password::verify(&payload.password, &stored) {
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    let access_token = auth::issue_token(&user, &state.config.jwt_secret)?;

    let mut safe_user = user;
    safe_user.password = None;

    Ok(Json(LoginResponse {
        access_token,
        user: safe_user,
    }))
}

// --- Admin Management ---

/// create_admin
///
/// [Admin Route, super_admin] Creates a new ordinary admin. The username must
/// be unique (case-sensitive); the password is hashed before it reaches the
/// store.
#[utoipa::path(
    post,
    path = "/admin",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Created", body = Admin),
        (status = 401, description = "Not a super admin"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_admin(
    actor: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<Admin>), AppError> {
    policy::ensure_super_admin(&actor)?;

    if payload.username.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    // Advisory pre-check; the unique index catches races.
    if state.repo.username_taken(&payload.username, None).await {
        return Err(AppError::Conflict("username already exists".to_string()));
    }

    let password_hash = password::hash_password(&payload.password)?;

    let created = state
        .repo
        .create_admin(NewAdmin {
            username: payload.username,
            password_hash,
            role: Role::Admin,
            sites: payload.sites.unwrap_or_default(),
        })
        .await;

    match created {
        Ok(mut admin) => {
            admin.password = None;
            Ok((StatusCode::CREATED, Json(admin)))
        }
        Err(StoreError::Duplicate) => Err(AppError::Conflict("username already exists".to_string())),
        Err(StoreError::Database) => Err(AppError::Internal),
    }
}

/// list_admins
///
/// [Admin Route, super_admin] Lists all admins. The projection never includes
/// the password column.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "All admins", body = [Admin]),
        (status = 401, description = "Not a super admin")
    )
)]
pub async fn list_admins(
    actor: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Admin>>, AppError> {
    policy::ensure_super_admin(&actor)?;
    Ok(Json(state.repo.list_admins().await))
}

/// update_admin
///
/// [Admin Route] Partial update of an admin record, gated by the
/// authorization policy: self-updates may touch username/password (sites only
/// for a super_admin), cross-updates are limited to super_admins acting on
/// admin-role targets.
#[utoipa::path(
    put,
    path = "/admin/{id}",
    params(("id" = i64, Path, description = "Admin ID")),
    request_body = UpdateAdminRequest,
    responses(
        (status = 200, description = "Updated", body = Admin),
        (status = 401, description = "Policy denial"),
        (status = 404, description = "Unknown admin"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn update_admin(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAdminRequest>,
) -> Result<Json<Admin>, AppError> {
    let target = state
        .repo
        .get_admin(id)
        .await
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    policy::check_update(&actor, &target, payload.sites.is_some())?;

    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            return Err(AppError::BadRequest("username cannot be empty".to_string()));
        }
        if state.repo.username_taken(username, Some(id)).await {
            return Err(AppError::Conflict("username already exists".to_string()));
        }
    }

    let password_hash = match &payload.password {
        Some(plain) => Some(password::hash_password(plain)?),
        None => None,
    };

    let mut updated = state
        .repo
        .update_admin(
            id,
            AdminChanges {
                username: payload.username,
                password_hash,
                sites: payload.sites,
            },
        )
        .await
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    updated.password = None;
    Ok(Json(updated))
}

/// delete_admin
///
/// [Admin Route, super_admin] Deletes an admin-role record. A super_admin row
/// can never be deleted through the API, regardless of the caller.
#[utoipa::path(
    delete,
    path = "/admin/{id}",
    params(("id" = i64, Path, description = "Admin ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Policy denial"),
        (status = 404, description = "Unknown admin")
    )
)]
pub async fn delete_admin(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = state
        .repo
        .get_admin(id)
        .await
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    policy::check_delete(&actor, &target)?;

    if state.repo.delete_admin(id).await {
        Ok(Json(MessageResponse {
            message: format!("Admin {id} deleted successfully"),
        }))
    } else {
        Err(AppError::NotFound("Admin not found".to_string()))
    }
}

// --- News ---

/// NewsForm
///
/// Accumulated multipart payload for news create/update: text fields plus
/// already-persisted uploads. A field arriving with a filename is treated as
/// an upload; without one it is a plain text value (e.g. an existing URL).
#[derive(Default)]
struct NewsForm {
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    full_content: Option<String>,
    img_text: Option<String>,
    image_text: Option<Vec<String>>,
    video_text: Option<String>,
    img_upload: Option<StoredFile>,
    image_uploads: Vec<StoredFile>,
    video_upload: Option<StoredFile>,
}

fn multipart_err(_: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest("malformed multipart body".to_string())
}

/// parse_string_array
///
/// The `image` text field accepts either a JSON array of URLs or a
/// comma-separated list; single bare values are wrapped.
fn parse_string_array(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return vec![];
    }
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list;
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn parse_news_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<NewsForm, AppError> {
    let mut form = NewsForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match (name.as_str(), file_name) {
            ("img", Some(fname)) => {
                if form.img_upload.is_some() {
                    return Err(AppError::BadRequest(
                        "at most one cover image is allowed".to_string(),
                    ));
                }
                let bytes = field.bytes().await.map_err(multipart_err)?;
                form.img_upload = Some(state.storage.save("news", &fname, &bytes).await?);
            }
            ("image", Some(fname)) => {
                if form.image_uploads.len() >= MAX_GALLERY_IMAGES {
                    return Err(AppError::BadRequest(format!(
                        "at most {MAX_GALLERY_IMAGES} gallery images are allowed"
                    )));
                }
                let bytes = field.bytes().await.map_err(multipart_err)?;
                form.image_uploads
                    .push(state.storage.save("news", &fname, &bytes).await?);
            }
            ("video", Some(fname)) => {
                if form.video_upload.is_some() {
                    return Err(AppError::BadRequest(
                        "at most one video is allowed".to_string(),
                    ));
                }
                let bytes = field.bytes().await.map_err(multipart_err)?;
                form.video_upload = Some(state.storage.save("news", &fname, &bytes).await?);
            }
            ("title", None) => form.title = Some(field.text().await.map_err(multipart_err)?),
            ("description", None) => {
                form.description = Some(field.text().await.map_err(multipart_err)?);
            }
            ("date", None) => form.date = Some(field.text().await.map_err(multipart_err)?),
            ("fullContent", None) => {
                form.full_content = Some(field.text().await.map_err(multipart_err)?);
            }
            ("img", None) => form.img_text = Some(field.text().await.map_err(multipart_err)?),
            ("image", None) => {
                let text = field.text().await.map_err(multipart_err)?;
                form.image_text = Some(parse_string_array(&text));
            }
            ("video", None) => form.video_text = Some(field.text().await.map_err(multipart_err)?),
            // Unknown fields are drained and ignored.
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// create_news
///
/// [Authenticated Route] Creates a news article from a multipart payload:
/// text fields plus an optional cover image, up to 50 gallery images and one
/// video. Uploaded files win over URL text fields.
#[utoipa::path(
    post,
    path = "/news",
    responses(
        (status = 201, description = "Created", body = News),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_news(
    _actor: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<News>), AppError> {
    let form = parse_news_multipart(&state, multipart).await?;

    let title = non_empty(form.title)
        .ok_or_else(|| AppError::BadRequest("title is required".to_string()))?;

    let img = form
        .img_upload
        .map(|f| f.url)
        .or_else(|| non_empty(form.img_text));
    let video = form
        .video_upload
        .map(|f| f.url)
        .or_else(|| non_empty(form.video_text));
    let image = if form.image_uploads.is_empty() {
        form.image_text.unwrap_or_default()
    } else {
        form.image_uploads.into_iter().map(|f| f.url).collect()
    };

    let record = NewsRecord {
        title,
        description: Some(form.description.unwrap_or_default()),
        date: form.date,
        img,
        image,
        full_content: Some(form.full_content.unwrap_or_default()),
        video,
    };

    match state.repo.create_news(record).await {
        Ok(news) => Ok((StatusCode::CREATED, Json(news))),
        Err(_) => Err(AppError::Internal),
    }
}

/// list_news
///
/// [Public Route] Lists all news articles, newest first.
#[utoipa::path(
    get,
    path = "/news",
    responses((status = 200, description = "All news", body = [News]))
)]
pub async fn list_news(State(state): State<AppState>) -> Json<Vec<News>> {
    Json(state.repo.list_news().await)
}

/// get_news_item
///
/// [Public Route] Retrieves one article. Non-positive ids are rejected as
/// malformed before the store is consulted.
#[utoipa::path(
    get,
    path = "/news/{id}",
    params(("id" = i64, Path, description = "News ID")),
    responses(
        (status = 200, description = "Found", body = News),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Unknown news ID")
    )
)]
pub async fn get_news_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<News>, AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest(
            "Invalid news ID: ID must be a positive number".to_string(),
        ));
    }
    state
        .repo
        .get_news(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("News not found".to_string()))
}

/// update_news
///
/// [Authenticated Route] Partial update merged into the existing row.
/// A newly uploaded cover image or video supersedes — and best-effort
/// deletes — the old file; uploaded gallery images are appended, while a
/// provided `image` text field replaces the gallery and cleans up the URLs
/// it dropped. File cleanup failures never fail the request.
#[utoipa::path(
    put,
    path = "/news/{id}",
    params(("id" = i64, Path, description = "News ID")),
    responses(
        (status = 200, description = "Updated", body = News),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Unknown news ID")
    )
)]
pub async fn update_news(
    _actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<News>, AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest(
            "Invalid news ID: ID must be a positive number".to_string(),
        ));
    }

    let existing = state
        .repo
        .get_news(id)
        .await
        .ok_or_else(|| AppError::NotFound("News not found".to_string()))?;

    let form = parse_news_multipart(&state, multipart).await?;

    let mut record = NewsRecord {
        title: existing.title,
        description: existing.description,
        date: existing.date,
        img: existing.img,
        image: existing.image,
        full_content: existing.full_content,
        video: existing.video,
    };

    if let Some(title) = non_empty(form.title) {
        record.title = title;
    }
    if let Some(description) = form.description {
        record.description = Some(description);
    }
    if let Some(date) = non_empty(form.date) {
        record.date = Some(date);
    }
    if let Some(full_content) = form.full_content {
        record.full_content = Some(full_content);
    }

    // Cover image: an upload replaces (and cleans up) the old file; a text
    // value replaces the URL, cleaning up only when it actually changes.
    if let Some(upload) = form.img_upload {
        if let Some(old) = record.img.take() {
            state.storage.remove_by_url("news", &old).await;
        }
        record.img = Some(upload.url);
    } else if let Some(text) = form.img_text {
        match non_empty(Some(text)) {
            Some(url) => {
                if let Some(old) = &record.img {
                    if *old != url {
                        state.storage.remove_by_url("news", old).await;
                    }
                }
                record.img = Some(url);
            }
            None => record.img = None,
        }
    }

    // Gallery: uploads append; a text list replaces and cleans up dropped URLs.
    if !form.image_uploads.is_empty() {
        record
            .image
            .extend(form.image_uploads.into_iter().map(|f| f.url));
    } else if let Some(new_list) = form.image_text {
        for old in &record.image {
            if !new_list.contains(old) {
                state.storage.remove_by_url("news", old).await;
            }
        }
        record.image = new_list;
    }

    // Video: same policy as the cover image.
    if let Some(upload) = form.video_upload {
        if let Some(old) = record.video.take() {
            state.storage.remove_by_url("news", &old).await;
        }
        record.video = Some(upload.url);
    } else if let Some(text) = form.video_text {
        match non_empty(Some(text)) {
            Some(url) => {
                if let Some(old) = &record.video {
                    if *old != url {
                        state.storage.remove_by_url("news", old).await;
                    }
                }
                record.video = Some(url);
            }
            None => record.video = None,
        }
    }

    state
        .repo
        .update_news(id, record)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("News not found".to_string()))
}

/// delete_news
///
/// [Authenticated Route] Removes the row first, then best-effort deletes
/// every referenced file. The database state is authoritative even if some
/// files remain on disk.
#[utoipa::path(
    delete,
    path = "/news/{id}",
    params(("id" = i64, Path, description = "News ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Unknown news ID")
    )
)]
pub async fn delete_news(
    _actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest(
            "Invalid news ID: ID must be a positive number".to_string(),
        ));
    }

    let existing = state
        .repo
        .get_news(id)
        .await
        .ok_or_else(|| AppError::NotFound("News not found".to_string()))?;

    if !state.repo.delete_news(id).await {
        return Err(AppError::NotFound("News not found".to_string()));
    }

    if let Some(img) = &existing.img {
        state.storage.remove_by_url("news", img).await;
    }
    if let Some(video) = &existing.video {
        state.storage.remove_by_url("news", video).await;
    }
    for url in &existing.image {
        state.storage.remove_by_url("news", url).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

// --- Categories ---

#[derive(Default)]
struct CategoryForm {
    title_ru: Option<String>,
    title_en: Option<String>,
    img_upload: Option<StoredFile>,
}

async fn parse_category_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<CategoryForm, AppError> {
    let mut form = CategoryForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match (name.as_str(), file_name) {
            ("img", Some(fname)) => {
                let bytes = field.bytes().await.map_err(multipart_err)?;
                form.img_upload = Some(state.storage.save("categories", &fname, &bytes).await?);
            }
            ("title_ru", None) => form.title_ru = Some(field.text().await.map_err(multipart_err)?),
            ("title_en", None) => form.title_en = Some(field.text().await.map_err(multipart_err)?),
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

/// create_category
///
/// [Authenticated Route] Creates a category with a localized title and an
/// optional image upload.
#[utoipa::path(
    post,
    path = "/categories",
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_category(
    _actor: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let form = parse_category_multipart(&state, multipart).await?;

    let (Some(ru), Some(en)) = (non_empty(form.title_ru), non_empty(form.title_en)) else {
        return Err(AppError::BadRequest(
            "title_ru and title_en are required".to_string(),
        ));
    };

    let record = CategoryRecord {
        title: CategoryTitle { ru, en },
        img: form.img_upload.map(|f| f.url),
    };

    match state.repo.create_category(record).await {
        Ok(category) => Ok((StatusCode::CREATED, Json(category))),
        Err(_) => Err(AppError::Internal),
    }
}

/// list_categories
///
/// [Public Route]
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.repo.list_categories().await)
}

/// get_category
///
/// [Public Route]
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = Category),
        (status = 404, description = "Unknown category ID")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    state
        .repo
        .get_category(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// update_category
///
/// [Authenticated Route] Partial title merge; a new image upload supersedes
/// and best-effort deletes the old file.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Unknown category ID")
    )
)]
pub async fn update_category(
    _actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Category>, AppError> {
    let existing = state
        .repo
        .get_category(id)
        .await
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let form = parse_category_multipart(&state, multipart).await?;

    let mut record = CategoryRecord {
        title: existing.title.0.clone(),
        img: existing.img.clone(),
    };

    if let Some(ru) = non_empty(form.title_ru) {
        record.title.ru = ru;
    }
    if let Some(en) = non_empty(form.title_en) {
        record.title.en = en;
    }
    if let Some(upload) = form.img_upload {
        if let Some(old) = record.img.take() {
            state.storage.remove_by_url("categories", &old).await;
        }
        record.img = Some(upload.url);
    }

    state
        .repo
        .update_category(id, record)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// delete_category
///
/// [Authenticated Route]
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown category ID")
    )
)]
pub async fn delete_category(
    _actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let existing = state
        .repo
        .get_category(id)
        .await
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    if !state.repo.delete_category(id).await {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    if let Some(img) = &existing.img {
        state.storage.remove_by_url("categories", img).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

// --- Contact ---

/// submit_contact
///
/// [Public Route] Validates the required fields and hands the message to the
/// asynchronous relay pipeline (SMTP with retries and file-based audit
/// logging). Always acknowledges immediately; eventual delivery outcome is
/// never surfaced to the caller.
#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Accepted", body = ContactResponse),
        (status = 400, description = "Missing required field")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    if payload.name.trim().is_empty()
        || payload.phone.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "name, phone and message are required".to_string(),
        ));
    }

    let mailer = state.mailer.clone();
    let audit_log = PathBuf::from(&state.config.contact_audit_log);
    tokio::spawn(mailer::relay_with_retry(mailer, payload, audit_log));

    Ok(Json(ContactResponse {
        success: true,
        message: "Message sent!".to_string(),
    }))
}

// --- Generic Upload ---

/// upload_file
///
/// [Public Route] Accepts a single `file` multipart field (≤10MB, enforced by
/// the route's body limit), stores it under /uploads/files/ and returns its
/// public URL.
#[utoipa::path(
    post,
    path = "/upload",
    responses(
        (status = 200, description = "Uploaded", body = UploadResponse),
        (status = 400, description = "No file provided")
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let is_file = field.name() == Some("file") && field.file_name().is_some();
        if !is_file {
            let _ = field.bytes().await;
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.bin").to_string();
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_err)?;

        let stored = state.storage.save("files", &original_name, &bytes).await?;

        return Ok(Json(UploadResponse {
            success: true,
            message: "File uploaded successfully".to_string(),
            url: stored.url,
            filename: stored.filename,
            original_name,
            size: stored.size,
            mimetype,
        }));
    }

    Err(AppError::BadRequest("no file provided".to_string()))
}
