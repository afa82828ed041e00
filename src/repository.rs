use crate::models::{
    Admin, AdminChanges, Category, CategoryRecord, NewAdmin, News, NewsRecord, Role,
};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// StoreError
///
/// Failures the persistence layer distinguishes. `Duplicate` surfaces the
/// store-level unique constraint on usernames (the authoritative uniqueness
/// check; the application-level read is only advisory).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate key")]
    Duplicate,
    #[error("database error")]
    Database,
}

/// Repository Trait
///
/// The abstract contract for all persistence operations, letting handlers
/// talk to the data layer without knowing the concrete implementation
/// (Postgres in production, the in-memory store in tests).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Admin Credential Store ---
    /// Lookup by username *including* the password column (login path only).
    async fn find_admin_by_username(&self, username: &str) -> Option<Admin>;
    async fn get_admin(&self, id: i64) -> Option<Admin>;
    /// Safe projection: the password column is never loaded.
    async fn list_admins(&self) -> Vec<Admin>;
    /// Any record with role super_admin, if one exists (bootstrap check).
    async fn find_super_admin(&self) -> Option<Admin>;
    /// Advisory uniqueness pre-check; the unique index remains authoritative.
    async fn username_taken(&self, username: &str, exclude_id: Option<i64>) -> bool;
    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, StoreError>;
    async fn update_admin(&self, id: i64, changes: AdminChanges) -> Option<Admin>;
    async fn delete_admin(&self, id: i64) -> bool;

    // --- News ---
    async fn create_news(&self, record: NewsRecord) -> Result<News, StoreError>;
    /// Newest first (descending id).
    async fn list_news(&self) -> Vec<News>;
    async fn get_news(&self, id: i64) -> Option<News>;
    /// Full save-back: the handler merges uploads into the row first.
    async fn update_news(&self, id: i64, record: NewsRecord) -> Option<News>;
    async fn delete_news(&self, id: i64) -> bool;

    // --- Categories ---
    async fn create_category(&self, record: CategoryRecord) -> Result<Category, StoreError>;
    async fn list_categories(&self) -> Vec<Category>;
    async fn get_category(&self, id: i64) -> Option<Category>;
    async fn update_category(&self, id: i64, record: CategoryRecord) -> Option<Category>;
    async fn delete_category(&self, id: i64) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by
/// PostgreSQL. All queries are runtime-checked and parameterized.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_admin_by_username(&self, username: &str) -> Option<Admin> {
        sqlx::query_as::<_, Admin>(
            "SELECT id, username, password, role, sites FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_admin_by_username error: {:?}", e);
            None
        })
    }

    async fn get_admin(&self, id: i64) -> Option<Admin> {
        sqlx::query_as::<_, Admin>(
            "SELECT id, username, password, role, sites FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_admin error: {:?}", e);
            None
        })
    }

    /// list_admins
    ///
    /// Administrative listing. The password column is replaced by NULL at the
    /// projection level, so a hash can never leak through this path.
    async fn list_admins(&self) -> Vec<Admin> {
        sqlx::query_as::<_, Admin>(
            "SELECT id, username, NULL::text AS password, role, sites FROM admins ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_admins error: {:?}", e);
            vec![]
        })
    }

    async fn find_super_admin(&self) -> Option<Admin> {
        sqlx::query_as::<_, Admin>(
            "SELECT id, username, NULL::text AS password, role, sites FROM admins WHERE role = $1 LIMIT 1",
        )
        .bind(Role::SuperAdmin)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_super_admin error: {:?}", e);
            None
        })
    }

    async fn username_taken(&self, username: &str, exclude_id: Option<i64>) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE username = $1 AND ($2::bigint IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("username_taken error: {:?}", e);
            false
        })
    }

    /// create_admin
    ///
    /// Inserts a new admin row. The unique index on `username` is the final
    /// arbiter of uniqueness; a violation maps to `StoreError::Duplicate`.
    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, StoreError> {
        let result = sqlx::query_as::<_, Admin>(
            "INSERT INTO admins (username, password, role, sites) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, password, role, sites",
        )
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(admin.role)
        .bind(&admin.sites)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate)
            }
            Err(e) => {
                tracing::error!("create_admin error: {:?}", e);
                Err(StoreError::Database)
            }
        }
    }

    /// update_admin
    ///
    /// Partial update using COALESCE so only provided fields change.
    async fn update_admin(&self, id: i64, changes: AdminChanges) -> Option<Admin> {
        sqlx::query_as::<_, Admin>(
            "UPDATE admins \
             SET username = COALESCE($2, username), \
                 password = COALESCE($3, password), \
                 sites = COALESCE($4, sites) \
             WHERE id = $1 \
             RETURNING id, username, password, role, sites",
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.password_hash)
        .bind(changes.sites)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_admin error: {:?}", e);
            None
        })
    }

    async fn delete_admin(&self, id: i64) -> bool {
        match sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_admin error: {:?}", e);
                false
            }
        }
    }

    async fn create_news(&self, record: NewsRecord) -> Result<News, StoreError> {
        sqlx::query_as::<_, News>(
            "INSERT INTO news (title, description, date, img, image, full_content, video) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, title, description, date, img, image, full_content, video",
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.date)
        .bind(&record.img)
        .bind(&record.image)
        .bind(&record.full_content)
        .bind(&record.video)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("create_news error: {:?}", e);
            StoreError::Database
        })
    }

    async fn list_news(&self) -> Vec<News> {
        sqlx::query_as::<_, News>(
            "SELECT id, title, description, date, img, image, full_content, video \
             FROM news ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_news error: {:?}", e);
            vec![]
        })
    }

    async fn get_news(&self, id: i64) -> Option<News> {
        sqlx::query_as::<_, News>(
            "SELECT id, title, description, date, img, image, full_content, video \
             FROM news WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_news error: {:?}", e);
            None
        })
    }

    async fn update_news(&self, id: i64, record: NewsRecord) -> Option<News> {
        sqlx::query_as::<_, News>(
            "UPDATE news \
             SET title = $2, description = $3, date = $4, img = $5, image = $6, \
                 full_content = $7, video = $8 \
             WHERE id = $1 \
             RETURNING id, title, description, date, img, image, full_content, video",
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.date)
        .bind(&record.img)
        .bind(&record.image)
        .bind(&record.full_content)
        .bind(&record.video)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_news error: {:?}", e);
            None
        })
    }

    async fn delete_news(&self, id: i64) -> bool {
        match sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_news error: {:?}", e);
                false
            }
        }
    }

    async fn create_category(&self, record: CategoryRecord) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (title, img) VALUES ($1, $2) RETURNING id, title, img",
        )
        .bind(Json(record.title))
        .bind(&record.img)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("create_category error: {:?}", e);
            StoreError::Database
        })
    }

    async fn list_categories(&self) -> Vec<Category> {
        sqlx::query_as::<_, Category>("SELECT id, title, img FROM categories ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_categories error: {:?}", e);
                vec![]
            })
    }

    async fn get_category(&self, id: i64) -> Option<Category> {
        sqlx::query_as::<_, Category>("SELECT id, title, img FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_category error: {:?}", e);
                None
            })
    }

    async fn update_category(&self, id: i64, record: CategoryRecord) -> Option<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET title = $2, img = $3 WHERE id = $1 RETURNING id, title, img",
        )
        .bind(id)
        .bind(Json(record.title))
        .bind(&record.img)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_category error: {:?}", e);
            None
        })
    }

    async fn delete_category(&self, id: i64) -> bool {
        match sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_category error: {:?}", e);
                false
            }
        }
    }
}

// --- In-Memory Implementation (For Tests) ---

#[derive(Default)]
struct MemoryInner {
    admins: Vec<Admin>,
    news: Vec<News>,
    categories: Vec<Category>,
    next_admin_id: i64,
    next_news_id: i64,
    next_category_id: i64,
}

/// MemoryRepository
///
/// An in-memory implementation of `Repository` used by the integration
/// tests, mirroring the Postgres semantics (serial ids, unique usernames,
/// descending news order) without requiring a database.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<MemoryInner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn strip_password(mut admin: Admin) -> Admin {
    admin.password = None;
    admin
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_admin_by_username(&self, username: &str) -> Option<Admin> {
        self.lock()
            .admins
            .iter()
            .find(|a| a.username == username)
            .cloned()
    }

    async fn get_admin(&self, id: i64) -> Option<Admin> {
        self.lock().admins.iter().find(|a| a.id == id).cloned()
    }

    async fn list_admins(&self) -> Vec<Admin> {
        self.lock()
            .admins
            .iter()
            .cloned()
            .map(strip_password)
            .collect()
    }

    async fn find_super_admin(&self) -> Option<Admin> {
        self.lock()
            .admins
            .iter()
            .find(|a| a.role == Role::SuperAdmin)
            .cloned()
            .map(strip_password)
    }

    async fn username_taken(&self, username: &str, exclude_id: Option<i64>) -> bool {
        self.lock()
            .admins
            .iter()
            .any(|a| a.username == username && Some(a.id) != exclude_id)
    }

    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, StoreError> {
        let mut inner = self.lock();
        if inner.admins.iter().any(|a| a.username == admin.username) {
            return Err(StoreError::Duplicate);
        }
        inner.next_admin_id += 1;
        let row = Admin {
            id: inner.next_admin_id,
            username: admin.username,
            password: Some(admin.password_hash),
            role: admin.role,
            sites: admin.sites,
        };
        inner.admins.push(row.clone());
        Ok(row)
    }

    async fn update_admin(&self, id: i64, changes: AdminChanges) -> Option<Admin> {
        let mut inner = self.lock();
        let row = inner.admins.iter_mut().find(|a| a.id == id)?;
        if let Some(username) = changes.username {
            row.username = username;
        }
        if let Some(hash) = changes.password_hash {
            row.password = Some(hash);
        }
        if let Some(sites) = changes.sites {
            row.sites = sites;
        }
        Some(row.clone())
    }

    async fn delete_admin(&self, id: i64) -> bool {
        let mut inner = self.lock();
        let before = inner.admins.len();
        inner.admins.retain(|a| a.id != id);
        inner.admins.len() < before
    }

    async fn create_news(&self, record: NewsRecord) -> Result<News, StoreError> {
        let mut inner = self.lock();
        inner.next_news_id += 1;
        let row = News {
            id: inner.next_news_id,
            title: record.title,
            description: record.description,
            date: record.date,
            img: record.img,
            image: record.image,
            full_content: record.full_content,
            video: record.video,
        };
        inner.news.push(row.clone());
        Ok(row)
    }

    async fn list_news(&self) -> Vec<News> {
        let mut rows: Vec<News> = self.lock().news.clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows
    }

    async fn get_news(&self, id: i64) -> Option<News> {
        self.lock().news.iter().find(|n| n.id == id).cloned()
    }

    async fn update_news(&self, id: i64, record: NewsRecord) -> Option<News> {
        let mut inner = self.lock();
        let row = inner.news.iter_mut().find(|n| n.id == id)?;
        row.title = record.title;
        row.description = record.description;
        row.date = record.date;
        row.img = record.img;
        row.image = record.image;
        row.full_content = record.full_content;
        row.video = record.video;
        Some(row.clone())
    }

    async fn delete_news(&self, id: i64) -> bool {
        let mut inner = self.lock();
        let before = inner.news.len();
        inner.news.retain(|n| n.id != id);
        inner.news.len() < before
    }

    async fn create_category(&self, record: CategoryRecord) -> Result<Category, StoreError> {
        let mut inner = self.lock();
        inner.next_category_id += 1;
        let row = Category {
            id: inner.next_category_id,
            title: Json(record.title),
            img: record.img,
        };
        inner.categories.push(row.clone());
        Ok(row)
    }

    async fn list_categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    async fn get_category(&self, id: i64) -> Option<Category> {
        self.lock().categories.iter().find(|c| c.id == id).cloned()
    }

    async fn update_category(&self, id: i64, record: CategoryRecord) -> Option<Category> {
        let mut inner = self.lock();
        let row = inner.categories.iter_mut().find(|c| c.id == id)?;
        row.title = Json(record.title);
        row.img = record.img;
        Some(row.clone())
    }

    async fn delete_category(&self, id: i64) -> bool {
        let mut inner = self.lock();
        let before = inner.categories.len();
        inner.categories.retain(|c| c.id != id);
        inner.categories.len() < before
    }
}
