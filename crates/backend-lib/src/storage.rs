// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Identity store abstraction with in-memory and flat-file implementations.
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exoplanet_common::{ListQuery, UserId, UserResponse};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, sync::Mutex};

use crate::error::AppError;

/// Stored user record. The hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

/// Record to insert; id and timestamps are assigned by the store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
}

/// Trait for identity store backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user, failing if the email is already taken
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Users ordered by id; `limit` is capped at [`ListQuery::MAX_LIMIT`]
    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<User>, AppError>;

    /// Replace an existing user, stamping `updated_at`
    async fn update(&self, user: User) -> Result<User, AppError>;

    async fn delete(&self, id: UserId) -> Result<(), AppError>;
}

/// Table shared by both backends; also the on-disk format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserTable {
    next_id: UserId,
    users: BTreeMap<UserId, User>,
    /// Email to id; derived from `users`, never persisted
    #[serde(skip)]
    by_email: HashMap<String, UserId>,
}

impl UserTable {
    /// Decode the on-disk form and rebuild the email index
    fn from_json(content: &str) -> Result<Self, AppError> {
        let mut table: UserTable = serde_json::from_str(content)?;
        table.by_email = table
            .users
            .values()
            .map(|u| (u.email.clone(), u.id))
            .collect();
        if table.by_email.len() != table.users.len() {
            return Err(AppError::Internal(
                "user table holds duplicate emails".to_string(),
            ));
        }
        Ok(table)
    }

    fn email_owner(&self, email: &str) -> Option<UserId> {
        self.by_email.get(email).copied()
    }

    fn insert(&mut self, new: NewUser) -> Result<User, AppError> {
        if self.email_owner(&new.email).is_some() {
            return Err(AppError::EmailAlreadyExists(new.email));
        }
        self.next_id += 1;
        let user = User {
            id: self.next_id,
            name: new.name,
            email: new.email,
            hashed_password: new.hashed_password,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn get_by_email(&self, email: &str) -> Option<User> {
        self.email_owner(email)
            .and_then(|id| self.users.get(&id).cloned())
    }

    fn list(&self, skip: usize, limit: usize) -> Vec<User> {
        self.users
            .values()
            .skip(skip)
            .take(limit.min(ListQuery::MAX_LIMIT))
            .cloned()
            .collect()
    }

    fn update(&mut self, mut user: User) -> Result<User, AppError> {
        let Some(previous_email) = self.users.get(&user.id).map(|u| u.email.clone()) else {
            return Err(AppError::UserNotFound(user.id));
        };
        if matches!(self.email_owner(&user.email), Some(owner) if owner != user.id) {
            return Err(AppError::EmailAlreadyExists(user.email));
        }
        user.updated_at = Some(Utc::now());
        if previous_email != user.email {
            self.by_email.remove(&previous_email);
            self.by_email.insert(user.email.clone(), user.id);
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn delete(&mut self, id: UserId) -> Result<(), AppError> {
        let user = self.users.remove(&id).ok_or(AppError::UserNotFound(id))?;
        self.by_email.remove(&user.email);
        Ok(())
    }
}

/// Process-local store, used by tests and ephemeral deployments
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    table: Arc<RwLock<UserTable>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        self.table.write().insert(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.table.read().users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.table.read().get_by_email(email))
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<User>, AppError> {
        Ok(self.table.read().list(skip, limit))
    }

    async fn update(&self, user: User) -> Result<User, AppError> {
        self.table.write().update(user)
    }

    async fn delete(&self, id: UserId) -> Result<(), AppError> {
        self.table.write().delete(id)
    }
}

/// Flat-file implementation: one JSON table, rewritten atomically on every change
#[derive(Clone)]
pub struct FlatFileUserStore {
    path: PathBuf,
    table: Arc<Mutex<UserTable>>,
}

impl FlatFileUserStore {
    pub const FILE_NAME: &'static str = "users.json";

    /// Open (or create) the store under `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, AppError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let path = root.join(Self::FILE_NAME);

        let table = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            UserTable::from_json(&content)?
        } else {
            UserTable::default()
        };
        tracing::info!(path = %path.display(), users = table.users.len(), "opened user store");

        Ok(Self {
            path,
            table: Arc::new(Mutex::new(table)),
        })
    }

    /// Apply `change` to a copy of the table, persist it, then commit.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut UserTable) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut guard = self.table.lock().await;
        let mut next = guard.clone();
        let result = change(&mut next)?;

        let json = serde_json::to_string_pretty(&next)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &self.path).await?;

        *guard = next;
        Ok(result)
    }
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        self.mutate(|table| table.insert(user)).await
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.table.lock().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.table.lock().await.get_by_email(email))
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<User>, AppError> {
        Ok(self.table.lock().await.list(skip, limit))
    }

    async fn update(&self, user: User) -> Result<User, AppError> {
        self.mutate(|table| table.update(user)).await
    }

    async fn delete(&self, id: UserId) -> Result<(), AppError> {
        self.mutate(|table| table.delete(id)).await
    }
}
