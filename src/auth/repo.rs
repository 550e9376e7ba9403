use std::sync::Arc;

use anyhow::Context;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::repo_types::{NewUser, User};
use crate::storage::KeyValueStore;

pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "currentUser";

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("email already registered")]
    EmailTaken,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// User collection stored as one JSON array under [`USERS_KEY`].
///
/// Writes go through a single lock so the email uniqueness check and the
/// append are one step.
#[derive(Clone)]
pub struct UserRepo {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl UserRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<User>> {
        match self.store.get(USERS_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).context("parse stored users"),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.list().await?.into_iter().find(|u| u.id == id))
    }

    /// Find a user by exact email.
    pub async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.list().await?.into_iter().find(|u| u.email == email))
    }

    pub async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        self.create_at(new, OffsetDateTime::now_utc()).await
    }

    async fn create_at(&self, new: NewUser, now: OffsetDateTime) -> Result<User, CreateUserError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.list().await?;
        if users.iter().any(|u| u.email == new.email) {
            return Err(CreateUserError::EmailTaken);
        }

        let mut id = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        if let Some(max) = users.iter().map(|u| u.id).max() {
            if id <= max {
                id = max + 1;
            }
        }

        let user = User {
            id,
            username: new.username,
            email: new.email,
            phone_number: new.phone_number,
            sex: new.sex,
            password: new.password,
            created_at: now,
        };
        users.push(user.clone());

        let raw = serde_json::to_string(&users).context("encode users")?;
        self.store.put(USERS_KEY, raw).await?;
        debug!(user_id = user.id, total = users.len(), "user appended");
        Ok(user)
    }
}

/// The session pointer: a copy of one user record under [`CURRENT_USER_KEY`].
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` when absent, `Err` when present but unreadable.
    pub async fn load(&self) -> anyhow::Result<Option<User>> {
        match self.store.get(CURRENT_USER_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .context("parse stored session"),
            None => Ok(None),
        }
    }

    pub async fn save(&self, user: &User) -> anyhow::Result<()> {
        let raw = serde_json::to_string(user).context("encode session")?;
        self.store.put(CURRENT_USER_KEY, raw).await
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.store.remove(CURRENT_USER_KEY).await
    }
}
