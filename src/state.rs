use std::sync::Arc;

use tokio::sync::Mutex;

use crate::analysis::client::AnalysisClient;
use crate::auth::repo::{SessionStore, UserRepo};
use crate::config::AppConfig;
use crate::router::Navigator;
#[cfg(test)]
use crate::config::AnalysisConfig;
#[cfg(test)]
use crate::storage::MemoryStore;
use crate::storage::{FileStore, KeyValueStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserRepo,
    pub sessions: SessionStore,
    pub analyzer: AnalysisClient,
    /// Page, session and food-analysis screen of the single client.
    pub shell: Arc<Mutex<Navigator>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(FileStore::open(&config.store_path).await?) as Arc<dyn KeyValueStore>;
        Self::from_parts(config, store).await
    }

    pub async fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn KeyValueStore>,
    ) -> anyhow::Result<Self> {
        let users = UserRepo::new(store.clone());
        let sessions = SessionStore::new(store);
        let analyzer = AnalysisClient::new(&config.analysis)?;
        let navigator = Navigator::restore(&sessions).await;
        Ok(Self {
            config,
            users,
            sessions,
            analyzer,
            shell: Arc::new(Mutex::new(navigator)),
        })
    }

    #[cfg(test)]
    /// In-memory state pointing the analyzer at `endpoint`.
    pub fn fake_with_endpoint(endpoint: &str) -> Self {
        let config = Arc::new(AppConfig {
            store_path: "unused.json".into(),
            analysis: AnalysisConfig {
                endpoint: endpoint.into(),
                timeout_secs: 5,
            },
            max_upload_bytes: 1024 * 1024,
        });
        let store = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
        let analyzer = AnalysisClient::new(&config.analysis).expect("http client builds");
        Self {
            config,
            users: UserRepo::new(store.clone()),
            sessions: SessionStore::new(store),
            analyzer,
            shell: Arc::new(Mutex::new(Navigator::new())),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_endpoint("http://127.0.0.1:9/analyze")
    }
}
