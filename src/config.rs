use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_ANALYSIS_ENDPOINT: &str = "https://qbyjz-wyaaa-aaaab-qbnhq-cai.icp0.io";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub analysis: AnalysisConfig,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_path = std::env::var("EATSMART_STORE_PATH")
            .unwrap_or_else(|_| "./data/local_storage.json".into())
            .into();
        let analysis = AnalysisConfig {
            endpoint: std::env::var("ANALYSIS_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_ENDPOINT.into()),
            timeout_secs: parse_var("ANALYSIS_TIMEOUT_SECS", 30)?,
        };
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?;
        Ok(Self {
            store_path,
            analysis,
            max_upload_bytes,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
