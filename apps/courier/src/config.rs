use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use courier_store::S3Config;

fn default_status_key() -> String {
    "olive_process_status.csv".to_string()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("./results")
}

fn default_engine_command() -> String {
    "olivepyworkflow".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bucket_name: String,
    #[serde(default = "default_status_key")]
    pub status_csv_filename: String,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    pub aws: AwsConfig,
    /// Only needed by `process`; uploaders and fetchers run without it.
    #[serde(default)]
    pub engine: Option<EngineConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_command")]
    pub command: String,
    pub workflow: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn s3(&self) -> S3Config {
        S3Config {
            bucket: self.bucket_name.clone(),
            region: self.aws.region.clone(),
            access_key_id: self.aws.access_key_id.clone(),
            secret_access_key: self.aws.secret_access_key.clone(),
            session_token: self.aws.session_token.clone(),
            endpoint_url: self.aws.endpoint_url.clone(),
            force_path_style: self.aws.force_path_style,
        }
    }

    pub fn engine(&self) -> anyhow::Result<&EngineConfig> {
        self.engine
            .as_ref()
            .context("config has no `engine` section, required for processing")
    }
}
