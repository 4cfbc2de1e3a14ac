use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  pub rpc: RpcSettings,
  #[serde(default)]
  pub repository: RepositorySettings,
  #[serde(default)]
  pub sync: SyncSettings,
  #[serde(default)]
  pub notification: NotificationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
  pub url: String,
  #[serde(default)]
  pub user: Option<String>,
  #[serde(default)]
  pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositorySettings {
  #[serde(default = "default_memory_db")]
  pub memory_db: bool,
  #[serde(default)]
  pub postgresql_url: String,
}

impl Default for RepositorySettings {
  fn default() -> Self {
    Self {
      memory_db: default_memory_db(),
      postgresql_url: String::new(),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
  /// Blocks requested per batch RPC round trip during a catch-up scan.
  #[serde(default = "default_batch_size")]
  pub batch_size: u64,
  /// How long a block notification waits for a running scan before it is dropped.
  #[serde(default = "default_lock_timeout")]
  pub new_block_lock_timeout_secs: u64,
  #[serde(default = "default_scan_interval")]
  pub scan_interval_secs: u64,
  #[serde(default = "default_tip_poll_interval")]
  pub tip_poll_interval_secs: u64,
  #[serde(default = "default_mempool_interval")]
  pub mempool_interval_secs: u64,
}

impl Default for SyncSettings {
  fn default() -> Self {
    Self {
      batch_size: default_batch_size(),
      new_block_lock_timeout_secs: default_lock_timeout(),
      scan_interval_secs: default_scan_interval(),
      tip_poll_interval_secs: default_tip_poll_interval(),
      mempool_interval_secs: default_mempool_interval(),
    }
  }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationSettings {
  #[serde(default)]
  pub sqs_queue_url: Option<String>,
  #[serde(default)]
  pub sqs_region: Option<String>,
}

fn default_memory_db() -> bool {
  false
}

fn default_batch_size() -> u64 {
  100
}

fn default_lock_timeout() -> u64 {
  3
}

fn default_scan_interval() -> u64 {
  60
}

fn default_tip_poll_interval() -> u64 {
  2
}

fn default_mempool_interval() -> u64 {
  5
}

impl Settings {
  pub fn new() -> Result<Self, config::ConfigError> {
    Self::from_path("./config.toml")
  }

  pub fn from_path(path: &str) -> Result<Self, config::ConfigError> {
    let env_prefix = "APP"; // Environment variable prefix (e.g., APP_RPC__URL=...)

    let builder = config::Config::builder()
      .add_source(config::File::with_name(path).required(true))
      // E.g., `APP_RPC__URL=http://...` would override config file value
      .add_source(config::Environment::with_prefix(env_prefix).separator("__"));

    let settings: Settings = builder.build()?.try_deserialize()?;
    if settings.sync.batch_size == 0 {
      return Err(config::ConfigError::Message("sync.batch_size must be positive".to_string()));
    }

    Ok(settings)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sync_defaults_apply_when_section_missing() {
    let settings: Settings = config::Config::builder()
      .add_source(config::File::from_str(
        "[rpc]\nurl = \"http://127.0.0.1:9902\"\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(settings.rpc.url, "http://127.0.0.1:9902");
    assert_eq!(settings.sync.batch_size, 100);
    assert_eq!(settings.sync.new_block_lock_timeout_secs, 3);
    assert!(!settings.repository.memory_db);
    assert!(settings.notification.sqs_queue_url.is_none());
  }
}
