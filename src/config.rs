use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Public domain for generated URLs; overridable via SERVER_DOMAIN.
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// TTL of the cached system snapshot.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// Upper bound for one full collection pass.
    #[serde(default = "default_collect_timeout_ms")]
    pub collect_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Capacity of the recent-requests ring.
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
    /// Minimum elapsed seconds before the request rate is recomputed.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_cache_ttl_ms() -> u64 {
    2000
}

fn default_collect_timeout_ms() -> u64 {
    5000
}

fn default_recent_capacity() -> usize {
    100
}

fn default_rate_window_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
            collect_timeout_ms: default_collect_timeout_ms(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_capacity: default_recent_capacity(),
            rate_window_secs: default_rate_window_secs(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MonitoringConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.collect_timeout_ms)
    }
}

impl StatsConfig {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config = Self::load_from_str(&s)?;
        config.apply_overrides(
            std::env::var("SERVER_ADDR").ok().as_deref(),
            std::env::var("SERVER_DOMAIN").ok().as_deref(),
        )?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies startup overrides: SERVER_ADDR ("host:port") and SERVER_DOMAIN.
    pub fn apply_overrides(
        &mut self,
        addr: Option<&str>,
        domain: Option<&str>,
    ) -> anyhow::Result<()> {
        if let Some(addr) = addr {
            let (host, port) = addr
                .rsplit_once(':')
                .ok_or_else(|| anyhow::anyhow!("SERVER_ADDR must be host:port, got {addr:?}"))?;
            anyhow::ensure!(!host.is_empty(), "SERVER_ADDR host must be non-empty");
            self.server.host = host.to_string();
            self.server.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("SERVER_ADDR port: {e}"))?;
        }
        if let Some(domain) = domain {
            self.server.domain = Some(domain.to_string());
        }
        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            self.monitoring.cache_ttl_ms > 0,
            "monitoring.cache_ttl_ms must be > 0, got {}",
            self.monitoring.cache_ttl_ms
        );
        anyhow::ensure!(
            self.monitoring.collect_timeout_ms > 0,
            "monitoring.collect_timeout_ms must be > 0, got {}",
            self.monitoring.collect_timeout_ms
        );
        anyhow::ensure!(
            self.stats.recent_capacity > 0,
            "stats.recent_capacity must be > 0, got {}",
            self.stats.recent_capacity
        );
        anyhow::ensure!(
            self.stats.rate_window_secs > 0,
            "stats.rate_window_secs must be > 0, got {}",
            self.stats.rate_window_secs
        );
        Ok(())
    }
}
