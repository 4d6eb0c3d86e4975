use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub serial: SerialConfig,
    pub storage: StorageConfig,
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Device path or COM name, e.g. "/dev/ttyACM0" or "COM6".
    pub port: String,
    pub baud_rate: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Wait after opening the port while the board resets.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_reset_delay_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub path: String,
    /// Save whenever the day's entry count is a multiple of this.
    #[serde(default = "default_autosave_every")]
    pub autosave_every: u32,
    /// Pending save requests before autosaves are dropped.
    #[serde(default = "default_writer_queue_capacity")]
    pub writer_queue_capacity: usize,
}

fn default_autosave_every() -> u32 {
    crate::aggregator::DEFAULT_AUTOSAVE_EVERY
}

fn default_writer_queue_capacity() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max dashboard updates buffered per /ws/dashboard client (slow clients may lag).
    pub broadcast_capacity: usize,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.serial.port.is_empty(), "serial.port must be non-empty");
        anyhow::ensure!(
            self.serial.baud_rate > 0,
            "serial.baud_rate must be > 0, got {}",
            self.serial.baud_rate
        );
        anyhow::ensure!(
            self.serial.read_timeout_ms > 0,
            "serial.read_timeout_ms must be > 0, got {}",
            self.serial.read_timeout_ms
        );
        anyhow::ensure!(
            self.serial.poll_interval_ms > 0,
            "serial.poll_interval_ms must be > 0, got {}",
            self.serial.poll_interval_ms
        );
        anyhow::ensure!(!self.storage.path.is_empty(), "storage.path must be non-empty");
        anyhow::ensure!(
            self.storage.autosave_every > 0,
            "storage.autosave_every must be > 0, got {}",
            self.storage.autosave_every
        );
        anyhow::ensure!(
            self.storage.writer_queue_capacity > 0,
            "storage.writer_queue_capacity must be > 0, got {}",
            self.storage.writer_queue_capacity
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        Ok(())
    }
}
