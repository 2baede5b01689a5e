use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `COLDREACH__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// How often the sweep loop invokes the cron entry point.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Upper bound on zero-delay chain steps per enrollment per sweep.
    #[serde(default = "default_max_chain_steps")]
    pub max_chain_steps: u32,
    /// Daily limit applied to campaigns created without an explicit one.
    #[serde(default = "default_daily_limit")]
    pub default_daily_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub open_tracking: bool,
    #[serde(default = "default_true")]
    pub click_tracking: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_ai_max_words")]
    pub max_words: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("COLDREACH")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            engine: EngineConfig::default(),
            email: EmailConfig::default(),
            ai: AiConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            max_chain_steps: default_max_chain_steps(),
            default_daily_limit: default_daily_limit(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_email: default_from_email(),
            from_name: default_from_name(),
            send_timeout_ms: default_send_timeout_ms(),
            open_tracking: true,
            click_tracking: true,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_ai_model(),
            timeout_ms: default_ai_timeout_ms(),
            max_words: default_ai_max_words(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

fn default_node_id() -> String {
    "coldreach-1".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_max_chain_steps() -> u32 {
    25
}

fn default_daily_limit() -> usize {
    50
}

fn default_from_email() -> String {
    "outreach@example.com".to_string()
}

fn default_from_name() -> String {
    "ColdReach".to_string()
}

fn default_send_timeout_ms() -> u64 {
    10_000
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_timeout_ms() -> u64 {
    15_000
}

fn default_ai_max_words() -> usize {
    150
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_true() -> bool {
    true
}
