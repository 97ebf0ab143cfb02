use serde::Deserialize;

/// Main configuration structure for Veilcrawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Ordered list of locators to crawl
    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub anonymizer: AnonymizerConfig,

    #[serde(default)]
    pub identity: IdentityConfig,
}

/// What the crawl loop does when a single target fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and surface the first error
    #[default]
    Abort,
    /// Record the failure and move on to the next target
    Skip,
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Pause between consecutive targets (seconds)
    #[serde(rename = "delay-seconds", default = "default_delay_seconds")]
    pub delay_seconds: u64,

    /// Whether the pause also follows the final target
    #[serde(rename = "delay-after-last", default)]
    pub delay_after_last: bool,

    /// Failure handling for individual targets
    #[serde(rename = "on-failure", default)]
    pub on_failure: FailurePolicy,

    /// Renew the identity and rebuild the session after this many targets
    #[serde(rename = "rotate-every", default)]
    pub rotate_every: Option<u32>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            delay_seconds: default_delay_seconds(),
            delay_after_last: false,
            on_failure: FailurePolicy::default(),
            rotate_every: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Anonymizing proxy and control port configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymizerConfig {
    /// Proxy every request is routed through, for all schemes
    #[serde(rename = "proxy-endpoint", default = "default_proxy_endpoint")]
    pub proxy_endpoint: String,

    /// Host of the control service
    #[serde(rename = "control-host", default = "default_control_host")]
    pub control_host: String,

    /// Port of the control service
    #[serde(rename = "control-port", default = "default_control_port")]
    pub control_port: u16,

    /// Control port password; bare authentication when absent
    #[serde(default)]
    pub credential: Option<String>,

    /// Upper bound on each control port exchange (seconds)
    #[serde(rename = "control-timeout", default = "default_control_timeout")]
    pub control_timeout: u64,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            proxy_endpoint: default_proxy_endpoint(),
            control_host: default_control_host(),
            control_port: default_control_port(),
            credential: None,
            control_timeout: default_control_timeout(),
        }
    }
}

/// User agent pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// User agent strings; one is picked per session
    #[serde(default = "default_identity_pool")]
    pub pool: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            pool: default_identity_pool(),
        }
    }
}

/// Browser user agents used when the configuration supplies none
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

fn default_delay_seconds() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_proxy_endpoint() -> String {
    "socks5h://127.0.0.1:9050".to_string()
}

fn default_control_host() -> String {
    "127.0.0.1".to_string()
}

fn default_control_port() -> u16 {
    9051
}

fn default_control_timeout() -> u64 {
    10
}

fn default_identity_pool() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}
