use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

const DEFAULT_LOG_LEVEL: &str = "info,sqlx=warn";

#[cfg(feature = "loki")]
type LokiLayer = tracing_loki::Layer;
#[cfg(not(feature = "loki"))]
type LokiLayer = tracing_subscriber::layer::Identity;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            loki_url: std::env::var("LOKI_URL").ok(),
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "finport-ai".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.loki_target().map(|_| ())
    }

    /// Where to ship logs, if Loki shipping is switched on.
    pub fn loki_target(&self) -> Result<Option<Url>, String> {
        if !self.loki_enabled {
            return Ok(None);
        }
        let raw = self
            .loki_url
            .as_deref()
            .ok_or_else(|| "LOKI_ENABLED is true but LOKI_URL is not set".to_string())?;
        Url::parse(raw)
            .map(Some)
            .map_err(|e| format!("Invalid LOKI_URL {}: {}", raw, e))
    }

    /// Filter from `log_level`; an unparseable directive falls back to the default.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}

/// Install the global subscriber. Call once, from inside the tokio runtime.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let loki = loki_layer(&config)?;
    let shipping = loki.is_some();

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(loki)
        .try_init()?;

    tracing::info!(
        "📊 Logging initialized for {} ({}), loki={}",
        config.service_name,
        config.environment,
        shipping
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig) -> Result<Option<LokiLayer>, Box<dyn std::error::Error>> {
    let Some(url) = config.loki_target()? else {
        return Ok(None);
    };

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered events to Loki.
    tokio::spawn(task);

    Ok(Some(layer))
}

#[cfg(not(feature = "loki"))]
fn loki_layer(config: &LoggingConfig) -> Result<Option<LokiLayer>, Box<dyn std::error::Error>> {
    if config.loki_target()?.is_some() {
        return Err("LOKI_ENABLED is true but the binary was built without the loki feature".into());
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(loki_enabled: bool, loki_url: Option<&str>) -> LoggingConfig {
        LoggingConfig {
            loki_enabled,
            loki_url: loki_url.map(str::to_string),
            service_name: "finport-ai".to_string(),
            environment: "test".to_string(),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_loki_requires_url() {
        assert!(config(true, None).validate().is_err());
        assert!(config(true, Some("http://loki:3100")).validate().is_ok());
        assert!(config(false, None).validate().is_ok());
    }

    #[test]
    fn test_loki_target_only_when_enabled() {
        assert_eq!(config(false, Some("http://loki:3100")).loki_target(), Ok(None));

        let url = config(true, Some("http://loki:3100")).loki_target().unwrap().unwrap();
        assert_eq!(url.host_str(), Some("loki"));
        assert_eq!(url.port(), Some(3100));
    }

    #[test]
    fn test_malformed_loki_url_is_rejected() {
        let err = config(true, Some("not a url")).loki_target().unwrap_err();
        assert!(err.starts_with("Invalid LOKI_URL"));
    }

    #[test]
    fn test_bad_filter_directive_falls_back() {
        let mut cfg = config(false, None);
        cfg.log_level = "info,sqlx=notalevel".to_string();
        assert_eq!(cfg.env_filter().to_string(), EnvFilter::new(DEFAULT_LOG_LEVEL).to_string());
    }
}
