use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub refresh: RefreshSettings,
    /// When absent the service runs in demo mode: in-memory persistence and
    /// a synthetic telemetry source.
    pub gateway: Option<GatewaySettings>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    pub default_interval_ms: u64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            default_interval_ms: 5000,
            min_interval_ms: 3000,
            max_interval_ms: 10000,
        }
    }
}

impl RefreshSettings {
    /// Clamp a widget-configured interval into the allowed live-source
    /// band.
    pub fn clamp_interval(&self, interval_ms: u64) -> u64 {
        interval_ms.clamp(self.min_interval_ms, self.max_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_a_config_file() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.refresh.default_interval_ms, 5000);
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_clamp_interval_to_live_band() {
        let refresh = RefreshSettings::default();

        assert_eq!(refresh.clamp_interval(1000), 3000);
        assert_eq!(refresh.clamp_interval(5000), 5000);
        assert_eq!(refresh.clamp_interval(60000), 10000);
    }
}
