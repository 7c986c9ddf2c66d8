use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// This struct represents the monitor-agent configuration file. It points at
/// the configuration of the two agents that are managed by this process and
/// tells us how to make them pick up a new version of that configuration.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MonitorAgentConfig {
    pub prometheus_agent: PrometheusAgent,
    pub blackbox_agent: BlackboxAgent,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusAgent {
    /// Location of the Prometheus configuration file that holds the
    /// `scrape_configs` list.
    pub config_path: PathBuf,

    /// Prometheus lifecycle endpoint, usually `http://<host>:9090/-/reload`.
    pub reload_endpoint: Url,

    #[serde(default = "default_reload_timeout", with = "humantime_serde")]
    pub reload_timeout: Duration,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BlackboxAgent {
    /// Location of the blackbox exporter configuration file that holds the
    /// `modules` map.
    pub config_path: PathBuf,

    pub reload_endpoint: Url,

    #[serde(default = "default_reload_timeout", with = "humantime_serde")]
    pub reload_timeout: Duration,

    /// Address Prometheus should send the probe requests to. This ends up as
    /// the `__address__` replacement in every generated scrape job.
    #[serde(default = "default_probe_address")]
    pub probe_address: String,
}

fn default_reload_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_probe_address() -> String {
    "127.0.0.1:9115".to_string()
}

/// Read and parse the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<MonitorAgentConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Unable to read config file {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Unable to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
prometheusAgent:
  configPath: /etc/prometheus/prometheus.yml
  reloadEndpoint: http://127.0.0.1:9090/-/reload
blackboxAgent:
  configPath: /etc/blackbox_exporter/config.yml
  reloadEndpoint: http://127.0.0.1:9115/-/reload
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(
            config.prometheus_agent.config_path,
            PathBuf::from("/etc/prometheus/prometheus.yml")
        );
        assert_eq!(
            config.prometheus_agent.reload_endpoint.as_str(),
            "http://127.0.0.1:9090/-/reload"
        );
        assert_eq!(config.prometheus_agent.reload_timeout, Duration::from_secs(10));
        assert_eq!(config.blackbox_agent.probe_address, "127.0.0.1:9115");
    }

    #[test]
    fn load_with_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
prometheusAgent:
  configPath: prometheus.yml
  reloadEndpoint: http://prometheus:9090/-/reload
  reloadTimeout: 3s
blackboxAgent:
  configPath: blackbox.yml
  reloadEndpoint: http://blackbox:9115/-/reload
  reloadTimeout: 500ms
  probeAddress: blackbox:9115
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.prometheus_agent.reload_timeout, Duration::from_secs(3));
        assert_eq!(
            config.blackbox_agent.reload_timeout,
            Duration::from_millis(500)
        );
        assert_eq!(config.blackbox_agent.probe_address, "blackbox:9115");
    }

    #[test]
    fn invalid_reload_endpoint_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
prometheusAgent:
  configPath: prometheus.yml
  reloadEndpoint: not a url
blackboxAgent:
  configPath: blackbox.yml
  reloadEndpoint: http://blackbox:9115/-/reload
"#
        )
        .unwrap();

        let _ = load_config(file.path()).expect_err("expected an invalid url error");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/does/not/exist.yml")).unwrap_err();
        assert!(format!("{err:#}").contains("/does/not/exist.yml"));
    }
}
