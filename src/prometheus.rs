use crate::document::Section;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// The `scrape_configs` list of a Prometheus configuration file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrapeConfigs(pub Vec<ScrapeConfigEntry>);

impl Section for ScrapeConfigs {
    const KEY: &'static str = "scrape_configs";
}

/// One element of `scrape_configs`.
///
/// Jobs that fit [`ScrapeConfig`] are decoded into it. Anything else, e.g. a
/// job with numeric label values, is kept as the YAML value it was read as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeConfigEntry {
    Typed(ScrapeConfig),
    Opaque(Value),
}

impl ScrapeConfigEntry {
    pub fn job_name(&self) -> Option<&str> {
        match self {
            ScrapeConfigEntry::Typed(scrape_config) => Some(&scrape_config.job_name),
            ScrapeConfigEntry::Opaque(value) => value.get("job_name").and_then(Value::as_str),
        }
    }

    pub fn as_typed(&self) -> Option<&ScrapeConfig> {
        match self {
            ScrapeConfigEntry::Typed(scrape_config) => Some(scrape_config),
            ScrapeConfigEntry::Opaque(_) => None,
        }
    }
}

impl From<ScrapeConfig> for ScrapeConfigEntry {
    fn from(scrape_config: ScrapeConfig) -> Self {
        ScrapeConfigEntry::Typed(scrape_config)
    }
}

/// A single Prometheus scrape job. Only the fields we generate are typed, the
/// rest of the job (`scheme`, `kubernetes_sd_configs`, ...) is carried in
/// `other` so jobs that were not created by us survive a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub job_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_configs: Vec<StaticScrapeConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relabel_configs: Vec<RelabelConfig>,

    #[serde(flatten)]
    pub other: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticScrapeConfig {
    pub targets: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelabelConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_labels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,

    #[serde(flatten)]
    pub other: Mapping,
}

impl RelabelConfig {
    fn new(source_label: Option<&str>, target_label: &str, replacement: Option<&str>) -> Self {
        RelabelConfig {
            source_labels: source_label.into_iter().map(str::to_string).collect(),
            target_label: Some(target_label.to_string()),
            replacement: replacement.map(str::to_string),
            other: Mapping::new(),
        }
    }
}

/// A probe target registration as it is received by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrapeJob {
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub unique_name: String,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub target_urls: Vec<String>,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub prober: String,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub env: String,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub system_alert_id: String,
}

impl ScrapeJob {
    /// Convert the registration into a scrape job that probes every target
    /// through the blackbox exporter at `probe_address`.
    ///
    /// The relabel rules move the target into the `target` query parameter,
    /// keep it as the `instance` label and finally point the scrape itself at
    /// the exporter.
    pub fn into_scrape_config(self, probe_address: &str) -> ScrapeConfig {
        let labels = BTreeMap::from([
            ("env".to_string(), self.env),
            ("system_alert_id".to_string(), self.system_alert_id),
        ]);

        ScrapeConfig {
            job_name: self.unique_name,
            metrics_path: Some("/probe".to_string()),
            params: BTreeMap::from([("module".to_string(), vec![self.prober])]),
            static_configs: vec![StaticScrapeConfig {
                targets: self.target_urls,
                labels,
            }],
            relabel_configs: vec![
                RelabelConfig::new(Some("__address__"), "__param_target", None),
                RelabelConfig::new(Some("__param_target"), "instance", None),
                RelabelConfig::new(None, "__address__", Some(probe_address)),
            ],
            other: Mapping::new(),
        }
    }
}

/// Where an upserted scrape job ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Replaced(usize),
    Appended(usize),
}

impl ScrapeConfigs {
    pub fn find_index(&self, job_name: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|entry| entry.job_name() == Some(job_name))
    }

    /// Replace the job with the same name in place, or append it when there is
    /// none yet. The previous job is discarded completely.
    pub fn upsert(&mut self, scrape_config: ScrapeConfig) -> Upsert {
        match self.find_index(&scrape_config.job_name) {
            Some(index) => {
                debug!(job_name = %scrape_config.job_name, index, "Replacing scrape config");
                self.0[index] = scrape_config.into();
                Upsert::Replaced(index)
            }
            None => {
                debug!(job_name = %scrape_config.job_name, "Appending scrape config");
                self.0.push(scrape_config.into());
                Upsert::Appended(self.0.len() - 1)
            }
        }
    }

    /// Remove the job called `job_name`, keeping the order of the remaining
    /// jobs. Returns `None` if there was no such job.
    pub fn remove(&mut self, job_name: &str) -> Option<ScrapeConfigEntry> {
        let index = self.find_index(job_name)?;
        Some(self.0.remove(index))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
