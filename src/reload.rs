use http::StatusCode;
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

// Create a reqwest client that will be used for all reload requests. This
// allows for keep-alives since we are always talking to the same two agents.
static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("monitor-agent/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .expect("Unable to create reqwest client")
});

/// Result of asking an agent to reload its configuration.
#[derive(Debug)]
pub enum ReloadOutcome {
    Reloaded,

    /// The agent could not be reached, or did not answer in time.
    Unreachable(reqwest::Error),

    /// The agent answered with a non-success status code.
    Rejected { status: StatusCode, body: String },
}

/// Triggers the HTTP reload endpoint of an agent (Prometheus `/-/reload`,
/// blackbox exporter `/-/reload`).
#[derive(Debug, Clone)]
pub struct ReloadNotifier {
    agent: &'static str,
    endpoint: Url,
    timeout: Duration,
}

impl ReloadNotifier {
    pub fn new(agent: &'static str, endpoint: Url, timeout: Duration) -> Self {
        Self {
            agent,
            endpoint,
            timeout,
        }
    }

    pub fn agent(&self) -> &'static str {
        self.agent
    }

    /// Send an empty form POST to the reload endpoint. This is not retried,
    /// the outcome is reported once.
    pub async fn reload(&self) -> ReloadOutcome {
        let agent = self.agent;

        debug!(
            agent,
            endpoint = %self.endpoint,
            timeout = %humantime::format_duration(self.timeout),
            "Triggering configuration reload"
        );

        let empty: [(&str, &str); 0] = [];
        let res = CLIENT
            .post(self.endpoint.clone())
            .form(&empty)
            .timeout(self.timeout)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                error!(agent, endpoint = %self.endpoint, %err, "Unable to trigger configuration reload");
                return ReloadOutcome::Unreachable(err);
            }
        };

        let status = res.status();
        if status.is_success() {
            info!(agent, status_code = %status, "Configuration reloaded");
            return ReloadOutcome::Reloaded;
        }

        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => format!("<unable to read response body: {err}>"),
        };

        error!(agent, status_code = %status, %body, "Agent rejected the configuration reload");
        ReloadOutcome::Rejected { status, body }
    }
}
