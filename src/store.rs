use crate::document::{Document, Section};
use crate::reload::{ReloadNotifier, ReloadOutcome};
use http::StatusCode;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Whether a mutation changed the section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Changed,
    Unchanged,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("unable to persist configuration: {0:#}")]
    Persist(anyhow::Error),

    #[error("unable to reach {agent} to reload its configuration: {source}")]
    ReloadUnreachable {
        agent: &'static str,
        source: reqwest::Error,
    },

    #[error("{agent} rejected the configuration reload with {status}: {body}")]
    ReloadRejected {
        agent: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("unable to apply change: {0:#}")]
    Mutation(anyhow::Error),
}

/// One agent configuration document together with the agent that consumes it.
///
/// All updates go through a single lock, so find, mutate, persist and reload
/// of one document never interleave. Two stores never block each other.
#[derive(Debug)]
pub struct Store<S: Section> {
    document: Mutex<Document<S>>,
    notifier: ReloadNotifier,
}

impl<S: Section> Store<S> {
    pub fn new(document: Document<S>, notifier: ReloadNotifier) -> Self {
        Self {
            document: Mutex::new(document),
            notifier,
        }
    }

    pub async fn read<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let document = self.document.lock().await;
        f(document.section())
    }

    /// Apply `mutate` to the section, write the document and ask the agent to
    /// reload it.
    ///
    /// The mutation runs on a copy. If it reports [`Change::Unchanged`] nothing
    /// is written and the agent is not contacted. If the write fails the live
    /// section is left as it was and the agent is not contacted either.
    pub async fn update<F>(&self, mutate: F) -> Result<Change, UpdateError>
    where
        F: FnOnce(&mut S) -> anyhow::Result<Change>,
    {
        let mut document = self.document.lock().await;

        let mut section = document.section().clone();
        if mutate(&mut section).map_err(UpdateError::Mutation)? == Change::Unchanged {
            return Ok(Change::Unchanged);
        }

        if let Err(err) = document.persist(section) {
            error!(agent = self.notifier.agent(), path = ?document.path(), err = ?err, "Unable to persist configuration");
            return Err(UpdateError::Persist(err));
        }
        info!(agent = self.notifier.agent(), path = ?document.path(), "Persisted configuration");

        let agent = self.notifier.agent();
        match self.notifier.reload().await {
            ReloadOutcome::Reloaded => Ok(Change::Changed),
            ReloadOutcome::Unreachable(source) => {
                Err(UpdateError::ReloadUnreachable { agent, source })
            }
            ReloadOutcome::Rejected { status, body } => Err(UpdateError::ReloadRejected {
                agent,
                status,
                body,
            }),
        }
    }
}
