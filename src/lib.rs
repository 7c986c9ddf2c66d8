//! Keeps the Prometheus scrape jobs and blackbox exporter modules of a
//! monitoring host in sync with registrations received over HTTP.
//!
//! Both agent configuration files are loaded once into a [`store::Store`].
//! Every change is applied in memory, written back to disk and followed by a
//! reload request to the agent that owns the file.

pub mod blackbox;
pub mod config;
mod de;
pub mod document;
pub mod prometheus;
pub mod reload;
pub mod store;
