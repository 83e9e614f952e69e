//! Fetchers for repository health inputs on GitHub: commit and merged pull
//! request counts (GraphQL), repository metadata, pull request and contributor
//! lists (REST), and a version-pinning score over `package.json`.

pub mod client;
pub mod config;
pub mod error;
pub mod graphql;
pub mod http;
pub mod pinning;
pub mod rest;
pub mod types;
pub mod urls;

pub use client::MetricsClient;
pub use config::Config;
pub use error::MetricsError;
pub use pinning::{ManifestStatus, PinningReport};
pub use urls::RepositoryRef;
