//! Version-pinning score: the share of declared dependencies whose version
//! specifier is an exact `N(.N)*` version rather than a range.

use crate::client::MetricsClient;
use crate::error::MetricsError;
use crate::http;
use crate::urls;
use log::{debug, warn};
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const MANIFEST_FILE: &str = "package.json";

// Literal pattern; tests::classifies_specifiers exercises it.
static PINNED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("pinned version pattern compiles"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyManifest {
    pub dependencies: BTreeMap<String, String>,
    /// Dependencies whose version was not a JSON string; kept with an empty version.
    pub coerced: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    dependencies: Option<BTreeMap<String, Value>>,
}

impl DependencyManifest {
    /// Decode a manifest body.
    ///
    /// Fails only when the body is not JSON or `dependencies` is not an object.
    /// A version that is not a string (`null`, a number, an object) is kept as
    /// an empty specifier, which never counts as pinned.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let raw: RawManifest = serde_json::from_str(body)?;
        let mut coerced = Vec::new();
        let dependencies = raw
            .dependencies
            .unwrap_or_default()
            .into_iter()
            .map(|(name, version)| match version {
                Value::String(v) => (name, v),
                _ => {
                    coerced.push(name.clone());
                    (name, String::new())
                }
            })
            .collect();
        Ok(Self {
            dependencies,
            coerced,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ManifestStatus {
    Parsed,
    /// The raw host had no manifest on the default branch.
    Missing,
    /// A manifest was served but did not decode.
    Unreadable,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PinningReport {
    pub ratio: f64,
    pub pinned: usize,
    pub total: usize,
    pub manifest: ManifestStatus,
}

impl PinningReport {
    pub fn from_manifest(manifest: &DependencyManifest) -> Self {
        Self {
            ratio: pinning_ratio(&manifest.dependencies),
            pinned: count_pinned(&manifest.dependencies),
            total: manifest.dependencies.len(),
            manifest: ManifestStatus::Parsed,
        }
    }

    /// No dependencies could be inspected; scored as fully pinned.
    fn vacuous(manifest: ManifestStatus) -> Self {
        Self {
            ratio: 1.0,
            pinned: 0,
            total: 0,
            manifest,
        }
    }
}

pub fn is_pinned(version: &str) -> bool {
    PINNED_VERSION.is_match(version)
}

/// Fraction of pinned specifiers; 1.0 for an empty map.
pub fn pinning_ratio(dependencies: &BTreeMap<String, String>) -> f64 {
    if dependencies.is_empty() {
        return 1.0;
    }
    count_pinned(dependencies) as f64 / dependencies.len() as f64
}

fn count_pinned(dependencies: &BTreeMap<String, String>) -> usize {
    dependencies.values().filter(|v| is_pinned(v)).count()
}

impl MetricsClient {
    /// Score the `package.json` found on the repository's default branch.
    pub async fn version_pinning(&self, web_url: &str) -> Result<PinningReport, MetricsError> {
        let branch = self.default_branch_name(web_url).await?;
        let url = urls::raw_content_url(&self.cfg, web_url, &branch, MANIFEST_FILE);
        let resp = http::rest_get(&self.http, &self.cfg, &url, http::ANY_CONTENT).await?;
        if resp.status == StatusCode::NOT_FOUND {
            debug!("{} not found at {}", MANIFEST_FILE, url);
            return Ok(PinningReport::vacuous(ManifestStatus::Missing));
        }
        let resp = resp.error_for_status()?;
        match DependencyManifest::parse(&resp.body) {
            Ok(manifest) => {
                if !manifest.coerced.is_empty() {
                    warn!(
                        "{} at {}: non-string versions scored as unpinned: {}",
                        MANIFEST_FILE,
                        url,
                        manifest.coerced.join(", ")
                    );
                }
                Ok(PinningReport::from_manifest(&manifest))
            }
            Err(e) => {
                warn!("could not decode {} from {}: {}", MANIFEST_FILE, url, e);
                Ok(PinningReport::vacuous(ManifestStatus::Unreadable))
            }
        }
    }
}
