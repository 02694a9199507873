//! Static deployment metadata shipped alongside the node.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest property naming the recorder image tag.
pub const RECORDER_VERSION_PROP: &str = "calls_recorder_version";

/// Image the recording job runner is pinned to, without tag.
pub const RECORDER_IMAGE: &str = "mattermost/calls-recorder";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Deployment manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Manifest {
    /// Identifier used as owner of the service identity.
    pub id: String,

    #[serde(default)]
    pub version: String,

    /// Free-form properties.
    #[serde(default)]
    pub props: HashMap<String, serde_json::Value>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Recorder version, when present as a string property.
    pub fn recorder_version(&self) -> Option<&str> {
        self.props
            .get(RECORDER_VERSION_PROP)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Full job runner reference (`mattermost/calls-recorder:<version>`).
    pub fn recorder_image(&self) -> Option<String> {
        self.recorder_version()
            .map(|version| format!("{RECORDER_IMAGE}:{version}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_image() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"id": "calls", "version": "1.2.0", "props": {"calls_recorder_version": "v0.8.3"}}"#,
        )
        .unwrap();
        assert_eq!(manifest.recorder_image().as_deref(), Some("mattermost/calls-recorder:v0.8.3"));
    }

    #[test]
    fn test_non_string_version_is_ignored() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"id": "calls", "props": {"calls_recorder_version": 8}}"#).unwrap();
        assert_eq!(manifest.recorder_version(), None);

        let bare: Manifest = serde_json::from_str(r#"{"id": "calls"}"#).unwrap();
        assert_eq!(bare.recorder_image(), None);
    }
}
