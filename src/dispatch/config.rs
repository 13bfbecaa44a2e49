use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::caption::CaptionConfig;
use crate::contracts::{ConfigError, MediaKind};

/// Media selector used by routing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSelector {
    Video,
    Audio,
    Photo,
    Animation,
    /// Documents, optionally restricted to one MIME type (case-insensitive).
    Document {
        #[serde(default)]
        mime_type: Option<String>,
    },
}

impl MediaSelector {
    pub fn matches(&self, kind: &MediaKind) -> bool {
        match (self, kind) {
            (MediaSelector::Video, MediaKind::Video)
            | (MediaSelector::Audio, MediaKind::Audio)
            | (MediaSelector::Photo, MediaKind::Photo)
            | (MediaSelector::Animation, MediaKind::Animation) => true,
            (MediaSelector::Document { mime_type: None }, MediaKind::Document { .. }) => true,
            (
                MediaSelector::Document {
                    mime_type: Some(wanted),
                },
                MediaKind::Document {
                    mime_type: Some(actual),
                },
            ) => wanted.eq_ignore_ascii_case(actual),
            _ => false,
        }
    }
}

/// Which media kinds get a new caption and which get cleared.
/// Kinds matched by neither list are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub transform: Vec<MediaSelector>,
    /// Checked before `transform`.
    pub clear: Vec<MediaSelector>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            transform: vec![MediaSelector::Video],
            clear: vec![MediaSelector::Document {
                mime_type: Some("application/pdf".into()),
            }],
        }
    }
}

/// Rule file contents: `[caption]` and `[routing]` tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub caption: CaptionConfig,
    pub routing: RoutingConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads the file named by `CAPTIONER_CONFIG`, or the built-in default
    /// when the variable is unset. A named file that cannot be read or
    /// parsed is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("CAPTIONER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!(path = %path, "Loading caption rules");
                Self::from_file(path.trim())
            }
            _ => {
                tracing::info!("CAPTIONER_CONFIG not set, using default caption rules");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf() -> MediaKind {
        MediaKind::Document {
            mime_type: Some("application/pdf".into()),
        }
    }

    #[test]
    fn selector_matching() {
        assert!(MediaSelector::Video.matches(&MediaKind::Video));
        assert!(!MediaSelector::Video.matches(&MediaKind::Audio));

        let any_doc = MediaSelector::Document { mime_type: None };
        assert!(any_doc.matches(&pdf()));
        assert!(any_doc.matches(&MediaKind::Document { mime_type: None }));

        let pdf_only = MediaSelector::Document {
            mime_type: Some("APPLICATION/PDF".into()),
        };
        assert!(pdf_only.matches(&pdf()));
        assert!(!pdf_only.matches(&MediaKind::Document { mime_type: None }));
        assert!(!pdf_only.matches(&MediaKind::Document {
            mime_type: Some("application/zip".into())
        }));
    }

    #[test]
    fn parses_pipeline_file() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [caption.mode]
            kind = "single_field"

            [routing]
            transform = [{ kind = "video" }, { kind = "audio" }]
            clear = []
            "#,
        )
        .unwrap();
        assert_eq!(config.caption.mode.name(), "single_field");
        assert_eq!(config.routing.transform.len(), 2);
        assert!(config.routing.clear.is_empty());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = PipelineConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
