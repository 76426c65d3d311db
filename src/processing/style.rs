//! Tone presets applied to every generation request.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Enumerated tone/format preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Clear, neutral study-notes tone.
    #[default]
    Default,
    /// Terse, scannable bullet points.
    Bullet,
    /// Connected prose that explains ideas in context.
    Narrative,
    /// Conclusions first, aimed at decision makers.
    Executive,
}

impl Style {
    /// Every preset, in display order.
    pub const ALL: [Style; 4] = [
        Style::Default,
        Style::Bullet,
        Style::Narrative,
        Style::Executive,
    ];

    /// Resolve a user-supplied style name. Unknown names map to [`Style::Default`].
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "bullet" => Self::Bullet,
            "narrative" => Self::Narrative,
            "executive" => Self::Executive,
            "default" => Self::Default,
            other => {
                tracing::debug!(style = other, "Unknown style; using default tone");
                Self::Default
            }
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Bullet => "bullet",
            Self::Narrative => "narrative",
            Self::Executive => "executive",
        }
    }

    /// Tone instruction appended to system prompts.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Default => {
                "Write in a clear, concise, neutral tone suitable for a college student reviewing the material."
            }
            Self::Bullet => {
                "Favor short, scannable bullet points over prose; keep each point to a single line where possible."
            }
            Self::Narrative => {
                "Write in a flowing narrative style, using connected paragraphs that explain how the ideas relate."
            }
            Self::Executive => {
                "Write for a busy executive: lead with conclusions, then decisions, risks, and impact; skip background detail."
            }
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Style {
    fn from(value: &str) -> Self {
        Self::parse_lossy(value)
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lossy(&raw))
    }
}
