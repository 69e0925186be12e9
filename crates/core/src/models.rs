use crate::moods::{Mood, DEFAULT_MOOD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker prefixed to `reasoning` when the classifier had to fall back.
pub const FALLBACK_MARKER: &str = "fallback used";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAnalysis {
    pub primary_mood: Mood,
    pub secondary_mood: Option<Mood>,
    pub intensity: f64,
    pub emotional_tags: Vec<String>,
    pub reasoning: String,
    #[serde(default)]
    pub fallback: bool,
}

impl SceneAnalysis {
    pub fn new(
        primary_mood: Mood,
        secondary_mood: Option<Mood>,
        intensity: f64,
        emotional_tags: Vec<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        let mut tags: Vec<String> = Vec::with_capacity(emotional_tags.len());
        for tag in emotional_tags {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Self {
            primary_mood,
            secondary_mood,
            intensity: clamp_intensity(intensity),
            emotional_tags: tags,
            reasoning: reasoning.into(),
            fallback: false,
        }
    }

    pub fn fallback(cause: &str) -> Self {
        Self {
            primary_mood: DEFAULT_MOOD,
            secondary_mood: None,
            intensity: 0.5,
            emotional_tags: Vec::new(),
            reasoning: format!("{FALLBACK_MARKER}: {cause}"),
            fallback: true,
        }
    }
}

/// Clamps to [0, 1]; non-finite values become the neutral 0.5.
pub fn clamp_intensity(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub folder: String,
    pub filename: String,
    pub path: String,
}

impl Track {
    pub fn new(folder: &str, filename: &str) -> Self {
        Self {
            folder: folder.to_string(),
            filename: filename.to_string(),
            path: format!("{}/{}", folder, filename),
        }
    }

    /// Builds a track from an object key of the form `folder/.../file`.
    pub fn from_key(key: &str) -> Option<Self> {
        let (folder, rest) = key.split_once('/')?;
        let filename = rest.rsplit('/').next()?;
        if folder.is_empty() || filename.is_empty() {
            return None;
        }
        Some(Self {
            folder: folder.to_string(),
            filename: filename.to_string(),
            path: key.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLink {
    pub track: Track,
    pub url: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicInfo {
    pub mood: Mood,
    pub filename: String,
    pub file_path: String,
    pub streaming_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub analysis: SceneAnalysis,
    pub music: MusicInfo,
}
