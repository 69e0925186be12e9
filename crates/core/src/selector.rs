//! Picks a track for an analysed scene.
//!
//! Moods are tried in the order primary, secondary, default. The first mood
//! whose candidate folders hold at least one track wins, and a track is then
//! drawn uniformly from all of that mood's tracks taken together, so a folder
//! with more tracks is proportionally more likely to supply the pick.

use crate::catalog::Catalog;
use crate::models::{SceneAnalysis, Track};
use crate::moods::{Mood, DEFAULT_MOOD};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no tracks available for moods {tried:?}")]
    NoTracksAvailable { tried: Vec<Mood> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    Primary,
    Secondary,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mood: Mood,
    pub tier: FallbackTier,
    pub track: Track,
}

/// Moods to try, in order, without repeats.
pub fn fallback_chain(analysis: &SceneAnalysis) -> Vec<(Mood, FallbackTier)> {
    let mut chain = vec![(analysis.primary_mood, FallbackTier::Primary)];
    if let Some(secondary) = analysis.secondary_mood {
        chain.push((secondary, FallbackTier::Secondary));
    }
    chain.push((DEFAULT_MOOD, FallbackTier::Default));
    let mut seen = Vec::with_capacity(chain.len());
    chain.retain(|(mood, _)| {
        if seen.contains(mood) {
            false
        } else {
            seen.push(*mood);
            true
        }
    });
    chain
}

/// All tracks in `mood`'s folders that currently hold tracks, flattened in
/// folder order.
pub fn candidate_tracks<'a>(mood: Mood, catalog: &'a Catalog) -> Vec<&'a Track> {
    mood.folders()
        .iter()
        .filter_map(|folder| catalog.tracks(folder))
        .flatten()
        .collect()
}

pub fn select_track<R: Rng + ?Sized>(
    analysis: &SceneAnalysis,
    catalog: &Catalog,
    rng: &mut R,
) -> Result<Selection, SelectionError> {
    let chain = fallback_chain(analysis);
    for (mood, tier) in &chain {
        let candidates = candidate_tracks(*mood, catalog);
        if candidates.is_empty() {
            warn!(mood = %mood, tier = ?tier, "no tracks for mood, falling through");
            continue;
        }
        let track = candidates[rng.random_range(0..candidates.len())].clone();
        info!(
            mood = %mood,
            tier = ?tier,
            candidates = candidates.len(),
            path = %track.path,
            "selected track"
        );
        return Ok(Selection {
            mood: *mood,
            tier: *tier,
            track,
        });
    }
    Err(SelectionError::NoTracksAvailable {
        tried: chain.into_iter().map(|(m, _)| m).collect(),
    })
}
