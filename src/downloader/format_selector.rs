// FormatSelector - picks the stream for each quality tier
//
// Streams are considered in the extraction tool's native listing order and
// the first one matching the tier's filter wins. No custom tie-break.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::models::{QualityTier, Stream, Target, Video};

/// Bytes per megabyte as shown to the user
const MEGABYTE: f64 = 1_048_576.0;

/// Streams chosen for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Single video
    Single(Stream),
    /// One stream per playlist member, in playlist order
    Batch(Vec<Stream>),
}

impl Selection {
    /// All-or-nothing aggregation of per-member picks
    pub fn aggregate(members: Vec<Option<Stream>>) -> Option<Self> {
        members
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .map(Self::Batch)
    }

    pub fn streams(&self) -> &[Stream] {
        match self {
            Self::Single(stream) => std::slice::from_ref(stream),
            Self::Batch(streams) => streams,
        }
    }

    pub fn total_size(&self) -> u64 {
        self.streams().iter().map(|s| s.file_size).sum()
    }
}

/// Selection per tier, `None` meaning unavailable. Computed once per target.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSelections {
    by_tier: HashMap<QualityTier, Option<Selection>>,
}

impl ResolvedSelections {
    pub fn get(&self, tier: QualityTier) -> Option<&Selection> {
        self.by_tier.get(&tier).and_then(Option::as_ref)
    }

    pub fn is_available(&self, tier: QualityTier) -> bool {
        self.get(tier).is_some()
    }

    /// Total size in bytes, only when the tier is available
    pub fn total_size(&self, tier: QualityTier) -> Option<u64> {
        self.get(tier).map(Selection::total_size)
    }

    /// "12.3 MB" or "Unavailable"
    pub fn size_label(&self, tier: QualityTier) -> String {
        match self.total_size(tier) {
            Some(bytes) => FormatSelector::format_size(bytes),
            None => "Unavailable".to_string(),
        }
    }
}

/// Stream selection for the fixed quality tiers
pub struct FormatSelector;

impl FormatSelector {
    /// First stream matching the tier, if any
    pub fn select(streams: &[Stream], tier: QualityTier) -> Option<&Stream> {
        let filter = tier.filter();
        streams.iter().find(|s| filter.matches(s))
    }

    pub fn select_for_video(video: &Video, tier: QualityTier) -> Option<Stream> {
        Self::select(&video.streams, tier).cloned()
    }

    /// Resolve every tier for a target
    pub fn resolve_selections(target: &Target) -> ResolvedSelections {
        let by_tier = QualityTier::ALL
            .iter()
            .map(|&tier| {
                let selection = match target {
                    Target::Video(video) => {
                        Self::select_for_video(video, tier).map(Selection::Single)
                    }
                    Target::Playlist(playlist) => Selection::aggregate(
                        playlist
                            .videos
                            .iter()
                            .map(|video| Self::select_for_video(video, tier))
                            .collect(),
                    ),
                };
                (tier, selection)
            })
            .collect();

        ResolvedSelections { by_tier }
    }

    /// Format file size for display, megabytes rounded to one decimal
    pub fn format_size(bytes: u64) -> String {
        let mb = (bytes as f64 / MEGABYTE * 10.0).round() / 10.0;
        format!("{:.1} MB", mb)
    }
}
