// Champion-select data model: runes, items, user identity and the champion
// record carried by CHAMPION_CHANGE events.

use serde::{Deserialize, Serialize};

/// Minimum number of entries in a well-formed rune page.
///
/// Slots 0 and 1 are the primary and secondary tree icons, slot 2 is the
/// keystone, 3..6 the remaining primary runes, 6..8 the secondary runes and
/// 8.. the stat shards.
pub const RUNE_PAGE_LEN: usize = 9;

const PRIMARY_TREE: usize = 0;
const SECONDARY_TREE: usize = 1;
const KEYSTONE: usize = 2;
const PRIMARY_RUNES: std::ops::Range<usize> = 3..6;
const SECONDARY_RUNES: std::ops::Range<usize> = 6..8;
const STAT_SHARDS_START: usize = 8;

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// Name and description shown next to a rune.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneInfo {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rune {
    #[serde(rename = "Id")]
    pub id: u16,
    #[serde(rename = "Asset", default)]
    pub asset: String,
    #[serde(rename = "Info", default)]
    pub info: RuneInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "Id")]
    pub id: u16,
    #[serde(rename = "Asset", default)]
    pub asset: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// The identified summoner. `username` is never empty once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub username: String,
    pub icon_id: String,
}

/// Snapshot of the champion currently locked in champion select, with the
/// externally sorted popularity and win-rate variants of each collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChampionRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub runes_by_popularity: Vec<Rune>,
    pub runes_by_win_rate: Vec<Rune>,
    pub items_by_popularity: Vec<Item>,
    pub items_by_win_rate: Vec<Item>,
    pub starting_items_by_popularity: Vec<Item>,
    pub starting_items_by_win_rate: Vec<Item>,
}

impl ChampionRecord {
    /// Rune collections that do not hold a full page, with their lengths.
    pub fn short_rune_pages(&self) -> Vec<(&'static str, usize)> {
        [
            ("runes_by_popularity", &self.runes_by_popularity),
            ("runes_by_win_rate", &self.runes_by_win_rate),
        ]
        .into_iter()
        .filter(|(_, runes)| runes.len() < RUNE_PAGE_LEN)
        .map(|(name, runes)| (name, runes.len()))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// RunePage
// ---------------------------------------------------------------------------

/// Slot view over a rune collection.
///
/// All accessors are bounds-safe: a short collection yields `None` or an
/// empty slice instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunePage<'a> {
    runes: &'a [Rune],
}

impl<'a> RunePage<'a> {
    pub fn new(runes: &'a [Rune]) -> Self {
        RunePage { runes }
    }

    /// Whether the collection has at least the nine fixed slots.
    pub fn is_complete(&self) -> bool {
        self.runes.len() >= RUNE_PAGE_LEN
    }

    pub fn len(&self) -> usize {
        self.runes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runes.is_empty()
    }

    pub fn all(&self) -> &'a [Rune] {
        self.runes
    }

    pub fn primary_tree(&self) -> Option<&'a Rune> {
        self.runes.get(PRIMARY_TREE)
    }

    pub fn secondary_tree(&self) -> Option<&'a Rune> {
        self.runes.get(SECONDARY_TREE)
    }

    /// The keystone, rendered larger than the rest of the primary tree.
    pub fn keystone(&self) -> Option<&'a Rune> {
        self.runes.get(KEYSTONE)
    }

    pub fn primary_runes(&self) -> &'a [Rune] {
        clamped(self.runes, PRIMARY_RUNES)
    }

    pub fn secondary_runes(&self) -> &'a [Rune] {
        clamped(self.runes, SECONDARY_RUNES)
    }

    pub fn stat_shards(&self) -> &'a [Rune] {
        self.runes.get(STAT_SHARDS_START..).unwrap_or(&[])
    }

    /// Rune ids in slot order, as sent to the import endpoint.
    pub fn ids(&self) -> Vec<u16> {
        self.runes.iter().map(|r| r.id).collect()
    }
}

fn clamped(runes: &[Rune], range: std::ops::Range<usize>) -> &[Rune] {
    let start = range.start.min(runes.len());
    let end = range.end.min(runes.len());
    &runes[start..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
