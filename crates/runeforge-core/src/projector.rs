// Build projection: picks the popularity or win-rate variant of every
// collection in a champion record from a single sort mode.

use serde::{Deserialize, Serialize};

use crate::model::{ChampionRecord, Item, RunePage};

/// Which externally supplied ordering to display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    ByPopularity,
    ByWinRate,
}

impl SortMode {
    pub fn toggled(self) -> Self {
        match self {
            SortMode::ByPopularity => SortMode::ByWinRate,
            SortMode::ByWinRate => SortMode::ByPopularity,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::ByPopularity => "Popularity",
            SortMode::ByWinRate => "Win Rate",
        }
    }
}

/// Everything the build page shows, all taken from the same sort mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildView<'a> {
    pub mode: SortMode,
    pub runes: RunePage<'a>,
    pub items: &'a [Item],
    pub starting_items: &'a [Item],
}

/// Select the runes, items and starting items for `mode`.
///
/// No sorting happens here; the service already ordered each variant.
/// Missing collections come back empty.
pub fn project(record: &ChampionRecord, mode: SortMode) -> BuildView<'_> {
    let (runes, items, starting_items) = match mode {
        SortMode::ByPopularity => (
            &record.runes_by_popularity,
            &record.items_by_popularity,
            &record.starting_items_by_popularity,
        ),
        SortMode::ByWinRate => (
            &record.runes_by_win_rate,
            &record.items_by_win_rate,
            &record.starting_items_by_win_rate,
        ),
    };
    BuildView {
        mode,
        runes: RunePage::new(runes),
        items,
        starting_items,
    }
}

/// The active sort mode of a build view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortProjector {
    mode: SortMode,
}

impl SortProjector {
    pub fn new(mode: SortMode) -> Self {
        SortProjector { mode }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SortMode) {
        self.mode = mode;
    }

    pub fn toggle(&mut self) -> SortMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn project<'a>(&self, record: &'a ChampionRecord) -> BuildView<'a> {
        project(record, self.mode)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
