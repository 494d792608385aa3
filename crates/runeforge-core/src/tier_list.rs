// Tier list read from the service's `/tier-list` endpoint: per-role champion
// rankings with a letter grade and win rate, already sorted by the service.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::service::{LocalService, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }
}

/// The role keys the tier list is grouped by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    All,
    Top,
    Jungle,
    Mid,
    Adc,
    Sup,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::All,
        Role::Top,
        Role::Jungle,
        Role::Mid,
        Role::Adc,
        Role::Sup,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Role::All => "ALL",
            Role::Top => "TOP",
            Role::Jungle => "JUNGLE",
            Role::Mid => "MID",
            Role::Adc => "ADC",
            Role::Sup => "SUP",
        }
    }

    pub fn next(self) -> Role {
        let idx = Role::ALL.iter().position(|r| *r == self).unwrap_or(0);
        Role::ALL[(idx + 1) % Role::ALL.len()]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierEntry {
    pub name: String,
    pub id: u32,
    /// Percentage, e.g. `52.31`.
    pub winrate: f64,
    pub tier: Tier,
    /// The service's own role string (e.g. `SUPPORT`), not a `Role` key.
    pub role: String,
}

/// Tier entries keyed by role key. Keys this client has no `Role` for are
/// kept but never shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierList {
    roles: HashMap<String, Vec<TierEntry>>,
}

impl TierList {
    pub fn new(roles: HashMap<String, Vec<TierEntry>>) -> Self {
        TierList { roles }
    }

    /// Entries for `role` in service order; empty when the role is absent.
    pub fn for_role(&self, role: Role) -> &[TierEntry] {
        self.roles.get(role.key()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.roles.values().all(Vec::is_empty)
    }
}

/// Fetch the tier list once from the service.
pub async fn fetch(service: &dyn LocalService) -> Result<TierList, ServiceError> {
    service.fetch_tier_list().await
}
