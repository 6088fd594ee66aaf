use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// Lifecycle of a contest: `created` → `active` → `closed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "contest_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Created,
    Active,
    Closed,
}

impl ContestStatus {
    pub const ALL: [Self; 3] = [Self::Created, Self::Active, Self::Closed];

    /// Only forward moves are allowed; staying in the same status is a no-op.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Active) | (Self::Active, Self::Closed)
        ) || self == next
    }
}

impl Display for ContestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

impl FromStr for ContestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown contest status '{other}'")),
        }
    }
}

/// Which contest statuses accept new entries and which allow ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestPolicy {
    pub entry_statuses: Vec<ContestStatus>,
    pub ranking_statuses: Vec<ContestStatus>,
}

impl ContestPolicy {
    /// Accepts entries and ranking in every status.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            entry_statuses: ContestStatus::ALL.to_vec(),
            ranking_statuses: ContestStatus::ALL.to_vec(),
        }
    }

    #[must_use]
    pub fn accepts_entries(&self, status: ContestStatus) -> bool {
        self.entry_statuses.contains(&status)
    }

    #[must_use]
    pub fn allows_ranking(&self, status: ContestStatus) -> bool {
        self.ranking_statuses.contains(&status)
    }
}

impl Default for ContestPolicy {
    /// Entries only while active; ranking once active or closed.
    fn default() -> Self {
        Self {
            entry_statuses: vec![ContestStatus::Active],
            ranking_statuses: vec![ContestStatus::Active, ContestStatus::Closed],
        }
    }
}
