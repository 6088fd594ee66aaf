use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// Partition of the vector store an embedding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "embedding_collection", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Photos uploaded by users, keyed by photo id.
    Photo,
    /// Reference faces of contests, keyed by contest id.
    ContestTarget,
    /// A user's representative face, keyed by user id.
    UserProfile,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::ContestTarget => "contest_target",
            Self::UserProfile => "user_profile",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "photo" | "photos" => Ok(Self::Photo),
            "contest_target" | "contest_targets" | "target" | "targets" => Ok(Self::ContestTarget),
            "user_profile" | "user_profiles" | "profile" | "profiles" => Ok(Self::UserProfile),
            other => Err(format!("unknown collection '{other}'")),
        }
    }
}
