use chrono::{DateTime, Utc};
use common_types::ContestStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Corresponds to the 'contest' table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: String,
    pub name: String,
    pub target_photo_id: String,
    pub status: ContestStatus,
    pub first_user_id: Option<i32>,
    pub second_user_id: Option<i32>,
    pub third_user_id: Option<i32>,
    /// Bumped by every entry write and every ranking write.
    pub revision: i64,
    pub ranked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Contest {
    #[must_use]
    pub const fn winners(&self) -> ContestWinners {
        ContestWinners {
            first_user_id: self.first_user_id,
            second_user_id: self.second_user_id,
            third_user_id: self.third_user_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewContest {
    pub id: String,
    pub name: String,
    pub target_photo_id: String,
}

/// The persisted top three of a contest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestWinners {
    pub first_user_id: Option<i32>,
    pub second_user_id: Option<i32>,
    pub third_user_id: Option<i32>,
}
