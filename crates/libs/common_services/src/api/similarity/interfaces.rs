use common_types::Similarity;
use serde::Serialize;

/// How much a friend's profile face resembles the user's.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendMatch {
    pub user_id: i32,
    #[serde(flatten)]
    pub similarity: Similarity,
}

/// A stored face close to the queried photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lookalike {
    pub entity_id: String,
    pub distance: f64,
    #[serde(flatten)]
    pub similarity: Similarity,
}
