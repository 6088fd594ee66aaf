use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// Face bounding box reported by the embedding service, in pixels of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacialArea {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Corresponds to the 'photo' table.
///
/// `user_id` is `None` for the reference image of a contest.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub user_id: Option<i32>,
    pub storage_path: String,
    pub facial_area: Option<Json<FacialArea>>,
    pub facial_confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub id: String,
    pub user_id: Option<i32>,
    pub storage_path: String,
    pub facial_area: Option<FacialArea>,
    pub facial_confidence: Option<f64>,
}
