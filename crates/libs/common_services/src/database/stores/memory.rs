use crate::database::stores::{ContestStore, PhotoStore};
use crate::database::{
    Contest, ContestEntry, ContestSnapshot, ContestWinners, DbError, NewContest, NewContestEntry,
    NewPhoto, Photo,
};
use async_trait::async_trait;
use chrono::Utc;
use common_types::ContestStatus;
use sqlx::types::Json;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

/// Photo records kept in a map, for tests and dry runs.
#[derive(Default)]
pub struct MemoryPhotoStore {
    photos: RwLock<HashMap<String, Photo>>,
}

impl MemoryPhotoStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.photos.read().await.len()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn create(&self, photo: &NewPhoto) -> Result<Photo, DbError> {
        let mut photos = self.photos.write().await;
        if photos.contains_key(&photo.id) {
            return Err(DbError::UniqueViolation(sqlx::Error::Protocol(format!(
                "photo '{}' already exists",
                photo.id
            ))));
        }
        let stored = Photo {
            id: photo.id.clone(),
            user_id: photo.user_id,
            storage_path: photo.storage_path.clone(),
            facial_area: photo.facial_area.map(Json),
            facial_confidence: photo.facial_confidence,
            created_at: Utc::now(),
        };
        photos.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, photo_id: &str) -> Result<Option<Photo>, DbError> {
        Ok(self.photos.read().await.get(photo_id).cloned())
    }

    async fn delete(&self, photo_id: &str) -> Result<bool, DbError> {
        Ok(self.photos.write().await.remove(photo_id).is_some())
    }
}

#[derive(Default)]
struct ContestState {
    contests: HashMap<String, Contest>,
    entries: Vec<ContestEntry>,
    next_entry_id: i64,
}

/// Contest store behind one mutex, so every method observes a single consistent state.
#[derive(Default)]
pub struct MemoryContestStore {
    state: Mutex<ContestState>,
}

impl MemoryContestStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContestStore for MemoryContestStore {
    async fn create(&self, contest: &NewContest) -> Result<Contest, DbError> {
        let mut state = self.state.lock().await;
        if state.contests.contains_key(&contest.id) {
            return Err(DbError::UniqueViolation(sqlx::Error::Protocol(format!(
                "contest '{}' already exists",
                contest.id
            ))));
        }
        let stored = Contest {
            id: contest.id.clone(),
            name: contest.name.clone(),
            target_photo_id: contest.target_photo_id.clone(),
            status: ContestStatus::Created,
            first_user_id: None,
            second_user_id: None,
            third_user_id: None,
            revision: 0,
            ranked_at: None,
            created_at: Utc::now(),
        };
        state.contests.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, contest_id: &str) -> Result<Option<Contest>, DbError> {
        Ok(self.state.lock().await.contests.get(contest_id).cloned())
    }

    async fn update_status(
        &self,
        contest_id: &str,
        from: ContestStatus,
        to: ContestStatus,
    ) -> Result<Option<Contest>, DbError> {
        let mut state = self.state.lock().await;
        Ok(state
            .contests
            .get_mut(contest_id)
            .filter(|contest| contest.status == from)
            .map(|contest| {
                contest.status = to;
                contest.clone()
            }))
    }

    async fn upsert_entry(&self, entry: &NewContestEntry) -> Result<ContestEntry, DbError> {
        let mut state = self.state.lock().await;
        let Some(contest) = state.contests.get_mut(&entry.contest_id) else {
            return Err(DbError::Sqlx(sqlx::Error::RowNotFound));
        };
        contest.revision += 1;

        state.next_entry_id += 1;
        let seq = state.next_entry_id;
        let existing = state
            .entries
            .iter()
            .position(|e| e.contest_id == entry.contest_id && e.user_id == entry.user_id);
        let id = existing.map_or(seq, |i| state.entries[i].id);
        let stored = ContestEntry {
            id,
            seq,
            contest_id: entry.contest_id.clone(),
            user_id: entry.user_id,
            photo_id: entry.photo_id.clone(),
            score: entry.score,
            submitted_at: Utc::now(),
        };

        match existing {
            Some(i) => state.entries[i] = stored.clone(),
            None => state.entries.push(stored.clone()),
        }
        Ok(stored)
    }

    async fn snapshot(&self, contest_id: &str) -> Result<Option<ContestSnapshot>, DbError> {
        let state = self.state.lock().await;
        let Some(contest) = state.contests.get(contest_id).cloned() else {
            return Ok(None);
        };
        let mut entries: Vec<ContestEntry> = state
            .entries
            .iter()
            .filter(|e| e.contest_id == contest_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.seq);
        Ok(Some(ContestSnapshot { contest, entries }))
    }

    async fn save_ranking(
        &self,
        contest_id: &str,
        expected_revision: i64,
        winners: &ContestWinners,
    ) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        let Some(contest) = state.contests.get_mut(contest_id) else {
            return Ok(false);
        };
        if contest.revision != expected_revision {
            return Ok(false);
        }
        contest.first_user_id = winners.first_user_id;
        contest.second_user_id = winners.second_user_id;
        contest.third_user_id = winners.third_user_id;
        contest.ranked_at = Some(Utc::now());
        contest.revision += 1;
        Ok(true)
    }
}
