use crate::api::contest::error::ContestError;
use crate::api::contest::interfaces::{Leaderboard, Standing};
use crate::api::contest::ranking::rank;
use crate::api::photos::PhotoService;
use crate::database::stores::ContestStore;
use crate::database::vector_store::VectorStore;
use crate::database::{Contest, ContestEntry, NewContest, NewContestEntry};
use crate::embedding_client::ImageUpload;
use crate::utils::nice_id;
use common_types::{Collection, ContestPolicy, ContestStatus};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Contest lifecycle, entry submission and ranking.
#[derive(Clone)]
pub struct ContestService {
    contests: Arc<dyn ContestStore>,
    vectors: Arc<dyn VectorStore>,
    photos: PhotoService,
    policy: ContestPolicy,
    max_ranking_attempts: u32,
    id_length: usize,
}

impl ContestService {
    #[must_use]
    pub fn new(
        contests: Arc<dyn ContestStore>,
        vectors: Arc<dyn VectorStore>,
        photos: PhotoService,
        policy: ContestPolicy,
        max_ranking_attempts: u32,
        id_length: usize,
    ) -> Self {
        Self {
            contests,
            vectors,
            photos,
            policy,
            max_ranking_attempts: max_ranking_attempts.max(1),
            id_length,
        }
    }

    /// Creates a contest around a target face. The contest starts out `created`.
    #[instrument(skip(self, image), fields(file_name = %image.file_name), err(Debug))]
    pub async fn create_contest(
        &self,
        name: &str,
        storage_path: &str,
        image: &ImageUpload,
    ) -> Result<Contest, ContestError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContestError::InvalidName);
        }

        let contest_id = nice_id(self.id_length);
        let target = self
            .photos
            .register_contest_target(&contest_id, storage_path, image)
            .await?;

        let new_contest = NewContest {
            id: contest_id.clone(),
            name: name.to_string(),
            target_photo_id: target.id.clone(),
        };
        match self.contests.create(&new_contest).await {
            Ok(contest) => {
                info!("Created contest {} '{}'", contest.id, contest.name);
                Ok(contest)
            }
            Err(err) => {
                if let Err(cleanup_err) = self
                    .photos
                    .discard(&target.id, Collection::ContestTarget, &contest_id)
                    .await
                {
                    warn!("Could not clean up target of contest {contest_id}: {cleanup_err}");
                }
                Err(err.into())
            }
        }
    }

    pub async fn get_contest(&self, contest_id: &str) -> Result<Contest, ContestError> {
        self.contests
            .find_by_id(contest_id)
            .await?
            .ok_or_else(|| ContestError::NotFound(contest_id.to_string()))
    }

    /// Moves a contest forward through `created -> active -> closed`.
    /// Setting the current status again is a no-op.
    #[instrument(skip(self), err(Debug))]
    pub async fn set_status(
        &self,
        contest_id: &str,
        status: ContestStatus,
    ) -> Result<Contest, ContestError> {
        let contest = self.get_contest(contest_id).await?;
        if !contest.status.can_transition_to(status) {
            return Err(ContestError::InvalidTransition {
                from: contest.status,
                to: status,
            });
        }
        if contest.status == status {
            return Ok(contest);
        }

        let Some(updated) = self
            .contests
            .update_status(contest_id, contest.status, status)
            .await?
        else {
            // Someone else moved the contest since it was read.
            let current = self.get_contest(contest_id).await?;
            return Err(ContestError::InvalidTransition {
                from: current.status,
                to: status,
            });
        };
        info!("Contest {contest_id} is now {status}");
        Ok(updated)
    }

    /// Scores the user's photo against the contest target and records it as
    /// their entry, replacing any earlier one.
    #[instrument(skip(self), err(Debug))]
    pub async fn submit_entry(
        &self,
        contest_id: &str,
        user_id: i32,
        photo_id: &str,
    ) -> Result<ContestEntry, ContestError> {
        let contest = self.get_contest(contest_id).await?;
        if !self.policy.accepts_entries(contest.status) {
            return Err(ContestError::StatusNotAllowed {
                contest_id: contest_id.to_string(),
                status: contest.status,
                action: "new entries",
            });
        }

        self.photos.get_owned(user_id, photo_id).await?;
        let photo = self.photos.embedding(photo_id).await?;
        let target = self.vectors.get(Collection::ContestTarget, contest_id).await?;
        let score = photo.similarity(&target)?;

        let entry = self
            .contests
            .upsert_entry(&NewContestEntry {
                contest_id: contest_id.to_string(),
                user_id,
                photo_id: photo_id.to_string(),
                score,
            })
            .await?;
        info!("User {user_id} entered contest {contest_id} with score {score:.4}");
        Ok(entry)
    }

    /// Ranks all entries and stores the top three on the contest.
    ///
    /// The winners are only written if no entry or ranking landed since the
    /// entries were read; otherwise the ranking is recomputed from a fresh read.
    #[instrument(skip(self), err(Debug))]
    pub async fn rank_entries(&self, contest_id: &str) -> Result<Leaderboard, ContestError> {
        for attempt in 1..=self.max_ranking_attempts {
            let snapshot = self
                .contests
                .snapshot(contest_id)
                .await?
                .ok_or_else(|| ContestError::NotFound(contest_id.to_string()))?;

            let status = snapshot.contest.status;
            if !self.policy.allows_ranking(status) {
                return Err(ContestError::StatusNotAllowed {
                    contest_id: contest_id.to_string(),
                    status,
                    action: "ranking",
                });
            }

            let ranked = rank(snapshot.entries);
            let leaderboard = Leaderboard::from_ranked(contest_id, &ranked);
            let saved = self
                .contests
                .save_ranking(
                    contest_id,
                    snapshot.contest.revision,
                    &leaderboard.winners(),
                )
                .await?;
            if saved {
                info!(
                    "Ranked {} entries of contest {contest_id} at revision {}",
                    ranked.len(),
                    snapshot.contest.revision
                );
                return Ok(leaderboard);
            }
            warn!(
                "Contest {contest_id} changed while ranking (attempt {attempt} of {}), recomputing",
                self.max_ranking_attempts
            );
        }

        Err(ContestError::RankingConflict {
            contest_id: contest_id.to_string(),
            attempts: self.max_ranking_attempts,
        })
    }

    /// Every entry in contest order, without touching the stored winners.
    pub async fn standings(&self, contest_id: &str) -> Result<Vec<Standing>, ContestError> {
        let snapshot = self
            .contests
            .snapshot(contest_id)
            .await?
            .ok_or_else(|| ContestError::NotFound(contest_id.to_string()))?;
        Ok(rank(snapshot.entries)
            .into_iter()
            .zip(1..)
            .map(|(entry, position)| Standing::new(position, entry))
            .collect())
    }
}
