mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{
    FakeEmbedder, context, context_with_contest_store, face, image, settings, settings_with,
    target_face,
};
use common_services::api::contest::{ContestError, Placement};
use common_services::context::ServiceContext;
use common_services::database::stores::{ContestStore, MemoryContestStore};
use common_services::database::{
    Contest, ContestEntry, ContestSnapshot, ContestWinners, DbError, NewContest, NewContestEntry,
};
use common_types::similarity::to_percentage;
use common_types::{ContestPolicy, ContestStatus};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registers one photo per score for users 1, 2, ... and returns their ids.
async fn register_entrants(ctx: &ServiceContext, scores: &[f64]) -> Vec<String> {
    let mut photo_ids = Vec::new();
    for (user_id, _) in (1..).zip(scores) {
        let photo = ctx
            .photos
            .register(
                Some(user_id),
                &format!("uploads/{user_id}.jpg"),
                &image(&format!("user{user_id}.jpg")),
            )
            .await
            .expect("photo registers");
        photo_ids.push(photo.id);
    }
    photo_ids
}

fn embedder_for(scores: &[f64]) -> FakeEmbedder {
    (1..)
        .zip(scores)
        .fold(
            FakeEmbedder::new().with_face("target.jpg", target_face()),
            |embedder, (user_id, &score): (i32, &f64)| {
                embedder.with_face(&format!("user{user_id}.jpg"), face(score))
            },
        )
}

async fn active_contest(ctx: &ServiceContext) -> Contest {
    let contest = ctx
        .contests
        .create_contest("Lookalike of the week", "targets/t.jpg", &image("target.jpg"))
        .await
        .expect("contest is created");
    assert_eq!(contest.status, ContestStatus::Created);
    ctx.contests
        .set_status(&contest.id, ContestStatus::Active)
        .await
        .expect("contest activates")
}

async fn submit_all(ctx: &ServiceContext, contest_id: &str, photo_ids: &[String]) {
    for (user_id, photo_id) in (1..).zip(photo_ids) {
        ctx.contests
            .submit_entry(contest_id, user_id, photo_id)
            .await
            .expect("entry is accepted");
    }
}

#[tokio::test]
async fn test_rank_entries_picks_top_three() {
    let scores = [0.9, 0.7, 0.95, 0.7];
    let ctx = context(embedder_for(&scores));
    let contest = active_contest(&ctx).await;
    let photo_ids = register_entrants(&ctx, &scores).await;
    submit_all(&ctx, &contest.id, &photo_ids).await;

    let leaderboard = ctx
        .contests
        .rank_entries(&contest.id)
        .await
        .expect("ranking succeeds");

    assert_eq!(leaderboard.first.user_id(), Some(3));
    assert_eq!(leaderboard.second.user_id(), Some(1));
    assert_eq!(leaderboard.third.user_id(), Some(2));
    match &leaderboard.first {
        Placement::Entry {
            score, percentage, ..
        } => {
            assert!((score - 0.95).abs() < 1e-9);
            assert_eq!(*percentage, to_percentage(*score));
        }
        Placement::NoEntry => panic!("first place should be taken"),
    }

    let stored = ctx
        .contests
        .get_contest(&contest.id)
        .await
        .expect("contest exists");
    assert_eq!(
        stored.winners(),
        ContestWinners {
            first_user_id: Some(3),
            second_user_id: Some(1),
            third_user_id: Some(2),
        }
    );
    assert!(stored.ranked_at.is_some());
}

#[tokio::test]
async fn test_single_entry_leaves_no_entry_markers() {
    let scores = [0.4];
    let ctx = context(embedder_for(&scores));
    let contest = active_contest(&ctx).await;
    let photo_ids = register_entrants(&ctx, &scores).await;
    submit_all(&ctx, &contest.id, &photo_ids).await;

    let leaderboard = ctx
        .contests
        .rank_entries(&contest.id)
        .await
        .expect("ranking succeeds");
    assert_eq!(leaderboard.first.user_id(), Some(1));
    assert_eq!(leaderboard.second, Placement::NoEntry);
    assert_eq!(leaderboard.third, Placement::NoEntry);
}

#[tokio::test]
async fn test_resubmission_replaces_entry() {
    let embedder = embedder_for(&[0.2]).with_face("user1-better.jpg", face(0.8));
    let ctx = context(embedder);
    let contest = active_contest(&ctx).await;
    let first = register_entrants(&ctx, &[0.2]).await;
    let better = ctx
        .photos
        .register(Some(1), "uploads/better.jpg", &image("user1-better.jpg"))
        .await
        .expect("photo registers");

    ctx.contests
        .submit_entry(&contest.id, 1, &first[0])
        .await
        .expect("first entry");
    let replaced = ctx
        .contests
        .submit_entry(&contest.id, 1, &better.id)
        .await
        .expect("second entry");
    assert!((replaced.score - 0.8).abs() < 1e-9);

    let standings = ctx
        .contests
        .standings(&contest.id)
        .await
        .expect("standings");
    assert_eq!(standings.len(), 1);
    assert_eq!(standings[0].position, 1);
    assert_eq!(standings[0].photo_id, better.id);
}

#[tokio::test]
async fn test_standings_lists_every_entry_in_order() {
    let scores = [0.1, 0.5, -0.3, 0.5, 0.9];
    let ctx = context(embedder_for(&scores));
    let contest = active_contest(&ctx).await;
    let photo_ids = register_entrants(&ctx, &scores).await;
    submit_all(&ctx, &contest.id, &photo_ids).await;

    let standings = ctx
        .contests
        .standings(&contest.id)
        .await
        .expect("standings");
    let order: Vec<(usize, i32)> = standings.iter().map(|s| (s.position, s.user_id)).collect();
    assert_eq!(order, [(1, 5), (2, 2), (3, 4), (4, 1), (5, 3)]);
    assert_eq!(standings[4].percentage, 35);
}

#[tokio::test]
async fn test_default_policy_gates_by_status() {
    let scores = [0.6];
    let ctx = context(embedder_for(&scores));
    let contest = ctx
        .contests
        .create_contest("Gated", "targets/t.jpg", &image("target.jpg"))
        .await
        .expect("contest is created");
    let photo_ids = register_entrants(&ctx, &scores).await;

    let early = ctx.contests.submit_entry(&contest.id, 1, &photo_ids[0]).await;
    assert!(matches!(
        early,
        Err(ContestError::StatusNotAllowed {
            status: ContestStatus::Created,
            ..
        })
    ));
    let early_rank = ctx.contests.rank_entries(&contest.id).await;
    assert!(matches!(
        early_rank,
        Err(ContestError::StatusNotAllowed { .. })
    ));

    ctx.contests
        .set_status(&contest.id, ContestStatus::Active)
        .await
        .expect("activates");
    ctx.contests
        .submit_entry(&contest.id, 1, &photo_ids[0])
        .await
        .expect("entry accepted while active");

    ctx.contests
        .set_status(&contest.id, ContestStatus::Closed)
        .await
        .expect("closes");
    let late = ctx
        .contests
        .submit_entry(&contest.id, 1, &photo_ids[0])
        .await
        .expect_err("closed contests refuse entries");
    assert_eq!(late.status_code(), StatusCode::CONFLICT);

    let leaderboard = ctx
        .contests
        .rank_entries(&contest.id)
        .await
        .expect("closed contests can still be ranked");
    assert_eq!(leaderboard.first.user_id(), Some(1));
}

#[tokio::test]
async fn test_permissive_policy_accepts_everything() {
    let scores = [0.6];
    let settings = settings_with(ContestPolicy::permissive(), 5);
    let ctx = context_with_contest_store(
        embedder_for(&scores),
        Arc::new(MemoryContestStore::new()),
        &settings,
    );
    let contest = ctx
        .contests
        .create_contest("Open", "targets/t.jpg", &image("target.jpg"))
        .await
        .expect("contest is created");
    let photo_ids = register_entrants(&ctx, &scores).await;

    ctx.contests
        .submit_entry(&contest.id, 1, &photo_ids[0])
        .await
        .expect("entry accepted while created");
    ctx.contests
        .rank_entries(&contest.id)
        .await
        .expect("ranking allowed while created");
}

#[tokio::test]
async fn test_status_only_moves_forward() {
    let ctx = context(embedder_for(&[]));
    let contest = active_contest(&ctx).await;

    let same = ctx
        .contests
        .set_status(&contest.id, ContestStatus::Active)
        .await
        .expect("same status is a no-op");
    assert_eq!(same.status, ContestStatus::Active);

    let back = ctx
        .contests
        .set_status(&contest.id, ContestStatus::Created)
        .await;
    assert!(matches!(
        back,
        Err(ContestError::InvalidTransition {
            from: ContestStatus::Active,
            to: ContestStatus::Created,
        })
    ));

    ctx.contests
        .set_status(&contest.id, ContestStatus::Closed)
        .await
        .expect("closes");
    let reopen = ctx
        .contests
        .set_status(&contest.id, ContestStatus::Active)
        .await
        .expect_err("closed is final");
    assert_eq!(reopen.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_entries_must_use_own_photo() {
    let scores = [0.5, 0.6];
    let ctx = context(embedder_for(&scores));
    let contest = active_contest(&ctx).await;
    let photo_ids = register_entrants(&ctx, &scores).await;

    let err = ctx
        .contests
        .submit_entry(&contest.id, 1, &photo_ids[1])
        .await
        .expect_err("photo belongs to user 2");
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_contest() {
    let ctx = context(embedder_for(&[]));
    let err = ctx
        .contests
        .rank_entries("nope")
        .await
        .expect_err("no such contest");
    assert!(matches!(err, ContestError::NotFound(_)));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_blank_contest_name() {
    let ctx = context(embedder_for(&[]));
    let err = ctx
        .contests
        .create_contest("   ", "targets/t.jpg", &image("target.jpg"))
        .await
        .expect_err("name is required");
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unembeddable_target_is_rejected() {
    let ctx = context(FakeEmbedder::new());
    let err = ctx
        .contests
        .create_contest("No face", "targets/t.jpg", &image("landscape.jpg"))
        .await
        .expect_err("no face in target");
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// Contest store that slips in another user's entry right after each read,
/// the way a concurrent submission would.
struct InterferingStore {
    inner: MemoryContestStore,
    pending: Mutex<Vec<NewContestEntry>>,
    always: Option<NewContestEntry>,
}

impl InterferingStore {
    fn once(entry: NewContestEntry) -> Self {
        Self {
            inner: MemoryContestStore::new(),
            pending: Mutex::new(vec![entry]),
            always: None,
        }
    }

    fn always(entry: NewContestEntry) -> Self {
        Self {
            inner: MemoryContestStore::new(),
            pending: Mutex::new(Vec::new()),
            always: Some(entry),
        }
    }
}

#[async_trait]
impl ContestStore for InterferingStore {
    async fn create(&self, contest: &NewContest) -> Result<Contest, DbError> {
        self.inner.create(contest).await
    }

    async fn find_by_id(&self, contest_id: &str) -> Result<Option<Contest>, DbError> {
        self.inner.find_by_id(contest_id).await
    }

    async fn update_status(
        &self,
        contest_id: &str,
        from: ContestStatus,
        to: ContestStatus,
    ) -> Result<Option<Contest>, DbError> {
        self.inner.update_status(contest_id, from, to).await
    }

    async fn upsert_entry(&self, entry: &NewContestEntry) -> Result<ContestEntry, DbError> {
        self.inner.upsert_entry(entry).await
    }

    async fn snapshot(&self, contest_id: &str) -> Result<Option<ContestSnapshot>, DbError> {
        let snapshot = self.inner.snapshot(contest_id).await?;
        let injected = self.pending.lock().await.pop().or_else(|| self.always.clone());
        if let Some(mut entry) = injected {
            entry.contest_id = contest_id.to_string();
            self.inner.upsert_entry(&entry).await?;
        }
        Ok(snapshot)
    }

    async fn save_ranking(
        &self,
        contest_id: &str,
        expected_revision: i64,
        winners: &ContestWinners,
    ) -> Result<bool, DbError> {
        self.inner
            .save_ranking(contest_id, expected_revision, winners)
            .await
    }
}

fn late_entry() -> NewContestEntry {
    NewContestEntry {
        contest_id: String::new(),
        user_id: 99,
        photo_id: "late-photo".to_string(),
        score: 0.99,
    }
}

#[tokio::test]
async fn test_ranking_recomputes_after_concurrent_entry() {
    let scores = [0.6, 0.8];
    let ctx = context_with_contest_store(
        embedder_for(&scores),
        Arc::new(InterferingStore::once(late_entry())),
        &settings(),
    );
    let contest = active_contest(&ctx).await;
    let photo_ids = register_entrants(&ctx, &scores).await;
    submit_all(&ctx, &contest.id, &photo_ids).await;

    let leaderboard = ctx
        .contests
        .rank_entries(&contest.id)
        .await
        .expect("second attempt wins");

    // The entry that landed mid-ranking is not lost.
    assert_eq!(leaderboard.first.user_id(), Some(99));
    assert_eq!(leaderboard.second.user_id(), Some(2));
    assert_eq!(leaderboard.third.user_id(), Some(1));
    let stored = ctx
        .contests
        .get_contest(&contest.id)
        .await
        .expect("contest exists");
    assert_eq!(stored.winners(), leaderboard.winners());
}

#[tokio::test]
async fn test_ranking_gives_up_when_contest_keeps_changing() {
    let ctx = context_with_contest_store(
        embedder_for(&[]),
        Arc::new(InterferingStore::always(late_entry())),
        &settings_with(ContestPolicy::default(), 3),
    );
    let contest = active_contest(&ctx).await;

    let err = ctx
        .contests
        .rank_entries(&contest.id)
        .await
        .expect_err("never settles");
    assert!(matches!(
        err,
        ContestError::RankingConflict { attempts: 3, .. }
    ));
    assert!(err.is_transient());
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_concurrent_rankings_agree() {
    let scores = [0.3, 0.9, 0.6];
    let ctx = context(embedder_for(&scores));
    let contest = active_contest(&ctx).await;
    let photo_ids = register_entrants(&ctx, &scores).await;
    submit_all(&ctx, &contest.id, &photo_ids).await;

    let (a, b) = tokio::join!(
        ctx.contests.rank_entries(&contest.id),
        ctx.contests.rank_entries(&contest.id)
    );
    let a = a.expect("first ranking");
    let b = b.expect("second ranking");
    assert_eq!(a, b);

    let stored = ctx
        .contests
        .get_contest(&contest.id)
        .await
        .expect("contest exists");
    assert_eq!(stored.winners(), a.winners());
    assert_eq!(a.first.user_id(), Some(2));
}

/// Contest store where another operator opens and closes the contest right
/// before the first status write lands.
struct RacingStatusStore {
    inner: MemoryContestStore,
    raced: Mutex<bool>,
}

#[async_trait]
impl ContestStore for RacingStatusStore {
    async fn create(&self, contest: &NewContest) -> Result<Contest, DbError> {
        self.inner.create(contest).await
    }

    async fn find_by_id(&self, contest_id: &str) -> Result<Option<Contest>, DbError> {
        self.inner.find_by_id(contest_id).await
    }

    async fn update_status(
        &self,
        contest_id: &str,
        from: ContestStatus,
        to: ContestStatus,
    ) -> Result<Option<Contest>, DbError> {
        let mut raced = self.raced.lock().await;
        if !*raced {
            *raced = true;
            self.inner
                .update_status(contest_id, ContestStatus::Created, ContestStatus::Active)
                .await?;
            self.inner
                .update_status(contest_id, ContestStatus::Active, ContestStatus::Closed)
                .await?;
        }
        self.inner.update_status(contest_id, from, to).await
    }

    async fn upsert_entry(&self, entry: &NewContestEntry) -> Result<ContestEntry, DbError> {
        self.inner.upsert_entry(entry).await
    }

    async fn snapshot(&self, contest_id: &str) -> Result<Option<ContestSnapshot>, DbError> {
        self.inner.snapshot(contest_id).await
    }

    async fn save_ranking(
        &self,
        contest_id: &str,
        expected_revision: i64,
        winners: &ContestWinners,
    ) -> Result<bool, DbError> {
        self.inner
            .save_ranking(contest_id, expected_revision, winners)
            .await
    }
}

#[tokio::test]
async fn test_stale_status_change_cannot_reopen_contest() {
    let ctx = context_with_contest_store(
        embedder_for(&[]),
        Arc::new(RacingStatusStore {
            inner: MemoryContestStore::new(),
            raced: Mutex::new(false),
        }),
        &settings(),
    );
    let contest = ctx
        .contests
        .create_contest("Racy", "targets/t.jpg", &image("target.jpg"))
        .await
        .expect("contest is created");

    let err = ctx
        .contests
        .set_status(&contest.id, ContestStatus::Active)
        .await
        .expect_err("contest was closed in the meantime");
    assert!(matches!(
        err,
        ContestError::InvalidTransition {
            from: ContestStatus::Closed,
            to: ContestStatus::Active,
        }
    ));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let stored = ctx
        .contests
        .get_contest(&contest.id)
        .await
        .expect("contest exists");
    assert_eq!(stored.status, ContestStatus::Closed);
}
