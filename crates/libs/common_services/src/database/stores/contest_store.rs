use crate::database::{
    Contest, ContestEntry, ContestSnapshot, ContestWinners, DbError, NewContest, NewContestEntry,
};
use async_trait::async_trait;
use common_types::ContestStatus;
use sqlx::{PgPool, PgTransaction};

#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn create(&self, contest: &NewContest) -> Result<Contest, DbError>;

    async fn find_by_id(&self, contest_id: &str) -> Result<Option<Contest>, DbError>;

    /// Moves the contest from `from` to `to`, only if it is still in `from`.
    ///
    /// Returns `None` when the contest is missing or its status changed meanwhile.
    /// Transition rules live in the contest service.
    async fn update_status(
        &self,
        contest_id: &str,
        from: ContestStatus,
        to: ContestStatus,
    ) -> Result<Option<Contest>, DbError>;

    /// Inserts the user's entry or replaces their previous one, and bumps the contest revision.
    async fn upsert_entry(&self, entry: &NewContestEntry) -> Result<ContestEntry, DbError>;

    /// The contest and all of its entries as of a single revision.
    async fn snapshot(&self, contest_id: &str) -> Result<Option<ContestSnapshot>, DbError>;

    /// Writes the winners only if the contest is still at `expected_revision`.
    ///
    /// Returns `false` when another write got there first.
    async fn save_ranking(
        &self,
        contest_id: &str,
        expected_revision: i64,
        winners: &ContestWinners,
    ) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct PgContestStore {
    pool: PgPool,
}

impl PgContestStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serializes entry and ranking writes of one contest for the rest of the transaction.
async fn lock_contest(tx: &mut PgTransaction<'_>, contest_id: &str) -> Result<(), DbError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(contest_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl ContestStore for PgContestStore {
    async fn create(&self, contest: &NewContest) -> Result<Contest, DbError> {
        Ok(sqlx::query_as::<_, Contest>(
            r"
            INSERT INTO contest (id, name, target_photo_id)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(&contest.id)
        .bind(&contest.name)
        .bind(&contest.target_photo_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_by_id(&self, contest_id: &str) -> Result<Option<Contest>, DbError> {
        Ok(
            sqlx::query_as::<_, Contest>("SELECT * FROM contest WHERE id = $1")
                .bind(contest_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_status(
        &self,
        contest_id: &str,
        from: ContestStatus,
        to: ContestStatus,
    ) -> Result<Option<Contest>, DbError> {
        Ok(sqlx::query_as::<_, Contest>(
            "UPDATE contest SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(contest_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_entry(&self, entry: &NewContestEntry) -> Result<ContestEntry, DbError> {
        let mut tx = self.pool.begin().await?;
        lock_contest(&mut tx, &entry.contest_id).await?;

        // A re-submission counts as a new submission for tie-breaking.
        let stored = sqlx::query_as::<_, ContestEntry>(
            r"
            INSERT INTO contest_entry (contest_id, user_id, photo_id, score)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (contest_id, user_id) DO UPDATE
                SET photo_id     = EXCLUDED.photo_id,
                    score        = EXCLUDED.score,
                    submitted_at = now(),
                    seq          = DEFAULT
            RETURNING *
            ",
        )
        .bind(&entry.contest_id)
        .bind(entry.user_id)
        .bind(&entry.photo_id)
        .bind(entry.score)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE contest SET revision = revision + 1 WHERE id = $1")
            .bind(&entry.contest_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn snapshot(&self, contest_id: &str) -> Result<Option<ContestSnapshot>, DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let Some(contest) = sqlx::query_as::<_, Contest>("SELECT * FROM contest WHERE id = $1")
            .bind(contest_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let entries = sqlx::query_as::<_, ContestEntry>(
            "SELECT * FROM contest_entry WHERE contest_id = $1 ORDER BY seq",
        )
        .bind(contest_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(ContestSnapshot { contest, entries }))
    }

    async fn save_ranking(
        &self,
        contest_id: &str,
        expected_revision: i64,
        winners: &ContestWinners,
    ) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        lock_contest(&mut tx, contest_id).await?;

        let result = sqlx::query(
            r"
            UPDATE contest
            SET first_user_id  = $3,
                second_user_id = $4,
                third_user_id  = $5,
                ranked_at      = now(),
                revision       = revision + 1
            WHERE id = $1
              AND revision = $2
            ",
        )
        .bind(contest_id)
        .bind(expected_revision)
        .bind(winners.first_user_id)
        .bind(winners.second_user_id)
        .bind(winners.third_user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }
}
