use crate::database::ContestEntry;
use std::cmp::Ordering;

/// Contest order: highest score first, then the earliest submission, then the
/// lowest store sequence number.
#[must_use]
pub fn compare_entries(a: &ContestEntry, b: &ContestEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        .then_with(|| a.seq.cmp(&b.seq))
}

/// Sorts entries into contest order.
#[must_use]
pub fn rank(mut entries: Vec<ContestEntry>) -> Vec<ContestEntry> {
    entries.sort_by(compare_entries);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::contest::interfaces::{Leaderboard, Placement};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    /// Entry `n` (1-based) submitted `n` seconds after the base time.
    fn entries(scores: &[f64]) -> Vec<ContestEntry> {
        scores
            .iter()
            .zip(1_i64..)
            .map(|(&score, n)| ContestEntry {
                id: n,
                seq: n,
                contest_id: "contest".to_string(),
                user_id: n as i32,
                photo_id: format!("photo{n}"),
                score,
                submitted_at: base_time() + Duration::seconds(n),
            })
            .collect()
    }

    fn user_ids(ranked: &[ContestEntry]) -> Vec<i32> {
        ranked.iter().map(|e| e.user_id).collect()
    }

    #[test]
    fn test_scores_rank_descending_with_earliest_tie() {
        let ranked = rank(entries(&[0.9, 0.7, 0.95, 0.7]));
        assert_eq!(user_ids(&ranked), [3, 1, 2, 4]);

        let board = Leaderboard::from_ranked("contest", &ranked);
        assert_eq!(board.first.user_id(), Some(3));
        assert_eq!(board.second.user_id(), Some(1));
        assert_eq!(board.third.user_id(), Some(2));
    }

    #[test]
    fn test_single_entry_leaves_empty_slots() {
        let board = Leaderboard::from_ranked("contest", &rank(entries(&[0.42])));
        assert_eq!(board.first.user_id(), Some(1));
        assert_eq!(board.second, Placement::NoEntry);
        assert_eq!(board.third, Placement::NoEntry);

        let winners = board.winners();
        assert_eq!(winners.first_user_id, Some(1));
        assert_eq!(winners.second_user_id, None);
    }

    #[test]
    fn test_no_entries() {
        let board = Leaderboard::from_ranked("contest", &[]);
        assert_eq!(board.first, Placement::NoEntry);
        assert_eq!(board.winners(), crate::database::ContestWinners::default());
    }

    #[test]
    fn test_sequence_breaks_identical_timestamps() {
        let mut same_time = entries(&[0.5, 0.5]);
        for entry in &mut same_time {
            entry.submitted_at = base_time();
        }
        same_time.swap(0, 1);
        assert_eq!(user_ids(&rank(same_time)), [1, 2]);
    }

    #[test]
    fn test_negative_scores_still_rank() {
        let ranked = rank(entries(&[-0.2, -0.9, 0.0]));
        assert_eq!(user_ids(&ranked), [3, 1, 2]);
    }

    #[test]
    fn test_placement_json() {
        let board = Leaderboard::from_ranked("c1", &rank(entries(&[0.5])));
        let json = serde_json::to_value(&board).expect("serializable");
        assert_eq!(json["first"]["kind"], "entry");
        assert_eq!(json["first"]["userId"], 1);
        assert_eq!(json["first"]["percentage"], 75);
        assert_eq!(json["second"]["kind"], "noEntry");
    }
}
