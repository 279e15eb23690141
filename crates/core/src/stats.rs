//! Read-only statistics derived from the quiz result history.
//!
//! Everything here is recomputed from the history on every call; nothing is
//! cached or persisted, so an achievement can lock again if the average drops.

use crate::model::QuizResult;

/// Number of completed attempts.
#[must_use]
pub fn total_tests(results: &[QuizResult]) -> usize {
    results.len()
}

/// Rounded mean score, or 0 for an empty history.
#[must_use]
pub fn average_score(results: &[QuizResult]) -> u8 {
    if results.is_empty() {
        return 0;
    }
    let sum: u64 = results.iter().map(|r| u64::from(r.score())).sum();
    let count = u64::try_from(results.len()).unwrap_or(u64::MAX);
    let avg = (sum * 2 + count) / (count * 2);
    u8::try_from(avg).unwrap_or(100)
}

/// The last `n` results, most recent first.
#[must_use]
pub fn recent_activity(results: &[QuizResult], n: usize) -> Vec<&QuizResult> {
    results.iter().rev().take(n).collect()
}

/// Milestones shown on the profile dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Achievement {
    /// At least one completed quiz.
    FirstSteps,
    /// At least five completed quizzes.
    QuizMaster,
    /// Average score of 80 or more.
    HonorStudent,
}

impl Achievement {
    pub const ALL: [Achievement; 3] = [
        Achievement::FirstSteps,
        Achievement::QuizMaster,
        Achievement::HonorStudent,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "First Steps",
            Achievement::QuizMaster => "Quiz Master",
            Achievement::HonorStudent => "Honor Student",
        }
    }

    #[must_use]
    pub fn is_unlocked(self, stats: &ProgressStats) -> bool {
        match self {
            Achievement::FirstSteps => stats.total_tests >= 1,
            Achievement::QuizMaster => stats.total_tests >= 5,
            Achievement::HonorStudent => stats.average_score >= 80,
        }
    }
}

/// Headline numbers the achievements are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressStats {
    pub total_tests: usize,
    pub average_score: u8,
}

impl ProgressStats {
    #[must_use]
    pub fn from_results(results: &[QuizResult]) -> Self {
        Self {
            total_tests: total_tests(results),
            average_score: average_score(results),
        }
    }

    #[must_use]
    pub fn achievements(&self) -> Vec<(Achievement, bool)> {
        Achievement::ALL
            .iter()
            .map(|a| (*a, a.is_unlocked(self)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuizId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn result_with_score(score: u32, offset_mins: i64) -> QuizResult {
        QuizResult::from_persisted(
            QuizId::new(format!("quiz-{offset_mins}")).unwrap(),
            "Quiz",
            score,
            10,
            score / 10,
            fixed_now() + Duration::minutes(offset_mins),
        )
        .unwrap()
    }

    #[test]
    fn average_of_empty_history_is_zero() {
        assert_eq!(average_score(&[]), 0);
    }

    #[test]
    fn average_is_rounded() {
        let results = [
            result_with_score(80, 0),
            result_with_score(60, 1),
            result_with_score(100, 2),
        ];
        assert_eq!(average_score(&results), 80);

        let results = [result_with_score(50, 0), result_with_score(60, 1), result_with_score(60, 2)];
        // 170 / 3 = 56.67
        assert_eq!(average_score(&results), 57);
    }

    #[test]
    fn recent_activity_is_reverse_chronological() {
        let results: Vec<_> = (0..5).map(|i| result_with_score(10 * i as u32, i)).collect();
        let recent = recent_activity(&results, 3);
        let minutes: Vec<_> = recent
            .iter()
            .map(|r| (r.completed_at() - fixed_now()).num_minutes())
            .collect();
        assert_eq!(minutes, vec![4, 3, 2]);
    }

    #[test]
    fn recent_activity_handles_short_history() {
        let results = [result_with_score(70, 0)];
        assert_eq!(recent_activity(&results, 3).len(), 1);
    }

    #[test]
    fn quiz_master_needs_five_attempts() {
        let mut results: Vec<_> = (0..4).map(|i| result_with_score(50, i)).collect();
        let stats = ProgressStats::from_results(&results);
        assert!(Achievement::FirstSteps.is_unlocked(&stats));
        assert!(!Achievement::QuizMaster.is_unlocked(&stats));

        results.push(result_with_score(50, 4));
        let stats = ProgressStats::from_results(&results);
        assert!(Achievement::QuizMaster.is_unlocked(&stats));
    }

    #[test]
    fn honor_student_can_lock_again() {
        let mut results = vec![result_with_score(90, 0)];
        assert!(Achievement::HonorStudent.is_unlocked(&ProgressStats::from_results(&results)));

        results.push(result_with_score(40, 1));
        assert!(!Achievement::HonorStudent.is_unlocked(&ProgressStats::from_results(&results)));
    }
}
