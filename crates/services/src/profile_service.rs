use std::sync::Arc;

use tutor_core::model::QuizResult;
use tutor_core::stats::{self, Achievement, ProgressStats};

use crate::error::ProgressError;
use crate::progress_service::ProgressService;

/// Number of results shown under "recent activity" on the dashboard.
pub const DEFAULT_RECENT_LIMIT: usize = 3;

/// Profile dashboard numbers, recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub total_tests: usize,
    pub average_score: u8,
    /// Messages the learner ever sent to the tutor, unaffected by the history cap.
    pub questions_asked: u64,
    pub completed_tasks: usize,
    /// Most recent first.
    pub recent: Vec<QuizResult>,
    pub achievements: Vec<(Achievement, bool)>,
}

impl ProfileSummary {
    #[must_use]
    pub fn unlocked(&self) -> impl Iterator<Item = Achievement> + '_ {
        self.achievements
            .iter()
            .filter(|(_, unlocked)| *unlocked)
            .map(|(achievement, _)| *achievement)
    }
}

#[derive(Clone)]
pub struct ProfileService {
    progress: Arc<ProgressService>,
}

impl ProfileService {
    #[must_use]
    pub fn new(progress: Arc<ProgressService>) -> Self {
        Self { progress }
    }

    /// # Errors
    ///
    /// Returns `ProgressError` if the history cannot be read.
    pub async fn summary(&self, recent_limit: usize) -> Result<ProfileSummary, ProgressError> {
        let results = self.progress.results().await?;
        let questions_asked = self.progress.questions_asked().await?;
        let completed_tasks = self.progress.completed_tasks().await?.len();

        let progress_stats = ProgressStats::from_results(&results);
        Ok(ProfileSummary {
            total_tests: progress_stats.total_tests,
            average_score: progress_stats.average_score,
            questions_asked,
            completed_tasks,
            recent: stats::recent_activity(&results, recent_limit)
                .into_iter()
                .cloned()
                .collect(),
            achievements: progress_stats.achievements(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;
    use tutor_core::model::{Author, ChatMessage, MessageId, QuizId};
    use tutor_core::time::{fixed_clock, fixed_now};

    async fn seeded(scores: &[u32]) -> ProfileService {
        let progress = Arc::new(ProgressService::from_storage(
            fixed_clock(),
            &Storage::in_memory(),
        ));
        for (i, correct) in scores.iter().enumerate() {
            let result = QuizResult::new(
                QuizId::new(format!("quiz-{i}")).unwrap(),
                "Quiz",
                10,
                *correct,
                fixed_now(),
            )
            .unwrap();
            progress.append_result(&result).await.unwrap();
        }
        ProfileService::new(progress)
    }

    #[tokio::test]
    async fn empty_history_has_nothing_unlocked() {
        let summary = seeded(&[]).await.summary(DEFAULT_RECENT_LIMIT).await.unwrap();
        assert_eq!(summary.total_tests, 0);
        assert_eq!(summary.average_score, 0);
        assert!(summary.recent.is_empty());
        assert_eq!(summary.unlocked().count(), 0);
    }

    #[tokio::test]
    async fn summary_matches_history() {
        let profile = seeded(&[8, 6, 10, 9, 9]).await;
        let summary = profile.summary(DEFAULT_RECENT_LIMIT).await.unwrap();

        assert_eq!(summary.total_tests, 5);
        assert_eq!(summary.average_score, 84);
        let recent: Vec<_> = summary.recent.iter().map(QuizResult::score).collect();
        assert_eq!(recent, vec![90, 90, 100]);
        let unlocked: Vec<_> = summary.unlocked().collect();
        assert_eq!(unlocked, Achievement::ALL.to_vec());
    }

    #[tokio::test]
    async fn only_user_messages_count_as_questions() {
        let profile = seeded(&[]).await;
        for (author, text) in [(Author::User, "hi"), (Author::Tutor, "hello"), (Author::User, "why?")] {
            let msg = ChatMessage::new(MessageId::random(), author, text, fixed_now()).unwrap();
            profile.progress.append_message(&msg).await.unwrap();
        }
        assert_eq!(profile.summary(3).await.unwrap().questions_asked, 2);
    }

    #[tokio::test]
    async fn questions_asked_outlives_the_history_cap() {
        let progress = Arc::new(
            ProgressService::from_storage(fixed_clock(), &Storage::in_memory()).with_message_cap(2),
        );
        for text in ["one", "two", "three", "four"] {
            let msg = ChatMessage::new(MessageId::random(), Author::User, text, fixed_now()).unwrap();
            progress.append_message(&msg).await.unwrap();
        }
        let summary = ProfileService::new(progress).summary(3).await.unwrap();
        assert_eq!(summary.questions_asked, 4);
    }
}
