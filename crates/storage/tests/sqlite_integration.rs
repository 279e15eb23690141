use chrono::Duration;
use storage::repository::{MessageRepository, QuizResultRepository, StorageError, TaskRepository};
use storage::sqlite::SqliteRepository;
use tutor_core::model::{
    Author, ChatMessage, Difficulty, MessageId, QuizId, QuizResult, TaskId, TaskKind,
    TaskSuggestion,
};
use tutor_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn result(quiz: &str, correct: u32, offset_mins: i64) -> QuizResult {
    QuizResult::new(
        QuizId::new(quiz).unwrap(),
        "Algebra Basics",
        3,
        correct,
        fixed_now() + Duration::minutes(offset_mins),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_results_accumulate_in_order() {
    let repo = connect("memdb_results").await;

    let first = repo.append_result(&result("algebra-basics", 1, 0)).await.unwrap();
    let second = repo.append_result(&result("algebra-basics", 3, 5)).await.unwrap();
    assert!(second > first);

    let all = repo.list_results().await.unwrap();
    let scores: Vec<_> = all.iter().map(QuizResult::score).collect();
    assert_eq!(scores, vec![33, 100]);
    assert_eq!(all[1].completed_at(), fixed_now() + Duration::minutes(5));
}

#[tokio::test]
async fn sqlite_completed_tasks_are_a_set() {
    let repo = connect("memdb_tasks").await;
    let physics = TaskId::new("newton-laws").unwrap();
    let biology = TaskId::new("cell-biology").unwrap();

    assert!(repo.mark_completed(&physics, fixed_now()).await.unwrap());
    assert!(repo.mark_completed(&biology, fixed_now()).await.unwrap());
    assert!(!repo.mark_completed(&physics, fixed_now()).await.unwrap());

    assert!(repo.is_completed(&biology).await.unwrap());
    assert!(!repo.is_completed(&TaskId::new("other").unwrap()).await.unwrap());
    assert_eq!(repo.list_completed().await.unwrap(), vec![physics, biology]);
}

#[tokio::test]
async fn sqlite_messages_keep_tasks_and_prune_oldest() {
    let repo = connect("memdb_messages").await;

    let question = ChatMessage::new(MessageId::random(), Author::User, "physics please", fixed_now())
        .unwrap();
    let task = TaskSuggestion {
        task_id: TaskId::new("newton-laws").unwrap(),
        kind: TaskKind::Quiz,
        title: "Newton's Laws".into(),
        description: "Forces and motion".into(),
        category: "Physics".into(),
        difficulty: Difficulty::Intermediate,
        estimated_time: "15 min".into(),
    };
    let suggestion = ChatMessage::new(
        MessageId::random(),
        Author::Tutor,
        "Try this quiz",
        fixed_now() + Duration::seconds(1),
    )
    .unwrap()
    .with_task(task.clone());

    repo.append_message(&question).await.unwrap();
    repo.append_message(&suggestion).await.unwrap();
    assert!(matches!(
        repo.append_message(&question).await.unwrap_err(),
        StorageError::Conflict
    ));

    let messages = repo.list_messages().await.unwrap();
    assert_eq!(messages, vec![question.clone(), suggestion.clone()]);
    assert_eq!(messages[1].task(), Some(&task));

    assert_eq!(repo.prune_messages(1).await.unwrap(), 1);
    assert_eq!(repo.list_messages().await.unwrap(), vec![suggestion]);
    assert_eq!(repo.user_message_total().await.unwrap(), 1);
}

#[tokio::test]
async fn sqlite_user_message_total_survives_pruning() {
    let repo = connect("memdb_counter").await;
    assert_eq!(repo.user_message_total().await.unwrap(), 0);

    for i in 0..4 {
        let msg = ChatMessage::new(
            MessageId::random(),
            Author::User,
            format!("question {i}"),
            fixed_now() + Duration::seconds(i),
        )
        .unwrap();
        repo.append_message(&msg).await.unwrap();
        repo.prune_messages(2).await.unwrap();
    }
    let reply = ChatMessage::new(MessageId::random(), Author::Tutor, "answer", fixed_now()).unwrap();
    repo.append_message(&reply).await.unwrap();

    assert_eq!(repo.list_messages().await.unwrap().len(), 3);
    assert_eq!(repo.user_message_total().await.unwrap(), 4);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate").await;
    repo.migrate().await.expect("second migrate");
    repo.append_result(&result("algebra-basics", 2, 0)).await.unwrap();
    assert_eq!(repo.list_results().await.unwrap().len(), 1);
}
