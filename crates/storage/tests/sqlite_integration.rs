use course_core::model::{LessonId, LessonProgress, QuizId, QuizProgress, UserId};
use course_core::time::fixed_now;
use course_storage::repository::{
    LessonProgressRepository, QuizProgressRepository, StorageError,
};
use course_storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrips_lesson_progress_states() {
    let repo = connect("memdb_lesson_roundtrip").await;
    let user = UserId::random();
    let lesson = LessonId::new(1);

    let started = LessonProgress::started(user, lesson, 15, fixed_now());
    repo.upsert_lesson_progress(&started).await.unwrap();

    let fetched = repo
        .get_lesson_progress(user, lesson)
        .await
        .unwrap()
        .expect("record");
    assert_eq!(fetched.duration_secs(), Some(15));
    assert!(!fetched.is_completed());
    assert!(fetched.completed_at().is_none());

    let later = fixed_now() + chrono::Duration::seconds(105);
    let completed = fetched
        .with_duration(110, fixed_now())
        .unwrap()
        .complete(Some(120), later);
    repo.upsert_lesson_progress(&completed).await.unwrap();

    let fetched = repo
        .get_lesson_progress(user, lesson)
        .await
        .unwrap()
        .expect("record");
    assert!(fetched.is_completed());
    assert_eq!(fetched.duration_secs(), Some(120));
    assert_eq!(fetched.completed_at(), Some(later));
}

#[tokio::test]
async fn sqlite_stores_untimed_completion_with_null_duration() {
    let repo = connect("memdb_untimed").await;
    let user = UserId::random();
    let lesson = LessonId::new(3);

    let record = LessonProgress::completed(user, lesson, None, fixed_now());
    repo.upsert_lesson_progress(&record).await.unwrap();

    let fetched = repo
        .get_lesson_progress(user, lesson)
        .await
        .unwrap()
        .expect("record");
    assert_eq!(fetched.duration_secs(), None);
    assert!(fetched.is_completed());
}

#[tokio::test]
async fn sqlite_lists_per_user_in_lesson_order() {
    let repo = connect("memdb_listing").await;
    let user = UserId::random();
    let other = UserId::random();

    for id in [4_u64, 2, 9] {
        let record = LessonProgress::started(user, LessonId::new(id), 10, fixed_now());
        repo.upsert_lesson_progress(&record).await.unwrap();
    }
    let foreign = LessonProgress::started(other, LessonId::new(1), 10, fixed_now());
    repo.upsert_lesson_progress(&foreign).await.unwrap();

    let listed = repo.list_lesson_progress(user).await.unwrap();
    let ids: Vec<u64> = listed.iter().map(|p| p.lesson_id().value()).collect();
    assert_eq!(ids, vec![2, 4, 9]);
}

#[tokio::test]
async fn sqlite_delete_semantics_match_the_contract() {
    let repo = connect("memdb_delete").await;
    let user = UserId::random();

    let err = repo
        .delete_lesson_progress(user, LessonId::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    for id in 1..=3_u64 {
        let record = LessonProgress::started(user, LessonId::new(id), 10, fixed_now());
        repo.upsert_lesson_progress(&record).await.unwrap();
    }

    repo.delete_lesson_progress(user, LessonId::new(2))
        .await
        .unwrap();
    let removed = repo.delete_all_lesson_progress(user).await.unwrap();
    assert_eq!(removed, 2);

    assert!(repo.list_lesson_progress(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_quiz_retake_replaces_the_row() {
    let repo = connect("memdb_quiz").await;
    let user = UserId::random();
    let quiz = QuizId::new(7);

    let passed = QuizProgress::record(user, quiz, 85, 70, fixed_now());
    repo.upsert_quiz_progress(&passed).await.unwrap();

    let retake = QuizProgress::record(user, quiz, 40, 70, fixed_now());
    repo.upsert_quiz_progress(&retake).await.unwrap();

    let fetched = repo
        .get_quiz_progress(user, quiz)
        .await
        .unwrap()
        .expect("record");
    assert_eq!(fetched.score(), 40);
    assert!(!fetched.is_completed());

    let listed = repo.list_quiz_progress(user).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let user = UserId::random();
    let record = LessonProgress::started(user, LessonId::new(1), 5, fixed_now());
    repo.upsert_lesson_progress(&record).await.unwrap();
    assert!(
        repo.get_lesson_progress(user, LessonId::new(1))
            .await
            .unwrap()
            .is_some()
    );
}
