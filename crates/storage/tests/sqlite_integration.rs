use chrono::Duration;
use progress_core::analytics::{Attempt, record_attempt};
use progress_core::model::{
    AttemptSource, Difficulty, ExamType, LearnerId, ProgressKey, TopicProgress,
};
use progress_core::time::fixed_now;
use storage::repository::{ProgressFilter, ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn build_progress(learner: u64, topic: &str, exam: ExamType) -> TopicProgress {
    let key = ProgressKey::new(LearnerId::new(learner), topic, exam);
    TopicProgress::new(key, Difficulty::Hard, AttemptSource::Quiz, fixed_now()).unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_record_and_subtopic_order() {
    let repo = connect("memdb_roundtrip").await;

    let mut progress = build_progress(1, "Mechanics", ExamType::Jee);
    let yesterday = fixed_now() - Duration::days(1);
    record_attempt(
        &mut progress,
        &Attempt::new(true, 45).with_subtopic("Kinematics"),
        yesterday,
    );
    record_attempt(
        &mut progress,
        &Attempt::new(false, 30).with_subtopic("Friction"),
        fixed_now(),
    );
    record_attempt(
        &mut progress,
        &Attempt::new(true, 20)
            .with_subtopic("Kinematics")
            .with_source(AttemptSource::Test),
        fixed_now(),
    );
    let revision = repo.upsert_progress(&progress).await.unwrap();
    assert_eq!(revision, 1);
    let progress = progress.with_revision(revision);

    let fetched = repo
        .get_progress(progress.key())
        .await
        .unwrap()
        .expect("stored record");
    assert_eq!(fetched, progress);
    let names: Vec<_> = fetched.subtopics().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["Kinematics", "Friction"]);
    assert_eq!(fetched.streak().last_updated, progress.streak().last_updated);
    assert_eq!(fetched.metadata().source, AttemptSource::Test);
}

#[tokio::test]
async fn sqlite_upsert_keeps_one_row_per_key() {
    let repo = connect("memdb_upsert").await;

    let mut progress = build_progress(3, "Probability", ExamType::Cat);
    record_attempt(&mut progress, &Attempt::new(true, 10), fixed_now());
    let revision = repo.upsert_progress(&progress).await.unwrap();
    let mut progress = progress.with_revision(revision);
    record_attempt(
        &mut progress,
        &Attempt::new(false, 10).with_subtopic("Bayes"),
        fixed_now(),
    );
    assert_eq!(repo.upsert_progress(&progress).await.unwrap(), 2);

    let all = repo
        .list_progress(&ProgressFilter::learner(LearnerId::new(3)))
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].total_questions(), 2);
    assert_eq!(all[0].subtopics().len(), 1);
}

#[tokio::test]
async fn sqlite_list_filters_and_orders() {
    let repo = connect("memdb_list").await;

    for (learner, topic, exam) in [
        (1, "Optics", ExamType::Neet),
        (1, "Algebra", ExamType::Gate),
        (1, "Algebra", ExamType::Jee),
        (2, "Algebra", ExamType::Jee),
    ] {
        let mut p = build_progress(learner, topic, exam);
        record_attempt(
            &mut p,
            &Attempt::new(true, 5).with_subtopic(format!("{topic}-{exam}")),
            fixed_now(),
        );
        repo.upsert_progress(&p).await.unwrap();
    }

    let mine = repo
        .list_progress(&ProgressFilter::learner(LearnerId::new(1)))
        .await
        .unwrap();
    let keys: Vec<_> = mine
        .iter()
        .map(|p| (p.topic().to_owned(), p.key().exam_type))
        .collect();
    assert_eq!(
        keys,
        [
            ("Algebra".to_owned(), ExamType::Jee),
            ("Algebra".to_owned(), ExamType::Gate),
            ("Optics".to_owned(), ExamType::Neet),
        ]
    );
    // Subtopics stay attached to their own record.
    assert_eq!(mine[1].subtopics()[0].name(), "Algebra-gate");

    let gate = repo
        .list_progress(
            &ProgressFilter::learner(LearnerId::new(1)).with_exam_type(Some(ExamType::Gate)),
        )
        .await
        .unwrap();
    assert_eq!(gate.len(), 1);
    assert_eq!(gate[0].topic(), "Algebra");
}

#[tokio::test]
async fn sqlite_rejects_writes_based_on_a_stale_revision() {
    let repo = connect("memdb_conflict").await;

    let mut progress = build_progress(4, "Genetics", ExamType::Neet);
    record_attempt(
        &mut progress,
        &Attempt::new(true, 10).with_subtopic("Mendel"),
        fixed_now(),
    );
    repo.upsert_progress(&progress).await.unwrap();
    assert!(matches!(
        repo.upsert_progress(&progress).await,
        Err(StorageError::Conflict { expected: 0, .. })
    ));

    let read = repo.get_progress(progress.key()).await.unwrap().unwrap();
    assert_eq!(read.revision(), 1);
    let mut first = read.clone();
    let mut second = read;
    record_attempt(&mut first, &Attempt::new(true, 10), fixed_now());
    record_attempt(
        &mut second,
        &Attempt::new(false, 10).with_subtopic("Linkage"),
        fixed_now(),
    );

    assert_eq!(repo.upsert_progress(&first).await.unwrap(), 2);
    assert!(matches!(
        repo.upsert_progress(&second).await,
        Err(StorageError::Conflict { expected: 1, .. })
    ));

    // The rejected write left neither its counters nor its subtopics behind.
    let stored = repo.get_progress(progress.key()).await.unwrap().unwrap();
    assert_eq!(stored.revision(), 2);
    assert_eq!(stored.total_questions(), 2);
    assert_eq!(stored.correct_answers(), 2);
    assert!(stored.subtopic("Linkage").is_none());
}

#[tokio::test]
async fn storage_sqlite_builds_and_misses_cleanly() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let key = ProgressKey::new(LearnerId::new(5), "Nothing", ExamType::Sat);
    assert!(storage.progress.get_progress(&key).await.unwrap().is_none());
}
