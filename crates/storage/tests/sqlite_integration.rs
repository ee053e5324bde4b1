use std::collections::BTreeSet;

use chrono::Duration;
use quiz_core::model::{QuestionId, QuestionScore, QuizResult, SubmitTrigger};
use quiz_core::time::fixed_now;
use storage::repository::{QuizResultRepository, SolvedSetStore, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn ids(raw: &[u64]) -> BTreeSet<QuestionId> {
    raw.iter().copied().map(QuestionId::new).collect()
}

fn result_at(offset_secs: i64, trigger: SubmitTrigger) -> QuizResult {
    let started = fixed_now() + Duration::seconds(offset_secs);
    QuizResult::new(
        started,
        started + Duration::seconds(95),
        trigger,
        85,
        vec![
            QuestionScore {
                question_id: QuestionId::new(1),
                topic: "Photosynthesis".into(),
                answer: "light is absorbed".into(),
                score: 2,
                max_score: 4,
            },
            QuestionScore {
                question_id: QuestionId::new(5),
                topic: "Climate Change".into(),
                answer: String::new(),
                score: 0,
                max_score: 1,
            },
        ],
    )
}

#[tokio::test]
async fn sqlite_solved_set_replaces_contents() {
    let repo = connect("memdb_solved_set").await;
    assert!(repo.get().await.unwrap().is_empty());

    repo.set(&ids(&[1, 2, 3])).await.unwrap();
    assert_eq!(repo.get().await.unwrap(), ids(&[1, 2, 3]));

    repo.set(&ids(&[2, 3, 4])).await.unwrap();
    assert_eq!(repo.get().await.unwrap(), ids(&[2, 3, 4]));

    repo.clear().await.unwrap();
    assert!(repo.get().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.set(&ids(&[9])).await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get().await.unwrap(), ids(&[9]));
}

#[tokio::test]
async fn sqlite_results_round_trip_in_order() {
    let repo = connect("memdb_results").await;

    let older = result_at(0, SubmitTrigger::Manual);
    let newer = result_at(600, SubmitTrigger::Expired);
    let older_id = repo.append_result(&older).await.unwrap();
    let newer_id = repo.append_result(&newer).await.unwrap();

    let fetched = repo.get_result(older_id).await.unwrap();
    assert_eq!(fetched, older);
    assert_eq!(fetched.total_score(), 2);
    assert_eq!(fetched.max_score(), 5);

    let rows = repo.list_results(10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, newer_id);
    assert_eq!(rows[0].result.trigger(), SubmitTrigger::Expired);
    assert_eq!(rows[1].result.scores()[0].answer, "light is absorbed");

    assert_eq!(repo.list_results(1).await.unwrap().len(), 1);
    assert!(matches!(
        repo.get_result(newer_id + 100).await,
        Err(StorageError::NotFound)
    ));
}
