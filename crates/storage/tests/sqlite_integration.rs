use study_core::model::{
    Checkpoint, ParticipantId, Phase, PhaseOutcome, RunId, RunResult, SessionStage,
};
use study_core::time::fixed_now;
use storage::repository::{CheckpointRepository, RunResultRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn pid(raw: &str) -> ParticipantId {
    ParticipantId::new(raw).unwrap()
}

fn build_checkpoint(participant: &str, stage: SessionStage) -> Checkpoint {
    Checkpoint::new(
        pid(participant),
        stage,
        fixed_now(),
        serde_json::json!({ "pre_raw": [], "note": participant }),
    )
}

fn build_result(participant: Option<&str>) -> RunResult {
    let empty = PhaseOutcome::from_records(Phase::Pre, &[]).unwrap();
    RunResult {
        run_id: RunId::new(),
        consented: true,
        participant_id: participant.map(pid),
        operator_uid: None,
        resumed: false,
        pre: empty.clone(),
        post: empty,
        completed_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_checkpoint_roundtrip_and_overwrite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_checkpoint?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = pid("KNU-0421");
    assert_eq!(repo.get(&id).await.unwrap(), None);

    let checkpoint = build_checkpoint("KNU-0421", SessionStage::PreDone);
    repo.put(&checkpoint).await.unwrap();

    let fetched = repo.get(&id).await.unwrap().expect("stored");
    assert_eq!(fetched, checkpoint);
    assert!(fetched.is_resumable());

    // a later save replaces the record wholesale
    let replaced = Checkpoint::new(
        id.clone(),
        SessionStage::MonsterDone,
        fixed_now() + chrono::Duration::minutes(10),
        serde_json::json!({}),
    );
    repo.put(&replaced).await.unwrap();

    let fetched = repo.get(&id).await.unwrap().expect("stored");
    assert_eq!(fetched.stage(), SessionStage::MonsterDone);
    assert_eq!(fetched.payload(), &serde_json::json!({}));

    repo.clear(&id).await.unwrap();
    assert_eq!(repo.get(&id).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_checkpoints_are_namespaced_per_participant() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_namespace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.put(&build_checkpoint("P1", SessionStage::PreDone))
        .await
        .unwrap();
    repo.put(&build_checkpoint("P2", SessionStage::PostDone))
        .await
        .unwrap();

    repo.clear(&pid("P1")).await.unwrap();

    assert_eq!(repo.get(&pid("P1")).await.unwrap(), None);
    let kept = repo.get(&pid("P2")).await.unwrap().expect("kept");
    assert_eq!(kept.stage(), SessionStage::PostDone);
}

#[tokio::test]
async fn sqlite_run_results_append_get_and_list() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_results?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = build_result(Some("P1"));
    let id_first = repo.append_result(&first).await.unwrap();
    let id_other = repo.append_result(&build_result(Some("P2"))).await.unwrap();
    assert_ne!(id_first, id_other);

    let fetched = repo.get_result(id_first).await.unwrap();
    assert_eq!(fetched, first);

    let listed = repo.list_results_for(&pid("P1")).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id_first);

    let err = repo.get_result(9_999).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_stores_results_without_participant_id() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_anonymous?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = repo.append_result(&build_result(None)).await.unwrap();
    let fetched = repo.get_result(id).await.unwrap();
    assert_eq!(fetched.participant_id, None);
}
