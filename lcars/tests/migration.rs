use std::sync::Arc;

use chrono::{TimeZone, Utc};

use lcars::{KvStore, MigrationEngine};
use lcars_mock::{CollectingSink, ManualClock, MemoryStore, StaticCatalog};
use lcars_types::{MigrationTransaction, ProgressVersion};

struct Fixture {
    engine: MigrationEngine,
    store: Arc<MemoryStore>,
    sink: Arc<CollectingSink>,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(CollectingSink::new());
    let catalog = Arc::new(StaticCatalog::new().with_series("ent", "Enterprise", "ENT", &[26, 26]));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ));
    let engine = MigrationEngine::new(store.clone(), catalog, clock, sink.clone());
    Fixture {
        engine,
        store,
        sink,
    }
}

async fn seed_progress(store: &MemoryStore, items: &[&str]) {
    let list: Vec<String> = items.iter().map(ToString::to_string).collect();
    store
        .set(MigrationEngine::PROGRESS_KEY, serde_json::to_vec(&list).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn forward_expands_complete_seasons_and_preserves_movies() {
    let f = fixture();
    seed_progress(&f.store, &["ent_s1", "movie-tmp"]).await;

    let report = f.engine.migrate_to_episode_level().await;
    assert!(report.success);
    assert_eq!(report.progress.len(), 27);
    assert_eq!(report.progress[0], "ent_s1_e01");
    assert_eq!(report.progress[25], "ent_s1_e26");
    assert_eq!(report.progress[26], "movie-tmp");
    assert_eq!(report.converted, 1);
    assert_eq!(report.preserved, 1);
    assert!(report.can_rollback);

    let state = f.engine.state().await;
    assert_eq!(state.current_version, ProgressVersion::EpisodeLevel);
    assert!(state.rollback_available);
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.history[0].item_count, 27);
    assert!(state.open_transaction.is_none());

    let labels = f.sink.labels();
    assert_eq!(labels, vec!["migration-started", "migration-completed"]);
}

#[tokio::test]
async fn rollback_drops_partial_seasons_lossily() {
    let f = fixture();
    seed_progress(&f.store, &["ent_s1_e01", "ent_s1_e02", "movie-tmp"]).await;

    let report = f.engine.rollback_to_season_level().await;
    assert!(report.success);
    assert_eq!(report.progress, vec!["movie-tmp".to_string()]);
    assert_eq!(report.dropped, 2);
    assert!(!report.can_rollback);
    assert!(report.warnings.iter().any(|w| w.contains("partial season")));

    let state = f.engine.state().await;
    assert_eq!(state.current_version, ProgressVersion::SeasonLevel);
    assert!(!state.rollback_available);
}

#[tokio::test]
async fn rollback_coalesces_complete_seasons() {
    let f = fixture();
    let episodes: Vec<String> = (1..=26).map(|n| format!("ent_s1_e{n:02}")).collect();
    let mut items: Vec<&str> = episodes.iter().map(String::as_str).collect();
    items.push("movie-tmp");
    seed_progress(&f.store, &items).await;

    let report = f.engine.rollback_to_season_level().await;
    assert!(report.success);
    assert_eq!(
        report.progress,
        vec!["ent_s1".to_string(), "movie-tmp".to_string()]
    );
    assert_eq!(report.converted, 1);
    assert_eq!(report.dropped, 0);
    assert!(report.can_rollback);
}

#[tokio::test]
async fn forward_then_rollback_is_identity_for_complete_seasons() {
    let f = fixture();
    seed_progress(&f.store, &["ent_s1", "movie-tmp"]).await;

    let forward = f.engine.migrate_to_episode_level().await;
    assert!(forward.success);
    let back = f.engine.rollback_to_season_level().await;
    assert!(back.success);
    assert_eq!(
        back.progress,
        vec!["ent_s1".to_string(), "movie-tmp".to_string()]
    );
}

#[tokio::test]
async fn empty_progress_migrates_successfully() {
    let f = fixture();
    let report = f.engine.migrate_to_episode_level().await;
    assert!(report.success);
    assert!(report.progress.is_empty());
    assert_eq!(report.converted + report.preserved, 0);
}

#[tokio::test]
async fn unknown_seasons_are_preserved_verbatim_with_a_warning() {
    let f = fixture();
    seed_progress(&f.store, &["xyz_s1", "ent_s1"]).await;

    let report = f.engine.migrate_to_episode_level().await;
    assert!(report.success);
    assert!(report.errors.is_empty());
    assert_eq!(report.progress[0], "xyz_s1");
    assert_eq!(report.progress.len(), 27);
    assert!(report.warnings.iter().any(|w| w.contains("xyz_s1")));
}

#[tokio::test]
async fn corrupt_state_falls_back_to_defaults() {
    let f = fixture();
    f.store
        .set(MigrationEngine::STATE_KEY, b"{not json".to_vec())
        .await
        .unwrap();

    let state = f.engine.state().await;
    assert_eq!(state, Default::default());
}

#[tokio::test]
async fn aborting_a_transaction_restores_the_snapshot() {
    let f = fixture();
    seed_progress(&f.store, &["ent_s1_e01"]).await;
    let tx = MigrationTransaction {
        id: 42,
        started_at: Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap(),
        snapshot: vec!["ent_s1".to_string()],
        target: ProgressVersion::EpisodeLevel,
        completed: false,
    };
    f.store
        .set(
            "migration_transaction_42",
            serde_json::to_vec(&tx).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(f.engine.open_transactions().await.len(), 1);

    let report = f.engine.abort_transaction(42).await;
    assert!(report.success);
    assert_eq!(report.progress, vec!["ent_s1".to_string()]);
    assert_eq!(f.engine.progress().await, vec!["ent_s1".to_string()]);
    assert!(f.engine.open_transactions().await.is_empty());
    assert_eq!(f.sink.labels().last(), Some(&"migration-rolled-back"));
}

#[tokio::test]
async fn duplicate_ids_collapse_because_progress_is_a_set() {
    let f = fixture();
    seed_progress(&f.store, &["ent_s1_e01", "ent_s1_e01", "movie-tmp"]).await;
    let report = f.engine.rollback_to_season_level().await;
    // Two copies of one episode still fall short of a complete season.
    assert_eq!(report.progress, vec!["movie-tmp".to_string()]);
}
