use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use lcars::{CancelToken, EnrichCategory, JobRunner, KvStore, Lcars, LcarsError};
use lcars_mock::{ManualClock, MemoryStore, MockProvider};
use lcars_types::{
    EpisodeId, Job, JobId, JobKind, JobStatus, MetadataSource, ProviderRecord, UnifiedMetadata,
};

fn id() -> EpisodeId {
    "ent_s1_e01".parse().unwrap()
}

fn record(source: MetadataSource) -> ProviderRecord {
    let fetched = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let mut record = ProviderRecord::new(id(), source, fetched);
    match source {
        MetadataSource::Tmdb => {
            record.air_date = Some("2001-09-26".to_string());
            record.directors = vec!["Allan Kroeker".to_string()];
        }
        _ => {
            record.title = Some("Broken Bow".to_string());
            record.synopsis = Some("Enterprise launches.".to_string());
            record.plot_points = vec!["First mission".to_string()];
        }
    }
    record
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
    ))
}

#[tokio::test]
async fn fan_out_merges_partial_records_with_provenance() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::Tmdb).with_record(record(MetadataSource::Tmdb)),
        ))
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::MemoryAlpha)
                .with_record(record(MetadataSource::MemoryAlpha)),
        ))
        .clock(clock())
        .build()
        .unwrap();

    let outcome = lcars.enrich(&id(), &CancelToken::new()).await;
    assert_eq!(outcome.category, EnrichCategory::Enriched);
    assert!(outcome.errors.is_empty());
    let metadata = outcome.metadata.unwrap();
    assert_eq!(metadata.data_source, MetadataSource::MemoryAlpha);
    assert_eq!(metadata.record.air_date, "2001-09-26");
    assert_eq!(metadata.record.title, "Broken Bow");
    assert!(metadata.confidence >= 0.7);
    assert!(metadata.is_validated);
}

#[tokio::test]
async fn a_failing_subset_only_reduces_coverage() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::MemoryAlpha)
                .with_record(record(MetadataSource::MemoryAlpha)),
        ))
        .with_provider(Arc::new(MockProvider::new(MetadataSource::Tmdb).fail_always(
            LcarsError::Http {
                status: 500,
                url: "https://api.themoviedb.org/x".to_string(),
            },
        )))
        .clock(clock())
        .build()
        .unwrap();

    let outcome = lcars.enrich(&id(), &CancelToken::new()).await;
    assert_eq!(outcome.category, EnrichCategory::Enriched);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(
        outcome.metadata.unwrap().data_source,
        MetadataSource::MemoryAlpha
    );
}

#[tokio::test]
async fn every_provider_failing_is_all_failed() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(MockProvider::new(MetadataSource::Tmdb).fail_always(
            LcarsError::Network("reset".to_string()),
        )))
        .clock(clock())
        .build()
        .unwrap();

    let outcome = lcars.enrich(&id(), &CancelToken::new()).await;
    assert_eq!(outcome.category, EnrichCategory::AllFailed);
    assert!(outcome.metadata.is_none());
    assert_eq!(outcome.errors.len(), 1);
}

#[tokio::test]
async fn providers_without_data_mean_no_data() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(MockProvider::new(MetadataSource::Tmdb)))
        .clock(clock())
        .build()
        .unwrap();

    let outcome = lcars.enrich(&id(), &CancelToken::new()).await;
    assert_eq!(outcome.category, EnrichCategory::NoData);
    assert!(outcome.metadata.is_none());
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn unavailable_providers_mean_no_providers() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(MockProvider::new(MetadataSource::Tmdb).unavailable()))
        .clock(clock())
        .build()
        .unwrap();

    let outcome = lcars.enrich(&id(), &CancelToken::new()).await;
    assert_eq!(outcome.category, EnrichCategory::NoProviders);
}

#[tokio::test]
async fn target_sources_restrict_the_fan_out() {
    let tmdb = Arc::new(
        MockProvider::new(MetadataSource::Tmdb).with_record(record(MetadataSource::Tmdb)),
    );
    let alpha = Arc::new(
        MockProvider::new(MetadataSource::MemoryAlpha)
            .with_record(record(MetadataSource::MemoryAlpha)),
    );
    let lcars = Lcars::builder()
        .with_provider(tmdb.clone())
        .with_provider(alpha.clone())
        .clock(clock())
        .build()
        .unwrap();

    let outcome = lcars
        .enrich_filtered(&id(), &[MetadataSource::Tmdb], &CancelToken::new())
        .await;
    assert_eq!(outcome.category, EnrichCategory::Enriched);
    assert_eq!(tmdb.calls(), 1);
    assert_eq!(alpha.calls(), 0);
    assert_eq!(outcome.metadata.unwrap().data_source, MetadataSource::Tmdb);
}

#[tokio::test]
async fn ill_formed_ids_are_validation_errors() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(MockProvider::new(MetadataSource::Tmdb)))
        .build()
        .unwrap();
    let err = lcars.enrich_str("ENT-1x01").await.unwrap_err();
    assert!(matches!(err, LcarsError::Validation(_)));
}

#[tokio::test(start_paused = true)]
async fn slow_providers_are_timed_out_individually() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::Tmdb)
                .with_record(record(MetadataSource::Tmdb))
                .with_delay(Duration::from_secs(120)),
        ))
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::MemoryAlpha)
                .with_record(record(MetadataSource::MemoryAlpha)),
        ))
        .provider_timeout(Duration::from_millis(200))
        .clock(clock())
        .build()
        .unwrap();

    let outcome = lcars.enrich(&id(), &CancelToken::new()).await;
    assert_eq!(outcome.category, EnrichCategory::Enriched);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(outcome.errors[0], LcarsError::Timeout { .. }));
}

#[tokio::test]
async fn duplicate_sources_are_rejected_at_build() {
    let err = Lcars::builder()
        .with_provider(Arc::new(MockProvider::new(MetadataSource::Tmdb)))
        .with_provider(Arc::new(MockProvider::new(MetadataSource::Tmdb)))
        .build()
        .unwrap_err();
    assert!(matches!(err, LcarsError::Validation(_)));
}

#[tokio::test]
async fn an_empty_builder_is_rejected() {
    assert!(Lcars::builder().build().is_err());
}

#[tokio::test]
async fn run_job_persists_enriched_metadata() {
    let store = Arc::new(MemoryStore::new());
    let lcars = Lcars::builder()
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::MemoryAlpha)
                .with_record(record(MetadataSource::MemoryAlpha)),
        ))
        .store(store.clone())
        .clock(clock())
        .build()
        .unwrap();

    let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    let job = Job {
        id: JobId(1),
        episode: id(),
        kind: JobKind::Enrich,
        priority: 10,
        status: JobStatus::InProgress,
        retry_count: 0,
        max_retries: 3,
        created_at: now,
        updated_at: now,
        scheduled_at: now,
        last_error: None,
        strategy: None,
        target_sources: Vec::new(),
    };
    lcars.run_job(&job, &CancelToken::new()).await.unwrap();

    let raw = store
        .get(&Lcars::metadata_key(&id()))
        .await
        .unwrap()
        .expect("persisted metadata");
    let metadata: UnifiedMetadata = serde_json::from_slice(&raw).unwrap();
    assert_eq!(metadata.episode, id());
    assert_eq!(metadata.data_source, MetadataSource::MemoryAlpha);
}

#[tokio::test]
async fn enrich_many_reports_per_episode_outcomes() {
    let lcars = Lcars::builder()
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::MemoryAlpha)
                .with_record(record(MetadataSource::MemoryAlpha)),
        ))
        .clock(clock())
        .build()
        .unwrap();

    let other: EpisodeId = "ent_s1_e02".parse().unwrap();
    let results = lcars.enrich_many(&[id(), other.clone()], 2).await;
    assert_eq!(results.len(), 2);
    let hit = results.iter().find(|(e, _)| *e == id()).unwrap();
    assert_eq!(hit.1.category, EnrichCategory::Enriched);
    let miss = results.iter().find(|(e, _)| *e == other).unwrap();
    assert_eq!(miss.1.category, EnrichCategory::NoData);
}
