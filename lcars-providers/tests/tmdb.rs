use std::sync::Arc;

use lcars_core::{CancelToken, MetadataProvider};
use lcars_mock::MockFetcher;
use lcars_providers::TmdbClient;
use lcars_types::{EpisodeField, EpisodeId, MetadataSource};

const URL: &str = "https://api.themoviedb.org/3/tv/314/season/1/episode/1?api_key=KEY&append_to_response=external_ids";

fn id() -> EpisodeId {
    "ent_s1_e01".parse().unwrap()
}

fn fixture() -> Vec<u8> {
    serde_json::json!({
        "id": 228343,
        "name": "Broken Bow (1)",
        "overview": "Enterprise launches ahead of schedule.<script>alert(1)</script>",
        "air_date": "2001-09-26",
        "production_code": "001",
        "crew": [
            {"job": "Director", "name": "James L. Conway"},
            {"job": "Writer", "name": "Rick Berman"},
            {"job": "Teleplay", "name": "Brannon Braga"},
            {"job": "Editor", "name": "Someone Else"}
        ],
        "guest_stars": [{"name": "John Fleck"}],
        "external_ids": {"imdb_id": "tt0572248"}
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn series_id_map_is_bit_compatible() {
    for (series, expected) in [
        ("tos", 253),
        ("tng", 655),
        ("ds9", 580),
        ("voy", 1855),
        ("ent", 314),
        ("dis", 67198),
        ("pic", 85949),
        ("low", 85948),
        ("pro", 85950),
        ("snw", 114472),
    ] {
        assert_eq!(TmdbClient::series_id(series), Some(expected));
    }
    assert_eq!(TmdbClient::series_id("xyz"), None);
}

#[tokio::test]
async fn parses_an_episode_payload_into_a_neutral_record() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, &fixture());
    let client = TmdbClient::new(Arc::clone(&fetcher) as _, Some("KEY".to_string()), None);

    let record = client
        .fetch_episode(&id(), &CancelToken::new())
        .await
        .unwrap()
        .expect("record");

    assert_eq!(fetcher.requests(), vec![URL.to_string()]);
    assert_eq!(record.source, MetadataSource::Tmdb);
    assert_eq!(record.title.as_deref(), Some("Broken Bow (1)"));
    assert_eq!(record.air_date.as_deref(), Some("2001-09-26"));
    assert_eq!(record.production_code.as_deref(), Some("001"));
    assert_eq!(record.tmdb_id, Some(228_343));
    assert_eq!(record.imdb_id.as_deref(), Some("tt0572248"));
    assert_eq!(record.directors, vec!["James L. Conway".to_string()]);
    assert_eq!(
        record.writers,
        vec!["Rick Berman".to_string(), "Brannon Braga".to_string()]
    );
    assert_eq!(record.guest_stars, vec!["John Fleck".to_string()]);
    // Active content is stripped before the record leaves the client.
    assert!(!record.synopsis.as_deref().unwrap().contains("script"));
    assert!(record.validations[&EpisodeField::AirDate].is_valid);
    assert!(record.validations[&EpisodeField::ImdbId].is_valid);
}

#[tokio::test]
async fn missing_api_key_disables_the_provider_cleanly() {
    let fetcher = Arc::new(MockFetcher::new());
    let client = TmdbClient::new(Arc::clone(&fetcher) as _, None, None);

    assert!(!client.is_available());
    let result = client.fetch_episode(&id(), &CancelToken::new()).await.unwrap();
    assert!(result.is_none());
    assert_eq!(fetcher.request_count(), 0);
}

#[tokio::test]
async fn unknown_series_and_404_mean_no_data() {
    let fetcher = Arc::new(MockFetcher::new());
    let client = TmdbClient::new(Arc::clone(&fetcher) as _, Some("KEY".to_string()), None);

    let unknown: EpisodeId = "xyz_s1_e01".parse().unwrap();
    assert!(
        client
            .fetch_episode(&unknown, &CancelToken::new())
            .await
            .unwrap()
            .is_none()
    );

    // No scripted response: the mock fetcher answers 404.
    assert!(
        client
            .fetch_episode(&id(), &CancelToken::new())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn malformed_payloads_are_parse_errors() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, b"not json at all");
    let client = TmdbClient::new(Arc::clone(&fetcher) as _, Some("KEY".to_string()), None);

    let err = client
        .fetch_episode(&id(), &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, lcars_types::LcarsError::Parse { .. }));
}
