use std::sync::Arc;

use lcars_core::{CancelToken, MetadataProvider};
use lcars_mock::{MockFetcher, StaticCatalog};
use lcars_providers::MemoryAlphaClient;
use lcars_types::{EpisodeId, MetadataSource};

const URL: &str = "https://memory-alpha.fandom.com/api.php?action=query&prop=revisions&rvprop=content&rvslots=main&format=json&redirects=1&titles=Broken_Bow_(episode)";

fn catalog() -> Arc<StaticCatalog> {
    Arc::new(
        StaticCatalog::new()
            .with_series("ent", "Enterprise", "ENT", &[26, 26])
            .with_title("ent_s1_e01", "Broken Bow"),
    )
}

fn id() -> EpisodeId {
    "ent_s1_e01".parse().unwrap()
}

fn fixture(wikitext: &str) -> Vec<u8> {
    serde_json::json!({
        "query": {
            "pages": {
                "1492": {
                    "title": "Broken Bow (episode)",
                    "revisions": [
                        {"slots": {"main": {"*": wikitext}}}
                    ]
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

#[test]
fn page_titles_use_the_episode_disambiguation() {
    assert_eq!(
        MemoryAlphaClient::page_title("Broken Bow"),
        "Broken_Bow_(episode)"
    );
}

#[tokio::test]
async fn parses_sidebar_fields_and_prose() {
    let wikitext = "{{Sidebar episode\n\
        | airdate = 26 September 2001\n\
        | director = [[Allan Kroeker]]\n\
        | writer = [[Rick Berman]], [[Brannon Braga]]\n\
        | production_code = 001\n\
        }}\n\
        Captain [[Jonathan Archer]] leads the ''[[Enterprise (NX-01)|Enterprise]]'' on its first mission.\n\
        * A Klingon courier crashes in [[Broken Bow, Oklahoma]]\n\
        * [[Suliban]] agents pursue him\n";

    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, &fixture(wikitext));
    let client = MemoryAlphaClient::new(Arc::clone(&fetcher) as _, catalog(), None);

    let record = client
        .fetch_episode(&id(), &CancelToken::new())
        .await
        .unwrap()
        .expect("record");

    assert_eq!(fetcher.requests(), vec![URL.to_string()]);
    assert_eq!(record.source, MetadataSource::MemoryAlpha);
    assert_eq!(record.title.as_deref(), Some("Broken Bow"));
    assert_eq!(record.air_date.as_deref(), Some("2001-09-26"));
    assert_eq!(record.directors, vec!["Allan Kroeker".to_string()]);
    assert_eq!(
        record.writers,
        vec!["Rick Berman".to_string(), "Brannon Braga".to_string()]
    );
    assert_eq!(record.production_code.as_deref(), Some("001"));
    assert_eq!(
        record.synopsis.as_deref(),
        Some("Captain Jonathan Archer leads the Enterprise on its first mission.")
    );
    assert_eq!(record.plot_points.len(), 2);
    assert_eq!(
        record.memory_alpha_url.as_deref(),
        Some("https://memory-alpha.fandom.com/wiki/Broken_Bow_(episode)")
    );
}

#[tokio::test]
async fn a_missing_page_is_no_data() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(
        URL,
        serde_json::json!({
            "query": {"pages": {"-1": {"missing": ""}}}
        })
        .to_string()
        .as_bytes(),
    );
    let client = MemoryAlphaClient::new(Arc::clone(&fetcher) as _, catalog(), None);

    let result = client.fetch_episode(&id(), &CancelToken::new()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn episodes_unknown_to_the_catalog_are_skipped_without_io() {
    let fetcher = Arc::new(MockFetcher::new());
    let client = MemoryAlphaClient::new(Arc::clone(&fetcher) as _, catalog(), None);

    let unknown: EpisodeId = "tng_s1_e01".parse().unwrap();
    let result = client
        .fetch_episode(&unknown, &CancelToken::new())
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(fetcher.request_count(), 0);
}
