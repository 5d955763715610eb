//! Enrich one episode from deterministic mock providers (no network).
//!
//! Run with: `cargo run --example 01_enrich_offline`

use std::sync::Arc;

use lcars::{CancelToken, Lcars};
use lcars_mock::MockProvider;
use lcars_types::{MetadataSource, ProviderRecord};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let episode = "ent_s1_e01".parse()?;

    let mut tmdb = ProviderRecord::new(episode, MetadataSource::Tmdb, chrono::Utc::now());
    tmdb.air_date = Some("2001-09-26".to_string());
    tmdb.directors = vec!["Allan Kroeker".to_string()];

    let mut alpha = ProviderRecord::new(
        tmdb.episode.clone(),
        MetadataSource::MemoryAlpha,
        chrono::Utc::now(),
    );
    alpha.title = Some("Broken Bow".to_string());
    alpha.synopsis = Some("Enterprise launches ahead of schedule.".to_string());

    let lcars = Lcars::builder()
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::Tmdb).with_record(tmdb.clone()),
        ))
        .with_provider(Arc::new(
            MockProvider::new(MetadataSource::MemoryAlpha).with_record(alpha),
        ))
        .build()?;

    let outcome = lcars.enrich(&tmdb.episode, &CancelToken::new()).await;
    match outcome.metadata {
        Some(metadata) => {
            println!(
                "{}: \"{}\" aired {} (source: {}, confidence {:.2}, status {:?})",
                metadata.episode,
                metadata.record.title,
                metadata.record.air_date,
                metadata.data_source,
                metadata.confidence,
                metadata.status,
            );
        }
        None => println!("no provider had data ({:?})", outcome.category),
    }
    Ok(())
}
