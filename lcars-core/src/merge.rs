//! Multi-source conflict resolution.
//!
//! The merge is a pure function of the set of provider records: inputs are
//! canonicalized by source priority before resolution, so arrival order is
//! unobservable in the output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use lcars_types::{
    ConflictDecision, ConflictValue, EnrichmentStatus, EpisodeField, EpisodeId, EpisodeRecord,
    FieldValidation, FieldValue, MergeStrategy, MetadataSource, ProviderRecord, UnifiedMetadata,
};

use crate::provider::ProviderProfile;
use crate::quality::QualityScorer;

/// Confidence at or above which a unified record counts as validated.
const VALIDATION_THRESHOLD: f64 = 0.7;

struct Candidate {
    value: FieldValue,
    source: MetadataSource,
    fetched_at: DateTime<Utc>,
    score: f64,
}

/// Merge provider records for `episode` into a unified record.
///
/// Returns `None` when no record matches the episode. Season and episode
/// numbers resolve from the canonical id itself; provider-supplied values for
/// those two fields are not consulted and never conflict.
#[must_use]
pub fn merge_records(
    episode: &EpisodeId,
    records: &[ProviderRecord],
    strategy: MergeStrategy,
    scorer: &QualityScorer,
    now: DateTime<Utc>,
    version: &str,
) -> Option<UnifiedMetadata> {
    // Canonical order: source priority, then fetch time, so the result is a
    // function of the set.
    let mut ordered: Vec<&ProviderRecord> =
        records.iter().filter(|r| &r.episode == episode).collect();
    ordered.sort_by(|a, b| {
        a.source
            .priority_rank()
            .cmp(&b.source.priority_rank())
            .then(b.fetched_at.cmp(&a.fetched_at))
    });
    if ordered.is_empty() {
        return None;
    }

    let scores: Vec<f64> = ordered
        .iter()
        .map(|r| {
            scorer
                .score(r, &ProviderProfile::baseline(r.source), None, now)
                .overall
        })
        .collect();

    let mut record = EpisodeRecord::empty(episode.clone());
    let mut validations: BTreeMap<EpisodeField, FieldValidation> = BTreeMap::new();
    let mut conflicts: Vec<ConflictDecision> = Vec::new();
    let mut contributions: BTreeMap<MetadataSource, usize> = BTreeMap::new();

    for field in EpisodeField::ALL {
        if matches!(field, EpisodeField::Season | EpisodeField::Episode) {
            continue;
        }
        let candidates: Vec<Candidate> = ordered
            .iter()
            .zip(scores.iter())
            .filter(|(r, _)| r.field_is_valid(field))
            .filter_map(|(r, score)| {
                r.field(field).map(|value| Candidate {
                    value,
                    source: r.source,
                    fetched_at: r.fetched_at,
                    score: *score,
                })
            })
            .collect();
        if candidates.is_empty() {
            continue;
        }

        // Distinct values in canonical order; each keeps its first holder.
        let mut distinct: Vec<&Candidate> = Vec::new();
        for c in &candidates {
            if !distinct.iter().any(|d| d.value == c.value) {
                distinct.push(c);
            }
        }

        let (resolved, contributor) = if distinct.len() == 1 {
            (distinct[0].value.clone(), distinct[0].source)
        } else {
            let (resolved, contributor) = resolve_conflict(field, strategy, &candidates, &distinct);
            conflicts.push(ConflictDecision {
                field,
                values: distinct
                    .iter()
                    .map(|d| ConflictValue {
                        value: d.value.clone(),
                        source: d.source,
                    })
                    .collect(),
                resolved: resolved.clone(),
                strategy,
            });
            (resolved, contributor)
        };

        apply_field(&mut record, field, &resolved);
        validations.insert(field, FieldValidation::valid(contributor, now));
        *contributions.entry(contributor).or_insert(0) += 1;
    }

    // Plurality of chosen values decides the primary source; ties break on
    // the fixed source priority. Fall back to the best-ranked input when
    // nothing resolved.
    let data_source = contributions
        .iter()
        .max_by(|(sa, ca), (sb, cb)| {
            ca.cmp(cb)
                .then(sb.priority_rank().cmp(&sa.priority_rank()))
        })
        .map_or(ordered[0].source, |(source, _)| *source);

    validations.insert(
        EpisodeField::Season,
        FieldValidation::valid(data_source, now),
    );
    validations.insert(
        EpisodeField::Episode,
        FieldValidation::valid(data_source, now),
    );

    let expected: Vec<EpisodeField> = EpisodeField::ALL
        .into_iter()
        .filter(|f| f.is_expected())
        .collect();
    let resolved_expected = expected
        .iter()
        .filter(|f| validations.contains_key(f))
        .count();
    let confidence = resolved_expected as f64 / expected.len() as f64;

    Some(UnifiedMetadata {
        episode: episode.clone(),
        record,
        data_source,
        last_updated: now,
        is_validated: confidence >= VALIDATION_THRESHOLD,
        confidence,
        version: version.to_string(),
        status: EnrichmentStatus::from_confidence(confidence),
        validations,
        conflicts,
    })
}

fn resolve_conflict(
    field: EpisodeField,
    strategy: MergeStrategy,
    candidates: &[Candidate],
    distinct: &[&Candidate],
) -> (FieldValue, MetadataSource) {
    match strategy {
        MergeStrategy::HighestQuality => {
            let best = distinct
                .iter()
                .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
                .expect("non-empty distinct set");
            (best.value.clone(), best.source)
        }
        MergeStrategy::LatestWins => {
            let best = distinct
                .iter()
                .max_by_key(|c| c.fetched_at)
                .expect("non-empty distinct set");
            (best.value.clone(), best.source)
        }
        MergeStrategy::SourcePriority => (distinct[0].value.clone(), distinct[0].source),
        MergeStrategy::MergeWithPriority => {
            if field.is_list() {
                // Union the sequences, preserving the higher-priority order
                // and appending novel items from lower-priority providers.
                let mut union: Vec<String> = Vec::new();
                for c in candidates {
                    if let FieldValue::List(items) = &c.value {
                        for item in items {
                            if !union.contains(item) {
                                union.push(item.clone());
                            }
                        }
                    }
                }
                (FieldValue::List(union), distinct[0].source)
            } else {
                (distinct[0].value.clone(), distinct[0].source)
            }
        }
        _ => (distinct[0].value.clone(), distinct[0].source),
    }
}

fn apply_field(record: &mut EpisodeRecord, field: EpisodeField, value: &FieldValue) {
    match (field, value) {
        (EpisodeField::Title, FieldValue::Text(v)) => record.title = v.clone(),
        (EpisodeField::AirDate, FieldValue::Text(v)) => record.air_date = v.clone(),
        (EpisodeField::Synopsis, FieldValue::Text(v)) => record.synopsis = v.clone(),
        (EpisodeField::PlotPoints, FieldValue::List(v)) => record.plot_points = v.clone(),
        (EpisodeField::GuestStars, FieldValue::List(v)) => record.guest_stars = v.clone(),
        (EpisodeField::Directors, FieldValue::List(v)) => record.directors = v.clone(),
        (EpisodeField::Writers, FieldValue::List(v)) => record.writers = v.clone(),
        (EpisodeField::ProductionCode, FieldValue::Text(v)) => {
            record.production_code = Some(v.clone());
        }
        (EpisodeField::TmdbId, FieldValue::Number(v)) => record.tmdb_id = Some(*v),
        (EpisodeField::ImdbId, FieldValue::Text(v)) => record.imdb_id = Some(v.clone()),
        (EpisodeField::MemoryAlphaUrl, FieldValue::Text(v)) => {
            record.memory_alpha_url = Some(v.clone());
        }
        (EpisodeField::Connections, FieldValue::Connections(v)) => {
            record.connections = v.clone();
        }
        // Season/Episode come from the id; other combinations cannot be
        // produced by ProviderRecord::field.
        _ => {}
    }
}
