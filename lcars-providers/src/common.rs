//! Shared record-finishing helpers for provider clients.

use chrono::{DateTime, NaiveDate, Utc};

use lcars_core::sanitize::{is_valid_imdb_id, is_valid_url, sanitize_text};
use lcars_types::{EpisodeField, FieldValidation, ProviderRecord};

/// Sanitize free text, validate external ids and URLs, and stamp a
/// validation entry for every field the record carries. Invalid values keep
/// a failing entry so the merger can exclude them.
pub(crate) fn finalize(record: &mut ProviderRecord, now: DateTime<Utc>) {
    let source = record.source;

    for slot in [&mut record.title, &mut record.synopsis] {
        if let Some(text) = slot.as_mut() {
            let (clean, _) = sanitize_text(text);
            *text = clean;
            if text.is_empty() {
                *slot = None;
            }
        }
    }
    for list in [
        &mut record.plot_points,
        &mut record.guest_stars,
        &mut record.directors,
        &mut record.writers,
    ] {
        for item in list.iter_mut() {
            let (clean, _) = sanitize_text(item);
            *item = clean;
        }
        list.retain(|item| !item.is_empty());
    }

    let mut invalid: Vec<(EpisodeField, String)> = Vec::new();
    if let Some(date) = &record.air_date
        && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err()
    {
        invalid.push((EpisodeField::AirDate, format!("not an ISO date: {date}")));
    }
    if let Some(id) = &record.imdb_id
        && !is_valid_imdb_id(id)
    {
        invalid.push((EpisodeField::ImdbId, format!("malformed IMDB id: {id}")));
    }
    if let Some(url) = &record.memory_alpha_url
        && !is_valid_url(url)
    {
        invalid.push((EpisodeField::MemoryAlphaUrl, format!("malformed URL: {url}")));
    }

    for field in EpisodeField::ALL {
        if record.field(field).is_none() {
            continue;
        }
        let entry = match invalid.iter().find(|(f, _)| *f == field) {
            Some((_, error)) => FieldValidation::invalid(source, now, error.clone()),
            None => FieldValidation::valid(source, now),
        };
        record.validations.insert(field, entry);
    }
}

/// Parse a provider-supplied air date in either ISO or long form, returning
/// the normalized `YYYY-MM-DD` string.
pub(crate) fn normalize_air_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    for format in ["%Y-%m-%d", "%d %B %Y", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}
