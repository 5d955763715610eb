//! Free-text sanitization and value validators.
//!
//! Provider payloads are untrusted. Sanitization strips active content from
//! free text before it reaches persisted records; stripping is logged as a
//! warning, never surfaced as an error.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex")
});
static IFRAME_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>|<iframe\b[^>]*/?>").expect("static regex")
});
static JS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("static regex"));
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\son\w+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("static regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static IMDB_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tt\d{7,8}$").expect("static regex"));

/// Strip script/iframe blocks, `javascript:` URLs, and inline event-handler
/// attributes from free text. Returns the cleaned text and whether anything
/// was removed.
#[must_use]
pub fn sanitize_text(input: &str) -> (String, bool) {
    let mut out = SCRIPT_BLOCK.replace_all(input, "").into_owned();
    out = IFRAME_BLOCK.replace_all(&out, "").into_owned();
    out = EVENT_HANDLER.replace_all(&out, "").into_owned();
    out = JS_URL.replace_all(&out, "").into_owned();
    let changed = out != input;
    if changed {
        tracing::warn!(
            target: "lcars::core::sanitize",
            removed = input.len() - out.len(),
            "stripped active content from provider text"
        );
    }
    (out, changed)
}

/// Remove every markup tag, collapsing runs of whitespace. Used for scraped
/// HTML fragments after [`sanitize_text`].
#[must_use]
pub fn strip_tags(input: &str) -> String {
    let stripped = TAG.replace_all(input, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `value` is an absolute http(s) URL.
#[must_use]
pub fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Whether `value` is a well-formed IMDB title id (`tt` + 7-8 digits).
#[must_use]
pub fn is_valid_imdb_id(value: &str) -> bool {
    IMDB_ID.is_match(value)
}

/// Whether `value` is a calendar date in `YYYY-MM-DD` form.
#[must_use]
pub fn is_valid_air_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_blocks_and_reports_change() {
        let (out, changed) = sanitize_text("before<script>alert(1)</script>after");
        assert_eq!(out, "beforeafter");
        assert!(changed);
    }

    #[test]
    fn strips_event_handlers_and_js_urls() {
        let (out, _) = sanitize_text(r#"<a href="javascript:doIt()" onclick="x()">go</a>"#);
        assert!(!out.contains("javascript:"));
        assert!(!out.to_lowercase().contains("onclick"));
    }

    #[test]
    fn clean_text_passes_through_unchanged() {
        let (out, changed) = sanitize_text("Captain Archer meets the Klingons.");
        assert_eq!(out, "Captain Archer meets the Klingons.");
        assert!(!changed);
    }

    #[test]
    fn imdb_ids_require_tt_prefix_and_digit_count() {
        assert!(is_valid_imdb_id("tt0572248"));
        assert!(is_valid_imdb_id("tt10572248"));
        assert!(!is_valid_imdb_id("nm0572248"));
        assert!(!is_valid_imdb_id("tt123"));
        assert!(!is_valid_imdb_id("tt123456789"));
    }

    #[test]
    fn air_dates_must_be_real_calendar_days() {
        assert!(is_valid_air_date("2001-09-26"));
        assert!(!is_valid_air_date("2001-13-26"));
        assert!(!is_valid_air_date("09/26/2001"));
    }

    #[test]
    fn urls_must_be_absolute_http() {
        assert!(is_valid_url("https://memory-alpha.fandom.com/wiki/Broken_Bow"));
        assert!(!is_valid_url("ftp://example.com/x"));
        assert!(!is_valid_url("/wiki/Broken_Bow"));
    }
}
