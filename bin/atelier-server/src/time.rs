//! Timestamp normalization for user-supplied `start_at` / `end_at` filters.
//!
//! Callers send ISO-8601-ish strings; only the `YYYY-MM-DDTHH:MM:SS` prefix
//! is significant.  Filter parameters are best-effort by contract, so
//! anything malformed degrades to "no filter" rather than erroring.

use chrono::offset::LocalResult;
use chrono::{Local, NaiveDateTime, Utc};

/// Length of the significant `YYYY-MM-DDTHH:MM:SS` prefix.
const PREFIX_LEN: usize = 19;

/// Parse a user-supplied date string into epoch milliseconds.
///
/// Only the first 19 characters are inspected; fractional seconds and
/// timezone suffixes are ignored, not validated.  The naive datetime is
/// interpreted in the host's local timezone.  `None` input, a short or
/// non-matching prefix, or an invalid calendar date all yield `None`,
/// never an error.
pub fn normalize(input: Option<&str>) -> Option<i64> {
    let prefix = input?.get(..PREFIX_LEN)?;
    let naive = NaiveDateTime::parse_from_str(prefix, "%Y-%m-%dT%H:%M:%S").ok()?;
    match naive.and_local_timezone(Local) {
        LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        // DST fold: two valid mappings; take the earlier one.
        LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp_millis()),
        // DST gap: the wall-clock time never existed.
        LocalResult::None => None,
    }
}

/// An inclusive `in_queue_ms` filter window.
///
/// The window only takes effect when both bounds are present and ordered
/// (`start < end`); every other combination means "no filter", and callers
/// fall back to plain pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
}

impl TimeRange {
    /// Build a range from raw query parameters.
    ///
    /// A missing `end_at` defaults to the current time (so "everything since
    /// `start_at`" works without the caller spelling out an end bound); a
    /// *malformed* `end_at` stays absent and disables the filter.
    pub fn resolve(start_at: Option<&str>, end_at: Option<&str>) -> Self {
        let start_ms = normalize(start_at);
        let end_ms = match end_at {
            Some(raw) => normalize(Some(raw)),
            None => Some(Utc::now().timestamp_millis()),
        };
        Self { start_ms, end_ms }
    }

    /// The effective inclusive bounds, or `None` when the filter is degenerate.
    pub fn effective(&self) -> Option<(i64, i64)> {
        match (self.start_ms, self.end_ms) {
            (Some(start), Some(end)) if start < end => Some((start, end)),
            _ => None,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize_accepts_prefix_and_ignores_suffix() {
        let plain = normalize(Some("2024-01-15T10:30:00")).expect("valid datetime");
        // Suffixes past the 19-char prefix are ignored, not validated.
        assert_eq!(normalize(Some("2024-01-15T10:30:00Z")), Some(plain));
        assert_eq!(normalize(Some("2024-01-15T10:30:00.123+09:00")), Some(plain));
        assert_eq!(normalize(Some("2024-01-15T10:30:00garbage")), Some(plain));
    }

    #[test]
    fn normalize_rejects_malformed_input() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(Some("not-a-date")), None);
        assert_eq!(normalize(Some("2024-01-15")), None);
        // Invalid month.
        assert_eq!(normalize(Some("2024-13-01T00:00:00")), None);
        // Invalid time.
        assert_eq!(normalize(Some("2024-01-15T25:00:00")), None);
    }

    #[test]
    fn normalize_output_is_milliseconds() {
        let earlier = normalize(Some("2024-01-15T10:30:00")).unwrap();
        let later = normalize(Some("2024-01-15T10:30:01")).unwrap();
        assert_eq!(later - earlier, 1_000);
    }

    #[test]
    fn effective_requires_both_bounds_ordered() {
        let active = TimeRange { start_ms: Some(100), end_ms: Some(250) };
        assert_eq!(active.effective(), Some((100, 250)));

        for degenerate in [
            TimeRange { start_ms: None, end_ms: Some(250) },
            TimeRange { start_ms: Some(100), end_ms: None },
            TimeRange { start_ms: Some(250), end_ms: Some(250) },
            TimeRange { start_ms: Some(300), end_ms: Some(250) },
            TimeRange::default(),
        ] {
            assert_eq!(degenerate.effective(), None);
        }
    }

    #[test]
    fn resolve_defaults_end_to_now() {
        let range = TimeRange::resolve(Some("2024-01-15T10:30:00"), None);
        assert!(range.start_ms.is_some());
        // The default end bound is "now", which is after any fixed past start.
        assert!(range.effective().is_some());
    }

    #[test]
    fn resolve_with_malformed_bounds_disables_filter() {
        let range = TimeRange::resolve(Some("garbage"), Some("2024-01-15T10:30:00"));
        assert_eq!(range.effective(), None);

        let range = TimeRange::resolve(Some("2024-01-15T10:30:00"), Some("garbage"));
        assert_eq!(range.effective(), None);
    }
}
