//! Time-window filters for ticket queries.
//!
//! A window is either relative (`since = "30d"`, meaning now minus thirty
//! days) or an explicit `(since, until)` range. Both resolve to UTC
//! timestamps with second precision and no offset suffix, which is the
//! format the API expects.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use regex::Regex;

use crate::error::{QiError, Result};

/// Wire format for window timestamps.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Naive date-time layouts accepted in explicit ranges.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts not covered by RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

fn since_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([1-9][0-9]*)([mhd])$").expect("valid since pattern"))
}

/// A time window, before resolution against the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    /// Everything newer than now minus this duration.
    Since(Duration),
    /// An explicit UTC range.
    Range {
        since: NaiveDateTime,
        until: NaiveDateTime,
    },
}

/// Resolved window, ready to be sent as query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowParams {
    pub since: String,
    pub until: Option<String>,
}

impl WindowParams {
    /// Query parameter pairs for this window.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("since", self.since.clone())];
        if let Some(until) = &self.until {
            pairs.push(("until", until.clone()));
        }
        pairs
    }
}

impl TimeWindow {
    /// Build a window from the two mutually exclusive filter forms.
    ///
    /// Returns `Ok(None)` when neither is given.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Validation`] if both are given or either is
    /// malformed.
    pub fn from_filters(
        since: Option<&str>,
        date_range: Option<(&str, &str)>,
    ) -> Result<Option<Self>> {
        match (since, date_range) {
            (Some(_), Some(_)) => Err(QiError::Validation(
                "Either specify since or date_range, not both".to_string(),
            )),
            (Some(since), None) => Ok(Some(Self::Since(parse_since(since)?))),
            (None, Some((since, until))) => Ok(Some(Self::Range {
                since: parse_datetime_utc(since)?,
                until: parse_datetime_utc(until)?,
            })),
            (None, None) => Ok(None),
        }
    }

    /// Resolve against the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Validation`] if the duration reaches before the
    /// earliest representable date.
    pub fn resolve(&self) -> Result<WindowParams> {
        self.resolve_at(Utc::now())
    }

    /// Resolve against a given instant. The instant is truncated to whole
    /// seconds before the duration is subtracted.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn resolve_at(&self, now: DateTime<Utc>) -> Result<WindowParams> {
        match self {
            Self::Since(delta) => {
                let now = now.with_nanosecond(0).unwrap_or(now);
                let since = now.checked_sub_signed(*delta).ok_or_else(|| {
                    QiError::Validation(format!("`since` reaches too far back: {delta}"))
                })?;
                Ok(WindowParams {
                    since: format_utc(since),
                    until: None,
                })
            }
            Self::Range { since, until } => Ok(WindowParams {
                since: since.format(WIRE_FORMAT).to_string(),
                until: Some(until.format(WIRE_FORMAT).to_string()),
            }),
        }
    }
}

/// Parse a relative duration such as `15m`, `1h` or `40d`.
///
/// # Errors
///
/// Returns [`QiError::Validation`] unless the whole string is a positive
/// integer followed by `m`, `h` or `d`.
pub fn parse_since(since: &str) -> Result<Duration> {
    let malformed = || {
        QiError::Validation(format!(
            "`since` is not formatted properly: {since}. Example: 2d: 2 days, 1h: 1 hour, 3m: 3 minutes"
        ))
    };

    let caps = since_pattern().captures(since).ok_or_else(malformed)?;
    let amount: i64 = caps[1].parse().map_err(|_| malformed())?;

    let delta = match &caps[2] {
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        _ => Duration::try_days(amount),
    };
    delta.ok_or_else(malformed)
}

/// Parse an ISO-8601-ish date or date-time and convert it to naive UTC.
///
/// Values without an offset are taken as UTC; bare dates mean midnight.
///
/// # Errors
///
/// Returns [`QiError::Validation`] if no accepted layout matches.
pub fn parse_datetime_utc(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(dt.with_timezone(&Utc).naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    Err(QiError::Validation(format!(
        "date string `{value}` is not formatted properly"
    )))
}

/// Format an instant the way the API expects window bounds.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format(WIRE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 4, 7, 12, 30, 45).unwrap() + Duration::milliseconds(789)
    }

    #[test]
    fn test_parse_since_units() {
        assert_eq!(parse_since("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_since("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_since("40d").unwrap(), Duration::days(40));
        assert_eq!(parse_since("120m").unwrap(), Duration::minutes(120));
    }

    #[test]
    fn test_parse_since_rejects_malformed() {
        for bad in ["", "0d", "05h", "1w", "1", "d", "-1d", "1.5h", "1d ", " 1d", "1dd", "1h30m", "2D"] {
            assert!(
                matches!(parse_since(bad), Err(QiError::Validation(_))),
                "`{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_since_rejects_overflow() {
        assert!(matches!(
            parse_since("99999999999999999999d"),
            Err(QiError::Validation(_))
        ));
        assert!(matches!(
            parse_since("9223372036854775807d"),
            Err(QiError::Validation(_))
        ));
    }

    #[test]
    fn test_since_resolves_against_truncated_now() {
        let window = TimeWindow::from_filters(Some("2d"), None).unwrap().unwrap();
        let params = window.resolve_at(fixed_now()).unwrap();
        assert_eq!(params.since, "2021-04-05T12:30:45");
        assert!(params.until.is_none());

        let window = TimeWindow::from_filters(Some("31m"), None).unwrap().unwrap();
        assert_eq!(window.resolve_at(fixed_now()).unwrap().since, "2021-04-07T11:59:45");
    }

    #[test]
    fn test_since_matches_now_minus_duration_for_many_values() {
        let now = fixed_now();
        let truncated = Utc.with_ymd_and_hms(2021, 4, 7, 12, 30, 45).unwrap();
        for (text, delta) in [
            ("1m", Duration::minutes(1)),
            ("59m", Duration::minutes(59)),
            ("24h", Duration::hours(24)),
            ("7d", Duration::days(7)),
            ("365d", Duration::days(365)),
        ] {
            let window = TimeWindow::Since(parse_since(text).unwrap());
            assert_eq!(window.resolve_at(now).unwrap().since, format_utc(truncated - delta));
        }
    }

    #[test]
    fn test_since_too_far_back() {
        let window = TimeWindow::Since(parse_since("100000000d").unwrap());
        assert!(matches!(window.resolve_at(fixed_now()), Err(QiError::Validation(_))));
    }

    #[test]
    fn test_both_filters_rejected() {
        let err = TimeWindow::from_filters(Some("1h"), Some(("2020-10-01", "2021-04-07")));
        assert!(matches!(err, Err(QiError::Validation(_))));

        // Even malformed values get the conflict error first
        let err = TimeWindow::from_filters(Some("nope"), Some(("x", "y"))).unwrap_err();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn test_no_filters_is_none() {
        assert_eq!(TimeWindow::from_filters(None, None).unwrap(), None);
    }

    #[test]
    fn test_date_range_bare_dates() {
        let window = TimeWindow::from_filters(None, Some(("2020-10-01", "2021-04-07")))
            .unwrap()
            .unwrap();
        let params = window.resolve_at(fixed_now()).unwrap();
        assert_eq!(params.since, "2020-10-01T00:00:00");
        assert_eq!(params.until.as_deref(), Some("2021-04-07T00:00:00"));
    }

    #[test]
    fn test_date_range_converts_offsets_to_utc() {
        assert_eq!(
            format_naive(parse_datetime_utc("2021-04-07T10:00:00+02:00").unwrap()),
            "2021-04-07T08:00:00"
        );
        assert_eq!(
            format_naive(parse_datetime_utc("2021-04-07T23:30:00-0100").unwrap()),
            "2021-04-08T00:30:00"
        );
        assert_eq!(
            format_naive(parse_datetime_utc("2021-04-07T10:00:00.999Z").unwrap()),
            "2021-04-07T10:00:00"
        );
    }

    #[test]
    fn test_date_range_naive_forms() {
        assert_eq!(
            format_naive(parse_datetime_utc("2021-04-07 10:15").unwrap()),
            "2021-04-07T10:15:00"
        );
        assert_eq!(
            format_naive(parse_datetime_utc("2021-04-07T10:15:30.5").unwrap()),
            "2021-04-07T10:15:30"
        );
    }

    #[test]
    fn test_bad_dates_rejected() {
        for bad in ["yesterday", "2021-13-01", "2021-02-30", "07/04/2021", ""] {
            assert!(
                matches!(parse_datetime_utc(bad), Err(QiError::Validation(_))),
                "`{bad}` should be rejected"
            );
        }
        let err = TimeWindow::from_filters(None, Some(("2020-10-01", "soon")));
        assert!(matches!(err, Err(QiError::Validation(_))));
    }

    #[test]
    fn test_window_pairs() {
        let params = WindowParams {
            since: "a".into(),
            until: Some("b".into()),
        };
        assert_eq!(
            params.pairs(),
            vec![("since", "a".to_string()), ("until", "b".to_string())]
        );
    }

    fn format_naive(dt: NaiveDateTime) -> String {
        dt.format(WIRE_FORMAT).to_string()
    }
}
