//! Query parameters for ticket collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::window::{TimeWindow, WindowParams};

/// Filters for a paginated ticket query.
///
/// `since` and `date_range` are mutually exclusive; setting both is reported
/// as a validation error when the query is issued, before any request.
///
/// # Example
///
/// ```
/// use qintel::TicketQuery;
///
/// let last_day = TicketQuery::since("1d");
/// assert!(last_day.window().is_ok());
///
/// let range = TicketQuery::between("2021-01-01", "2021-04-01").param("status", "open");
/// assert_eq!(range.params.get("status").map(String::as_str), Some("open"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketQuery {
    /// Relative window such as `15m`, `1h` or `40d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// Explicit `(since, until)` range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(String, String)>,
    /// Extra query parameters passed through to the server.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl TicketQuery {
    /// Everything newer than now minus `since`.
    pub fn since(since: impl Into<String>) -> Self {
        Self {
            since: Some(since.into()),
            ..Self::default()
        }
    }

    /// Everything between two dates or date-times.
    pub fn between(since: impl Into<String>, until: impl Into<String>) -> Self {
        Self {
            date_range: Some((since.into(), until.into())),
            ..Self::default()
        }
    }

    /// Set the relative window, keeping any other field.
    #[must_use]
    pub fn with_since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    /// Set the explicit range, keeping any other field.
    #[must_use]
    pub fn with_date_range(mut self, since: impl Into<String>, until: impl Into<String>) -> Self {
        self.date_range = Some((since.into(), until.into()));
        self
    }

    /// Add an extra query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parse and validate the time window.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Validation`](crate::QiError::Validation) for
    /// conflicting or malformed filters.
    pub fn window(&self) -> Result<Option<TimeWindow>> {
        TimeWindow::from_filters(
            self.since.as_deref(),
            self.date_range
                .as_ref()
                .map(|(since, until)| (since.as_str(), until.as_str())),
        )
    }

    /// Resolve the window against the clock and merge it over the extra
    /// parameters. The window wins over same-named extras.
    ///
    /// # Errors
    ///
    /// See [`window`](Self::window).
    pub fn resolve(&self) -> Result<BTreeMap<String, String>> {
        let mut params = self.params.clone();
        if let Some(window) = self.window()? {
            merge_window(&mut params, &window.resolve()?);
        }
        Ok(params)
    }
}

fn merge_window(params: &mut BTreeMap<String, String>, window: &WindowParams) {
    for (key, value) in window.pairs() {
        params.insert(key.to_string(), value);
    }
}
