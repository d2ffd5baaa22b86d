//! List filter state and predicate
//!
//! A [`FilterState`] has three representations kept consistent by the
//! [`crate::controller::FilterController`]: the in-memory value, a JSON
//! copy in the key-value store, and the URL query string.

use crate::types::{Lead, Reservation, SelectOption};
use crate::ValidationError;
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::str::FromStr;

pub const TITLE_PARAM: &str = "title";
pub const CREATED_AT_START_PARAM: &str = "createdAtStart";
pub const CREATED_AT_END_PARAM: &str = "createdAtEnd";
pub const ROLES_PARAM: &str = "roles";
pub const STATUS_PARAM: &str = "status";

/// Query parameters owned by the filter
pub const FILTER_PARAMS: [&str; 5] = [
    TITLE_PARAM,
    CREATED_AT_START_PARAM,
    CREATED_AT_END_PARAM,
    ROLES_PARAM,
    STATUS_PARAM,
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fields a record exposes to the filter predicate and sorting
pub trait Filterable {
    /// Texts the title filter searches in
    fn title_fields(&self) -> Vec<&str>;

    fn role_id(&self) -> Option<&str>;

    fn is_active(&self) -> Option<bool>;

    /// Calendar day the date-range filter compares against
    fn filter_date(&self) -> Option<NaiveDate>;

    /// Sort key for an `orderBy` field name
    fn sort_text(&self, field: &str) -> Option<String>;
}

impl Filterable for Lead {
    fn title_fields(&self) -> Vec<&str> {
        [self.full_name.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }

    fn role_id(&self) -> Option<&str> {
        self.role.as_ref().map(|role| role.id.as_str())
    }

    fn is_active(&self) -> Option<bool> {
        self.is_active
    }

    fn filter_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|at| at.date_naive())
    }

    fn sort_text(&self, field: &str) -> Option<String> {
        match field {
            "fullName" => self.full_name.clone(),
            "username" => self.username.clone(),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "role" => self.role.as_ref().map(|role| role.name.clone()),
            "status" | "isActive" => self.is_active.map(|a| StatusFilter::from_active(a).to_string()),
            "createdAt" => self.created_at.map(|at| at.to_rfc3339()),
            _ => None,
        }
    }
}

impl Filterable for Reservation {
    fn title_fields(&self) -> Vec<&str> {
        [
            self.customer.as_ref().map(|c| c.full_name.as_str()),
            self.user.as_ref().and_then(|u| u.username.as_deref()),
            self.code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn role_id(&self) -> Option<&str> {
        None
    }

    fn is_active(&self) -> Option<bool> {
        self.is_active
    }

    fn filter_date(&self) -> Option<NaiveDate> {
        self.date.or_else(|| self.created_at.map(|at| at.date_naive()))
    }

    fn sort_text(&self, field: &str) -> Option<String> {
        match field {
            "code" => self.code.clone(),
            "date" => self.date.map(|d| d.to_string()),
            "createdAt" => self.created_at.map(|at| at.to_rfc3339()),
            "customer" | "fullName" => self.customer.as_ref().map(|c| c.full_name.clone()),
            "user" | "username" => self.user.as_ref().map(|u| u.full_name.clone()),
            "product" => self.product.as_ref().map(|r| r.name.clone()),
            "channel" => self.channel.as_ref().map(|r| r.name.clone()),
            "status" => self.status.as_ref().map(|r| r.name.clone()),
            _ => None,
        }
    }
}

/// Aktif/Pasif status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFilter {
    Aktif,
    Pasif,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 2] = [StatusFilter::Aktif, StatusFilter::Pasif];

    pub fn from_active(active: bool) -> Self {
        if active {
            StatusFilter::Aktif
        } else {
            StatusFilter::Pasif
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::Aktif => "Aktif",
            StatusFilter::Pasif => "Pasif",
        }
    }

    pub fn option(self) -> SelectOption {
        SelectOption::new(self.label(), self.label())
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    /// Literal match, as the values appear in the URL
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Aktif" => Ok(StatusFilter::Aktif),
            "Pasif" => Ok(StatusFilter::Pasif),
            other => Err(format!("unknown status `{other}`")),
        }
    }
}

/// Date bounds as entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,

    #[serde(default)]
    pub end: Option<NaiveDate>,
}

/// Window a record's day must fall in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Bound<NaiveDate>,
    pub end: Bound<NaiveDate>,
}

impl DateWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        (self.start, self.end).contains(&day)
    }
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => {
                Err(ValidationError::InvalidDateRange { start, end })
            }
            _ => Ok(()),
        }
    }

    /// Effective window
    ///
    /// Entered bounds are inclusive. A missing bound is synthesized one
    /// calendar day from the given one and is exclusive.
    pub fn window(&self) -> Option<DateWindow> {
        let (start, end) = match (self.start, self.end) {
            (Some(start), Some(end)) => (Bound::Included(start), Bound::Included(end)),
            (Some(start), None) => (
                Bound::Included(start),
                start.succ_opt().map_or(Bound::Unbounded, Bound::Excluded),
            ),
            (None, Some(end)) => (
                end.pred_opt().map_or(Bound::Unbounded, Bound::Excluded),
                Bound::Included(end),
            ),
            (None, None) => return None,
        };
        Some(DateWindow { start, end })
    }
}

/// Working filter of a list view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub date_range: Option<DateRange>,

    #[serde(default)]
    pub roles: Vec<SelectOption>,

    #[serde(default)]
    pub status: Option<StatusFilter>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.date_range.map_or(true, |range| range.is_empty())
            && self.roles.is_empty()
            && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.date_range {
            Some(range) => range.validate(),
            None => Ok(()),
        }
    }

    pub fn effective_window(&self) -> Option<DateWindow> {
        self.date_range.and_then(|range| range.window())
    }

    /// Whether `record` passes every active clause
    pub fn matches<R: Filterable>(&self, record: &R) -> bool {
        let title = self.title.trim().to_lowercase();
        if !title.is_empty()
            && !record
                .title_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&title))
        {
            return false;
        }

        if let Some(window) = self.effective_window() {
            match record.filter_date() {
                Some(day) if window.contains(day) => {}
                _ => return false,
            }
        }

        if !self.roles.is_empty() {
            match record.role_id() {
                Some(id) if self.roles.iter().any(|role| role.value == id) => {}
                _ => return false,
            }
        }

        if let Some(status) = self.status {
            match record.is_active() {
                Some(active) if StatusFilter::from_active(active) == status => {}
                _ => return false,
            }
        }

        true
    }

    /// Records passing the filter, in their original order
    pub fn apply<R: Filterable + Clone>(&self, records: &[R]) -> Vec<R> {
        records
            .iter()
            .filter(|record| self.matches(*record))
            .cloned()
            .collect()
    }

    /// Query parameters for the active clauses; inactive ones are omitted
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if !self.title.trim().is_empty() {
            pairs.push((TITLE_PARAM, self.title.clone()));
        }
        if let Some(range) = &self.date_range {
            if let Some(start) = range.start {
                pairs.push((CREATED_AT_START_PARAM, start.format(DATE_FORMAT).to_string()));
            }
            if let Some(end) = range.end {
                pairs.push((CREATED_AT_END_PARAM, end.format(DATE_FORMAT).to_string()));
            }
        }
        if !self.roles.is_empty() {
            let ids: Vec<&str> = self.roles.iter().map(|role| role.value.as_str()).collect();
            pairs.push((ROLES_PARAM, ids.join(",")));
        }
        if let Some(status) = self.status {
            pairs.push((STATUS_PARAM, status.label().to_string()));
        }

        pairs
    }

    /// Overlay the filter parameters present in `url` onto `base`
    ///
    /// Role ids are resolved against `role_options`; unknown ids are
    /// dropped. Unparsable dates and statuses leave the field as in `base`.
    pub fn from_url(url: &Url, base: FilterState, role_options: &[SelectOption]) -> FilterState {
        let mut state = base;
        let mut start = None;
        let mut end = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                TITLE_PARAM if !value.trim().is_empty() => state.title = value.into_owned(),
                CREATED_AT_START_PARAM => start = parse_date(&value),
                CREATED_AT_END_PARAM => end = parse_date(&value),
                ROLES_PARAM => state.roles = resolve_roles(&value, role_options),
                STATUS_PARAM => match value.parse::<StatusFilter>() {
                    Ok(status) => state.status = Some(status),
                    Err(e) => tracing::debug!(error = %e, "ignoring status parameter"),
                },
                _ => {}
            }
        }

        if start.is_some() || end.is_some() {
            state.date_range = Some(DateRange::new(start, end));
        }

        state
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn resolve_roles(value: &str, role_options: &[SelectOption]) -> Vec<SelectOption> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter_map(|id| {
            let found = role_options.iter().find(|option| option.value == id).cloned();
            if found.is_none() {
                tracing::debug!(role_id = id, "role id in url not among loaded options");
            }
            found
        })
        .collect()
}
