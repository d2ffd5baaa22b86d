//! List-view filter controller
//!
//! Keeps the in-memory filter, its persisted copy and the URL query string
//! consistent across panel open/edit/submit/clear and sort or page-size
//! changes.

use crate::filter::{DateRange, FilterState, Filterable, StatusFilter, FILTER_PARAMS};
use crate::notify::Notifier;
use crate::pagination::{ListParams, Page, PRESERVED_PARAMS};
use crate::storage::{load_json, save_json, KeyValueStore};
use crate::types::SelectOption;
use crate::Result;
use chrono::NaiveDate;
use reqwest::Url;
use std::sync::{Arc, Mutex};

/// Storage key of the lead list filter
pub const LEAD_FILTER_KEY: &str = "leadListFilter";

/// Storage key of the reservation list filter
pub const RESERVATION_FILTER_KEY: &str = "reservationListFilter";

pub const NO_MATCH_MESSAGE: &str = "No records match the selected filters";

/// Current location of the list view
pub trait History: Send + Sync {
    fn location(&self) -> Url;

    /// Replace the current entry without adding a new one
    fn replace(&self, url: Url);
}

/// History holding a single entry in memory
#[derive(Debug)]
pub struct MemoryHistory {
    current: Mutex<Url>,
}

impl MemoryHistory {
    pub fn new(url: Url) -> Self {
        Self {
            current: Mutex::new(url),
        }
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Url {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, url: Url) {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = url;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open,
}

/// Rebuild the query string from preserved params followed by `filter`'s
fn filter_location(current: &Url, filter: &FilterState) -> Url {
    let mut pairs: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(key, _)| PRESERVED_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.extend(
        filter
            .to_query_pairs()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value)),
    );
    with_query(current, pairs)
}

/// Rebuild the query string from `params` followed by the filter params
fn list_location(current: &Url, params: &ListParams) -> Url {
    let mut pairs: Vec<(String, String)> = params
        .to_query_pairs()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    pairs.extend(
        current
            .query_pairs()
            .filter(|(key, _)| FILTER_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned())),
    );
    with_query(current, pairs)
}

fn with_query(current: &Url, pairs: Vec<(String, String)>) -> Url {
    let mut url = current.clone();
    url.set_query(None);
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

/// Filter/sort/URL controller of one list view
pub struct FilterController<R> {
    storage_key: String,
    store: Arc<dyn KeyValueStore>,
    history: Arc<dyn History>,
    notifier: Arc<dyn Notifier>,
    role_options: Vec<SelectOption>,
    records: Vec<R>,
    visible: Vec<R>,
    applied: FilterState,
    draft: FilterState,
    panel: PanelState,
}

impl<R: Filterable + Clone> FilterController<R> {
    pub fn new(
        storage_key: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        history: Arc<dyn History>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            storage_key: storage_key.into(),
            store,
            history,
            notifier,
            role_options: Vec::new(),
            records: Vec::new(),
            visible: Vec::new(),
            applied: FilterState::default(),
            draft: FilterState::default(),
            panel: PanelState::Closed,
        }
    }

    /// Options URL role ids are resolved against
    pub fn set_role_options(&mut self, options: Vec<SelectOption>) {
        self.role_options = options;
    }

    pub fn role_options(&self) -> &[SelectOption] {
        &self.role_options
    }

    /// Replace the full record set and reapply the active filter
    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.reapply();
    }

    /// View (re-)entry: restore the active filter from storage and URL
    pub fn enter(&mut self) {
        self.applied = self.restored_state();
        self.draft = self.applied.clone();
        self.panel = PanelState::Closed;
        self.reapply();
    }

    /// Open the panel, repopulating the draft from storage then the URL
    pub fn open(&mut self) {
        self.draft = self.restored_state();
        self.panel = PanelState::Open;
    }

    /// Close the panel without applying the draft
    pub fn close(&mut self) {
        self.panel = PanelState::Closed;
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.draft.title = title.into();
        self.persist_draft()
    }

    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
        let range = DateRange::new(start, end);
        self.draft.date_range = (!range.is_empty()).then_some(range);
        self.persist_draft()
    }

    /// Selecting the match-all option clears the role filter
    pub fn set_roles(&mut self, roles: Vec<SelectOption>) -> Result<()> {
        self.draft.roles = if roles.iter().any(SelectOption::is_match_all) {
            Vec::new()
        } else {
            roles
        };
        self.persist_draft()
    }

    pub fn set_status(&mut self, status: Option<StatusFilter>) -> Result<()> {
        self.draft.status = status;
        self.persist_draft()
    }

    /// Apply the draft
    ///
    /// Rejects an inverted date range before touching storage or the URL.
    /// Returns the number of visible records; zero is not an error.
    pub fn submit(&mut self) -> Result<usize> {
        self.draft.validate()?;

        if let Some(window) = self.draft.effective_window() {
            tracing::debug!(start = ?window.start, end = ?window.end, "effective date window");
        }

        let location = filter_location(&self.history.location(), &self.draft);
        save_json(self.store.as_ref(), &self.storage_key, &self.draft)?;

        self.applied = self.draft.clone();
        self.panel = PanelState::Closed;
        self.reapply();

        if self.visible.is_empty() {
            self.notifier.warn(NO_MATCH_MESSAGE);
        }

        self.history.replace(location);
        Ok(self.visible.len())
    }

    /// Reset to the empty filter everywhere, keeping sort/page params
    pub fn clear(&mut self) -> Result<()> {
        let empty = FilterState::default();
        save_json(self.store.as_ref(), &self.storage_key, &empty)?;

        let location = filter_location(&self.history.location(), &empty);
        self.draft = empty.clone();
        self.applied = empty;
        self.panel = PanelState::Closed;
        self.reapply();
        self.history.replace(location);
        Ok(())
    }

    /// Change sort/paging without disturbing filter params
    pub fn set_list_params(&mut self, params: &ListParams) -> Result<()> {
        params.validate()?;
        let location = list_location(&self.history.location(), params);
        self.history.replace(location);
        Ok(())
    }

    /// Current list URL
    pub fn location(&self) -> Url {
        self.history.location()
    }

    pub fn list_params(&self) -> ListParams {
        ListParams::from_url(&self.history.location())
    }

    /// Current page of the visible records
    pub fn page(&self) -> Page<R> {
        self.list_params().page(&self.visible)
    }

    pub fn applied(&self) -> &FilterState {
        &self.applied
    }

    pub fn draft(&self) -> &FilterState {
        &self.draft
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn visible(&self) -> &[R] {
        &self.visible
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn is_open(&self) -> bool {
        self.panel == PanelState::Open
    }

    fn reapply(&mut self) {
        self.visible = self.applied.apply(&self.records);
    }

    fn persisted_state(&self) -> FilterState {
        match load_json::<FilterState>(self.store.as_ref(), &self.storage_key) {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key = %self.storage_key, error = %e, "discarding persisted filter");
                FilterState::default()
            }
        }
    }

    fn restored_state(&self) -> FilterState {
        let mut state = FilterState::from_url(
            &self.history.location(),
            self.persisted_state(),
            &self.role_options,
        );
        if let Err(e) = state.validate() {
            tracing::warn!(key = %self.storage_key, error = %e, "dropping invalid restored date range");
            state.date_range = None;
        }
        state
    }

    fn persist_draft(&self) -> Result<()> {
        save_json(self.store.as_ref(), &self.storage_key, &self.draft)?;
        Ok(())
    }
}
