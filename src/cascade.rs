//! Cascading country → city → county → district selection
//!
//! Selecting a level clears everything below it and hands out a
//! [`FetchTicket`] for the child's options. Each level carries a
//! generation counter; completions for an outdated generation are
//! dropped, so a slow response for a previous parent can never overwrite
//! the options of the current one.

use crate::client::CrmClient;
use crate::forms::ReservationForm;
use crate::operations::LocationLevel;
use crate::types::SelectOption;
use crate::Result;
use async_trait::async_trait;

/// Where location options come from
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn location_options(
        &self,
        level: LocationLevel,
        parent_id: Option<&str>,
    ) -> Result<Vec<SelectOption>>;
}

#[async_trait]
impl LocationSource for CrmClient {
    async fn location_options(
        &self,
        level: LocationLevel,
        parent_id: Option<&str>,
    ) -> Result<Vec<SelectOption>> {
        let fetched = CrmClient::location_options(self, level, parent_id).await?;
        if !fetched.is_complete() {
            tracing::warn!(location_level = %level, errors = fetched.errors.len(), "partial location options");
        }
        Ok(fetched.data)
    }
}

/// Pending options fetch for one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub level: LocationLevel,
    pub parent_id: Option<String>,
    pub generation: u64,
}

#[derive(Debug, Clone, Default)]
struct LevelState {
    selected: Option<SelectOption>,
    options: Vec<SelectOption>,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct LocationCascade {
    levels: [LevelState; 4],
}

impl LocationCascade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for the top-level (country) options
    pub fn start(&mut self) -> FetchTicket {
        let state = &mut self.levels[LocationLevel::Country.index()];
        state.generation += 1;
        FetchTicket {
            level: LocationLevel::Country,
            parent_id: None,
            generation: state.generation,
        }
    }

    /// Set `level`'s selection and reset all descendants
    ///
    /// Returns the ticket for the child's options, or `None` when the
    /// selection was cleared or `level` has no child.
    pub fn select(&mut self, level: LocationLevel, option: Option<SelectOption>) -> Option<FetchTicket> {
        let option = option.filter(|option| !option.is_match_all());
        self.levels[level.index()].selected = option.clone();

        let mut next = level.child();
        while let Some(descendant) = next {
            let state = &mut self.levels[descendant.index()];
            state.selected = None;
            state.options.clear();
            state.generation += 1;
            next = descendant.child();
        }

        let child = level.child()?;
        let parent = option?;
        Some(FetchTicket {
            level: child,
            parent_id: Some(parent.value),
            generation: self.levels[child.index()].generation,
        })
    }

    /// Install fetched options if `ticket` is still current
    pub fn complete(&mut self, ticket: &FetchTicket, options: Vec<SelectOption>) -> bool {
        let state = &mut self.levels[ticket.level.index()];
        if state.generation != ticket.generation {
            tracing::warn!(
                location_level = %ticket.level,
                ticket = ticket.generation,
                current = state.generation,
                "dropping stale location options"
            );
            return false;
        }
        state.options = options;
        true
    }

    /// Fetch the options for `ticket` and complete it
    pub async fn load(&mut self, ticket: &FetchTicket, source: &dyn LocationSource) -> Result<bool> {
        let options = source
            .location_options(ticket.level, ticket.parent_id.as_deref())
            .await?;
        Ok(self.complete(ticket, options))
    }

    pub fn selected(&self, level: LocationLevel) -> Option<&SelectOption> {
        self.levels[level.index()].selected.as_ref()
    }

    pub fn options(&self, level: LocationLevel) -> &[SelectOption] {
        &self.levels[level.index()].options
    }

    /// Copy the current selections into a reservation form
    pub fn apply_to(&self, form: &mut ReservationForm) {
        form.country = self.selected(LocationLevel::Country).cloned();
        form.city = self.selected(LocationLevel::City).cloned();
        form.county = self.selected(LocationLevel::County).cloned();
        form.district = self.selected(LocationLevel::District).cloned();
    }
}
