//! Per-entity fetch and mutation functions
//!
//! List and lookup reads are lenient: data delivered together with
//! partial errors is returned in a [`Fetched`]. Single-record reads and
//! mutations are strict.

use crate::client::CrmClient;
use crate::forms::{LeadForm, ReservationForm};
use crate::graphql::{Fetched, GraphQLResponse, NoVariables, RawResponse};
use crate::notify::Notifier;
use crate::operations::{
    CreateTransaction, CreateUser, IdVariables, InputVariables, LocationLevel, Lookup,
    TransactionById, Transactions, UpdateTransaction, UpdateUser, UpdateVariables, UserById, Users,
};
use crate::types::{rows_to_options, Lead, LookupRow, Reservation, SelectOption};
use crate::{CrmError, Result, ValidationError};
use std::collections::HashMap;

type LookupData = HashMap<String, Option<Vec<LookupRow>>>;

/// Project the rows under `root_field` to options
fn options_from(root_field: &str, response: RawResponse) -> Result<Fetched<Vec<SelectOption>>> {
    let response: GraphQLResponse<LookupData> = response.decode()?;
    let Fetched { mut data, errors } = response.into_fetched()?;

    let rows = data
        .remove(root_field)
        .ok_or_else(|| CrmError::Decode(format!("missing root field `{root_field}`")))?
        .unwrap_or_default();

    Ok(Fetched {
        data: rows_to_options(root_field, rows),
        errors,
    })
}

impl CrmClient {
    /// All leads
    pub async fn leads(&self) -> Result<Fetched<Vec<Lead>>> {
        let response = self.execute::<Users>(NoVariables {}).await?;
        Ok(response.into_fetched()?.map(|data| data.users))
    }

    /// One lead; `None` when the server knows no such id
    pub async fn lead(&self, id: &str) -> Result<Option<Lead>> {
        let response = self
            .execute::<UserById>(IdVariables { id: id.to_string() })
            .await?;
        Ok(response.into_data()?.user)
    }

    /// Validate and create a lead, returning its id
    pub async fn create_lead(&self, form: &LeadForm) -> Result<String> {
        let input = form.validate()?;
        let response = self.execute::<CreateUser>(InputVariables { input }).await?;
        Ok(response.into_data()?.create_user.id)
    }

    pub async fn update_lead(&self, id: &str, form: &LeadForm) -> Result<String> {
        let input = form.validate()?;
        let response = self
            .execute::<UpdateUser>(UpdateVariables {
                id: id.to_string(),
                input,
            })
            .await?;
        Ok(response.into_data()?.update_user.id)
    }

    /// All reservations
    pub async fn reservations(&self) -> Result<Fetched<Vec<Reservation>>> {
        let response = self.execute::<Transactions>(NoVariables {}).await?;
        Ok(response.into_fetched()?.map(|data| data.transactions))
    }

    pub async fn reservation(&self, id: &str) -> Result<Option<Reservation>> {
        let response = self
            .execute::<TransactionById>(IdVariables { id: id.to_string() })
            .await?;
        Ok(response.into_data()?.transaction)
    }

    pub async fn create_reservation(&self, form: &ReservationForm) -> Result<String> {
        let input = form.validate()?;
        let response = self
            .execute::<CreateTransaction>(InputVariables { input })
            .await?;
        Ok(response.into_data()?.create_transaction.id)
    }

    pub async fn update_reservation(&self, id: &str, form: &ReservationForm) -> Result<String> {
        let input = form.validate()?;
        let response = self
            .execute::<UpdateTransaction>(UpdateVariables {
                id: id.to_string(),
                input,
            })
            .await?;
        Ok(response.into_data()?.update_transaction.id)
    }

    /// Options of a flat lookup entity
    pub async fn lookup_options(&self, lookup: Lookup) -> Result<Fetched<Vec<SelectOption>>> {
        let response = self.execute_request(lookup.request(), true).await?;
        options_from(lookup.root_field(), response)
    }

    /// Options of one location level
    ///
    /// Every level below the country needs the parent's id.
    pub async fn location_options(
        &self,
        level: LocationLevel,
        parent_id: Option<&str>,
    ) -> Result<Fetched<Vec<SelectOption>>> {
        if level != LocationLevel::Country && parent_id.is_none() {
            return Err(ValidationError::MissingField("parentId").into());
        }
        let response = self
            .execute_request(level.request(parent_id), true)
            .await?;
        options_from(level.root_field(), response)
    }

    /// Options for a dropdown, never failing
    ///
    /// A failed request notifies an error and yields no options; partial
    /// errors notify a warning and yield the rows that did arrive.
    pub async fn options_or_empty(&self, lookup: Lookup, notifier: &dyn Notifier) -> Vec<SelectOption> {
        match self.lookup_options(lookup).await {
            Ok(fetched) => {
                if !fetched.is_complete() {
                    notifier.warn(&format!("Some {lookup} could not be loaded"));
                }
                fetched.data
            }
            Err(e) => {
                notifier.error(&format!("Could not load {lookup}: {e}"));
                Vec::new()
            }
        }
    }
}
