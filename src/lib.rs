//! # crm-client
//!
//! Client core for the reservation/lead back office GraphQL API.
//!
//! ## Features
//!
//! - **Auth Link** - bearer header from a short-lived credential cache
//! - **Batching** - operations issued within a window share one HTTP call
//! - **Typed Operations** - leads, reservations and lookup entities
//! - **List Filters** - filter/sort state kept in sync with storage and the URL
//! - **Location Cascade** - country → city → county → district selection
//!
//! ## Usage
//!
//! ```rust,no_run
//! use crm_client::{ClientConfig, CrmClient, MemoryStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> crm_client::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let client = CrmClient::from_store(&config, Arc::new(MemoryStore::new()))?;
//! let leads = client.leads().await?;
//! println!("{} leads", leads.data.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod batch;
pub mod cascade;
pub mod client;
pub mod config;
pub mod controller;
pub mod filter;
pub mod forms;
pub mod graphql;
pub mod logging;
pub mod notify;
pub mod operations;
pub mod pagination;
pub mod storage;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{CachedCredential, Clock, CredentialCache, StoredTokenSource, SystemClock, TokenSource};
pub use batch::{BatchConfig, BatchTransport};
pub use cascade::{FetchTicket, LocationCascade, LocationSource};
pub use client::CrmClient;
pub use config::ClientConfig;
pub use controller::{FilterController, History, MemoryHistory};
pub use filter::{DateRange, Filterable, FilterState, StatusFilter};
pub use forms::{LeadForm, ReservationForm};
pub use graphql::{Fetched, GraphQLErrorEntry, GraphQLRequest, GraphQLResponse, Operation, OperationKind};
pub use notify::{NoticeLevel, Notifier, TracingNotifier};
pub use operations::{LocationLevel, Lookup};
pub use pagination::{ListParams, Page, PageInfo, SortDirection};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{Lead, Reservation, SelectOption};

use thiserror::Error;

/// Local validation failures; nothing is sent or mutated when one occurs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Client errors
#[derive(Error, Debug, Clone)]
pub enum CrmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("GraphQL errors: {}", format_errors(.0))]
    GraphQL(Vec<GraphQLErrorEntry>),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn format_errors(errors: &[GraphQLErrorEntry]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, CrmError>;
