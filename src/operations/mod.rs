//! Query and mutation documents with their variable/response shapes

pub mod leads;
pub mod lookups;
pub mod reservations;

pub use leads::{CreateUser, UpdateUser, UserById, UserInput, Users};
pub use lookups::{LocationLevel, Lookup};
pub use reservations::{
    CreateTransaction, TransactionById, TransactionInput, Transactions, UpdateTransaction,
};

use serde::{Deserialize, Serialize};

/// `{ id }` selection returned by create/update mutations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatedId {
    pub id: String,
}

/// Variables of by-id queries
#[derive(Debug, Clone, Serialize)]
pub struct IdVariables {
    pub id: String,
}

/// Variables of update mutations
#[derive(Debug, Clone, Serialize)]
pub struct UpdateVariables<I> {
    pub id: String,
    pub input: I,
}

/// Variables of create mutations
#[derive(Debug, Clone, Serialize)]
pub struct InputVariables<I> {
    pub input: I,
}
