//! Reservation operations (server type `Transaction`)

use super::{IdVariables, InputVariables, MutatedId, UpdateVariables};
use crate::graphql::{NoVariables, Operation, OperationKind};
use crate::types::Reservation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub struct Transactions;

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsData {
    pub transactions: Vec<Reservation>,
}

impl Operation for Transactions {
    type Variables = NoVariables;
    type ResponseData = TransactionsData;

    const NAME: &'static str = "Transactions";
    const QUERY: &'static str = "query Transactions { transactions { id code date createdAt isActive note customer { id fullName } user { id fullName username } product { id name } account { id name } channel { id name } status { id name } type { id name } } }";
    const KIND: OperationKind = OperationKind::Query;
}

pub struct TransactionById;

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    pub transaction: Option<Reservation>,
}

impl Operation for TransactionById {
    type Variables = IdVariables;
    type ResponseData = TransactionData;

    const NAME: &'static str = "Transaction";
    const QUERY: &'static str = "query Transaction($id: ID!) { transaction(id: $id) { id code date createdAt isActive note customer { id fullName } user { id fullName username } product { id name } account { id name } channel { id name } status { id name } type { id name } country { id name } city { id name } county { id name } district { id name } } }";
    const KIND: OperationKind = OperationKind::Query;
}

/// Writable reservation fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub date: NaiveDate,
    pub product_id: String,
    pub account_id: String,
    pub channel_id: String,
    pub status_id: String,
    pub type_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub is_active: bool,
}

pub struct CreateTransaction;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionData {
    pub create_transaction: MutatedId,
}

impl Operation for CreateTransaction {
    type Variables = InputVariables<TransactionInput>;
    type ResponseData = CreateTransactionData;

    const NAME: &'static str = "CreateTransaction";
    const QUERY: &'static str = "mutation CreateTransaction($input: TransactionInput!) { createTransaction(input: $input) { id } }";
    const KIND: OperationKind = OperationKind::Mutation;
}

pub struct UpdateTransaction;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionData {
    pub update_transaction: MutatedId,
}

impl Operation for UpdateTransaction {
    type Variables = UpdateVariables<TransactionInput>;
    type ResponseData = UpdateTransactionData;

    const NAME: &'static str = "UpdateTransaction";
    const QUERY: &'static str = "mutation UpdateTransaction($id: ID!, $input: TransactionInput!) { updateTransaction(id: $id, input: $input) { id } }";
    const KIND: OperationKind = OperationKind::Mutation;
}
