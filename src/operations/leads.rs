//! Lead operations (server type `User`)

use super::{IdVariables, InputVariables, MutatedId, UpdateVariables};
use crate::graphql::{NoVariables, Operation, OperationKind};
use crate::types::Lead;
use serde::{Deserialize, Serialize};

/// All leads
pub struct Users;

#[derive(Debug, Clone, Deserialize)]
pub struct UsersData {
    pub users: Vec<Lead>,
}

impl Operation for Users {
    type Variables = NoVariables;
    type ResponseData = UsersData;

    const NAME: &'static str = "Users";
    const QUERY: &'static str = "query Users { users { id fullName username email phone isActive createdAt role { id name } } }";
    const KIND: OperationKind = OperationKind::Query;
}

/// One lead by id
pub struct UserById;

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub user: Option<Lead>,
}

impl Operation for UserById {
    type Variables = IdVariables;
    type ResponseData = UserData;

    const NAME: &'static str = "User";
    const QUERY: &'static str = "query User($id: ID!) { user(id: $id) { id fullName username email phone isActive createdAt role { id name } } }";
    const KIND: OperationKind = OperationKind::Query;
}

/// Writable lead fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub full_name: String,
    pub username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    pub role_id: String,
    pub is_active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

pub struct CreateUser;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserData {
    pub create_user: MutatedId,
}

impl Operation for CreateUser {
    type Variables = InputVariables<UserInput>;
    type ResponseData = CreateUserData;

    const NAME: &'static str = "CreateUser";
    const QUERY: &'static str =
        "mutation CreateUser($input: UserInput!) { createUser(input: $input) { id } }";
    const KIND: OperationKind = OperationKind::Mutation;
}

pub struct UpdateUser;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserData {
    pub update_user: MutatedId,
}

impl Operation for UpdateUser {
    type Variables = UpdateVariables<UserInput>;
    type ResponseData = UpdateUserData;

    const NAME: &'static str = "UpdateUser";
    const QUERY: &'static str = "mutation UpdateUser($id: ID!, $input: UserInput!) { updateUser(id: $id, input: $input) { id } }";
    const KIND: OperationKind = OperationKind::Mutation;
}
