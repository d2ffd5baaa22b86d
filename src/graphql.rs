//! GraphQL request/response envelopes and typed operations

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One GraphQL operation as sent over HTTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    pub query: String,

    #[serde(default)]
    pub variables: Value,

    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Value::Object(Default::default()),
            operation_name: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Location of an error in the query document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// One entry of the response `errors` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLErrorEntry {
    pub message: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl fmt::Display for GraphQLErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str(&self.message);
        }
        let path: Vec<String> = self
            .path
            .iter()
            .map(|segment| match segment {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        write!(f, "{} (at {})", self.message, path.join("."))
    }
}

/// GraphQL response, possibly carrying data and errors at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse<T = Value> {
    pub data: Option<T>,

    #[serde(default)]
    pub errors: Vec<GraphQLErrorEntry>,
}

/// Untyped response as it comes off the wire
pub type RawResponse = GraphQLResponse<Value>;

/// Data returned together with any partial errors
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub errors: Vec<GraphQLErrorEntry>,
}

impl<T> Fetched<T> {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            errors: self.errors,
        }
    }
}

impl<T> GraphQLResponse<T> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Strict policy: any error fails the operation
    pub fn into_data(self) -> crate::Result<T> {
        if !self.errors.is_empty() {
            return Err(crate::CrmError::GraphQL(self.errors));
        }
        self.data
            .ok_or_else(|| crate::CrmError::Decode("response carried neither data nor errors".into()))
    }

    /// Lenient policy: keep whatever data arrived alongside the errors
    pub fn into_fetched(self) -> crate::Result<Fetched<T>> {
        match self.data {
            Some(data) => Ok(Fetched {
                data,
                errors: self.errors,
            }),
            None if !self.errors.is_empty() => Err(crate::CrmError::GraphQL(self.errors)),
            None => Err(crate::CrmError::Decode(
                "response carried neither data nor errors".into(),
            )),
        }
    }
}

impl RawResponse {
    /// Decode `data` into the operation's response type
    pub fn decode<T: DeserializeOwned>(self) -> crate::Result<GraphQLResponse<T>> {
        let data = match self.data {
            Some(Value::Null) | None => None,
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => Some(data),
                // a failed root field often comes back null; report the server's errors
                Err(_) if !self.errors.is_empty() => {
                    return Err(crate::CrmError::GraphQL(self.errors))
                }
                Err(e) => return Err(crate::CrmError::Decode(e.to_string())),
            },
        };
        Ok(GraphQLResponse {
            data,
            errors: self.errors,
        })
    }
}

/// Kind of operation, decides batching eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn is_batchable(self) -> bool {
        matches!(self, OperationKind::Query)
    }
}

/// A typed GraphQL operation
///
/// Implementors pair a document with its variable and response shapes.
pub trait Operation {
    type Variables: Serialize;
    type ResponseData: DeserializeOwned;

    const NAME: &'static str;
    const QUERY: &'static str;
    const KIND: OperationKind;

    fn build(variables: Self::Variables) -> crate::Result<GraphQLRequest> {
        let variables = serde_json::to_value(variables)
            .map_err(|e| crate::CrmError::Decode(e.to_string()))?;
        let variables = match variables {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Ok(GraphQLRequest::new(Self::QUERY)
            .with_variables(variables)
            .with_operation_name(Self::NAME))
    }
}

/// Variables of operations that take none
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoVariables {}
