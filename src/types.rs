//! Records and lookup options exchanged with the server

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};

/// Uniform `{value, label}` projection of a lookup entity
///
/// Two options are equal iff their values are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// The catch-all "every value" option, carrying an empty value
    pub fn match_all(label: impl Into<String>) -> Self {
        Self::new("", label)
    }

    pub fn is_match_all(&self) -> bool {
        self.value.is_empty()
    }
}

impl PartialEq for SelectOption {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for SelectOption {}

impl Hash for SelectOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// A server row shaped `{id, name}` or `{id, fullName}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LookupRow {
    pub id: Option<String>,

    #[serde(alias = "fullName")]
    pub name: Option<String>,
}

impl LookupRow {
    /// Project to a [`SelectOption`], `None` when id or label is missing
    pub fn into_option(self) -> Option<SelectOption> {
        match (self.id, self.name) {
            (Some(id), Some(name)) if !id.is_empty() => Some(SelectOption::new(id, name)),
            _ => None,
        }
    }
}

/// Project rows to options, logging rows that cannot be projected
pub fn rows_to_options(entity: &str, rows: Vec<LookupRow>) -> Vec<SelectOption> {
    let total = rows.len();
    let options: Vec<SelectOption> = rows.into_iter().filter_map(LookupRow::into_option).collect();
    if options.len() != total {
        tracing::warn!(
            entity,
            rejected = total - options.len(),
            "dropped lookup rows without id or label"
        );
    }
    options
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

/// `{id, name}` reference embedded in a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

impl From<NamedRef> for SelectOption {
    fn from(value: NamedRef) -> Self {
        SelectOption::new(value.id, value.name)
    }
}

/// Person reference embedded in a reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: String,
    pub full_name: String,

    #[serde(default)]
    pub username: Option<String>,
}

/// A lead (server type `User`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub full_name: Option<String>,
    pub username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub is_active: Option<bool>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub role: Option<Role>,
}

/// A reservation (server type `Transaction`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,

    #[serde(default)]
    pub code: Option<String>,

    /// Day the reservation is for
    #[serde(default, deserialize_with = "calendar_day")]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_active: Option<bool>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    pub customer: Option<PersonRef>,

    /// Staff member owning the reservation
    #[serde(default)]
    pub user: Option<PersonRef>,

    #[serde(default)]
    pub product: Option<NamedRef>,

    #[serde(default)]
    pub account: Option<NamedRef>,

    #[serde(default)]
    pub channel: Option<NamedRef>,

    #[serde(default)]
    pub status: Option<NamedRef>,

    #[serde(default, rename = "type")]
    pub kind: Option<NamedRef>,

    #[serde(default)]
    pub country: Option<NamedRef>,

    #[serde(default)]
    pub city: Option<NamedRef>,

    #[serde(default)]
    pub county: Option<NamedRef>,

    #[serde(default)]
    pub district: Option<NamedRef>,
}

/// `YYYY-MM-DD` or an RFC 3339 timestamp, reduced to its UTC day
///
/// Anything else is logged and read as no date, so one odd row does not
/// fail a whole list.
fn calendar_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(day));
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Ok(Some(at.with_timezone(&Utc).date_naive())),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "unreadable reservation date");
            Ok(None)
        }
    }
}
