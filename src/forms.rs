//! Create/update forms for leads and reservations
//!
//! `validate()` is the only way to obtain a mutation input, so an
//! invalid form never reaches the transport.

use crate::operations::{TransactionInput, UserInput};
use crate::types::{Lead, Reservation, SelectOption};
use crate::ValidationError;
use chrono::NaiveDate;

fn required_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn required_option(
    value: &Option<SelectOption>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match value {
        Some(option) if !option.is_match_all() => Ok(option.value.clone()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn optional_id(value: &Option<SelectOption>) -> Option<String> {
    value
        .as_ref()
        .filter(|option| !option.is_match_all())
        .map(|option| option.value.clone())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadForm {
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<SelectOption>,
    pub is_active: bool,
    pub password: Option<String>,
}

impl LeadForm {
    /// Prefill the edit form from an existing lead
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            full_name: lead.full_name.clone().unwrap_or_default(),
            username: lead.username.clone().unwrap_or_default(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            role: lead
                .role
                .as_ref()
                .map(|role| SelectOption::new(role.id.clone(), role.name.clone())),
            is_active: lead.is_active.unwrap_or(true),
            password: None,
        }
    }

    pub fn validate(&self) -> Result<UserInput, ValidationError> {
        let full_name = required_text(&self.full_name, "fullName")?;
        let username = required_text(&self.username, "username")?;
        let role_id = required_option(&self.role, "role")?;

        let email = optional_text(&self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(ValidationError::InvalidField {
                    field: "email",
                    reason: format!("`{email}` is not an e-mail address"),
                });
            }
        }

        Ok(UserInput {
            full_name,
            username,
            email,
            phone: optional_text(&self.phone),
            role_id,
            is_active: self.is_active,
            password: optional_text(&self.password),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationForm {
    pub date: Option<NaiveDate>,
    pub product: Option<SelectOption>,
    pub account: Option<SelectOption>,
    pub channel: Option<SelectOption>,
    pub status: Option<SelectOption>,
    pub kind: Option<SelectOption>,
    pub customer: Option<SelectOption>,
    pub user: Option<SelectOption>,
    pub country: Option<SelectOption>,
    pub city: Option<SelectOption>,
    pub county: Option<SelectOption>,
    pub district: Option<SelectOption>,
    pub note: Option<String>,
    pub is_active: bool,
}

impl ReservationForm {
    pub fn from_reservation(reservation: &Reservation) -> Self {
        let option = |r: &Option<crate::types::NamedRef>| r.clone().map(SelectOption::from);
        let person = |p: &Option<crate::types::PersonRef>| {
            p.as_ref()
                .map(|p| SelectOption::new(p.id.clone(), p.full_name.clone()))
        };

        Self {
            date: reservation.date,
            product: option(&reservation.product),
            account: option(&reservation.account),
            channel: option(&reservation.channel),
            status: option(&reservation.status),
            kind: option(&reservation.kind),
            customer: person(&reservation.customer),
            user: person(&reservation.user),
            country: option(&reservation.country),
            city: option(&reservation.city),
            county: option(&reservation.county),
            district: option(&reservation.district),
            note: reservation.note.clone(),
            is_active: reservation.is_active.unwrap_or(true),
        }
    }

    pub fn validate(&self) -> Result<TransactionInput, ValidationError> {
        let date = self.date.ok_or(ValidationError::MissingField("date"))?;

        Ok(TransactionInput {
            date,
            product_id: required_option(&self.product, "product")?,
            account_id: required_option(&self.account, "account")?,
            channel_id: required_option(&self.channel, "channel")?,
            status_id: required_option(&self.status, "status")?,
            type_id: required_option(&self.kind, "type")?,
            customer_id: optional_id(&self.customer),
            user_id: optional_id(&self.user),
            country_id: optional_id(&self.country),
            city_id: optional_id(&self.city),
            county_id: optional_id(&self.county),
            district_id: optional_id(&self.district),
            note: optional_text(&self.note),
            is_active: self.is_active,
        })
    }
}
