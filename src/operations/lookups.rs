//! Lookup entity queries
//!
//! Every lookup returns a flat list of `{id, name}` rows (users:
//! `{id, fullName}`) under a single root field.

use crate::graphql::GraphQLRequest;
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Flat lookup entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Users,
    Products,
    Accounts,
    Channels,
    Statuses,
    Types,
    Roles,
}

impl Lookup {
    pub const ALL: [Lookup; 7] = [
        Lookup::Users,
        Lookup::Products,
        Lookup::Accounts,
        Lookup::Channels,
        Lookup::Statuses,
        Lookup::Types,
        Lookup::Roles,
    ];

    /// Root field the rows come back under
    pub fn root_field(self) -> &'static str {
        match self {
            Lookup::Users => "users",
            Lookup::Products => "products",
            Lookup::Accounts => "accounts",
            Lookup::Channels => "channels",
            Lookup::Statuses => "transactionStatuses",
            Lookup::Types => "transactionTypes",
            Lookup::Roles => "roles",
        }
    }

    fn document(self) -> &'static str {
        match self {
            Lookup::Users => "query UserOptions { users { id fullName } }",
            Lookup::Products => "query ProductOptions { products { id name } }",
            Lookup::Accounts => "query AccountOptions { accounts { id name } }",
            Lookup::Channels => "query ChannelOptions { channels { id name } }",
            Lookup::Statuses => "query StatusOptions { transactionStatuses { id name } }",
            Lookup::Types => "query TypeOptions { transactionTypes { id name } }",
            Lookup::Roles => "query RoleOptions { roles { id name } }",
        }
    }

    fn operation_name(self) -> &'static str {
        match self {
            Lookup::Users => "UserOptions",
            Lookup::Products => "ProductOptions",
            Lookup::Accounts => "AccountOptions",
            Lookup::Channels => "ChannelOptions",
            Lookup::Statuses => "StatusOptions",
            Lookup::Types => "TypeOptions",
            Lookup::Roles => "RoleOptions",
        }
    }

    pub fn request(self) -> GraphQLRequest {
        GraphQLRequest::new(self.document()).with_operation_name(self.operation_name())
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_field())
    }
}

impl FromStr for Lookup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "users" => Ok(Lookup::Users),
            "products" => Ok(Lookup::Products),
            "accounts" => Ok(Lookup::Accounts),
            "channels" => Ok(Lookup::Channels),
            "statuses" | "transactionstatuses" => Ok(Lookup::Statuses),
            "types" | "transactiontypes" => Ok(Lookup::Types),
            "roles" => Ok(Lookup::Roles),
            other => Err(format!("unknown lookup entity `{other}`")),
        }
    }
}

/// Levels of the cascading location selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationLevel {
    Country,
    City,
    County,
    District,
}

impl LocationLevel {
    pub const ALL: [LocationLevel; 4] = [
        LocationLevel::Country,
        LocationLevel::City,
        LocationLevel::County,
        LocationLevel::District,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn child(self) -> Option<LocationLevel> {
        match self {
            LocationLevel::Country => Some(LocationLevel::City),
            LocationLevel::City => Some(LocationLevel::County),
            LocationLevel::County => Some(LocationLevel::District),
            LocationLevel::District => None,
        }
    }

    pub fn root_field(self) -> &'static str {
        match self {
            LocationLevel::Country => "countries",
            LocationLevel::City => "cities",
            LocationLevel::County => "counties",
            LocationLevel::District => "districts",
        }
    }

    /// Request for this level's options
    ///
    /// Every level but the country takes its parent's id.
    pub fn request(self, parent_id: Option<&str>) -> GraphQLRequest {
        let (document, name, variable) = match self {
            LocationLevel::Country => (
                "query CountryOptions { countries { id name } }",
                "CountryOptions",
                None,
            ),
            LocationLevel::City => (
                "query CityOptions($countryId: ID!) { cities(countryId: $countryId) { id name } }",
                "CityOptions",
                Some("countryId"),
            ),
            LocationLevel::County => (
                "query CountyOptions($cityId: ID!) { counties(cityId: $cityId) { id name } }",
                "CountyOptions",
                Some("cityId"),
            ),
            LocationLevel::District => (
                "query DistrictOptions($countyId: ID!) { districts(countyId: $countyId) { id name } }",
                "DistrictOptions",
                Some("countyId"),
            ),
        };

        let request = GraphQLRequest::new(document).with_operation_name(name);
        match variable {
            Some(variable) => request.with_variables(json!({ variable: parent_id })),
            None => request,
        }
    }
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_parse_roundtrip() {
        for lookup in Lookup::ALL {
            assert_eq!(lookup.root_field().parse::<Lookup>(), Ok(lookup));
        }
        assert_eq!("Statuses".parse::<Lookup>(), Ok(Lookup::Statuses));
        assert!("planets".parse::<Lookup>().is_err());
    }

    #[test]
    fn test_location_requests_carry_parent_id() {
        let request = LocationLevel::County.request(Some("34"));
        assert_eq!(request.variables, json!({ "cityId": "34" }));
        assert!(request.query.contains("counties(cityId: $cityId)"));

        let countries = LocationLevel::Country.request(None);
        assert_eq!(countries.variables, json!({}));
    }

    #[test]
    fn test_location_chain() {
        assert_eq!(LocationLevel::Country.child(), Some(LocationLevel::City));
        assert_eq!(LocationLevel::District.child(), None);
        assert_eq!(LocationLevel::County.index(), 2);
    }
}
