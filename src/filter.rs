//! Search and filter over an in-memory set of listings.
//!
//! Every check degrades to "no match" on missing data instead of failing,
//! so filtering can run on each keystroke without any error handling.

use crate::field::Field;
use serde::{Deserialize, Serialize};

/// "No constraint" for the surface type and size dimensions.
pub const ALL: &str = "All";
/// "No constraint" for the borough dimension.
pub const ALL_BOROUGHS: &str = "All Boroughs";

/// A normalized, lower-cased search term.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(term: &str) -> Self {
        Self(term.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Matches against the name, address and borough of a field.
    pub fn matches(&self, field: &Field) -> bool {
        if self.is_empty() {
            return true;
        }
        let borough = field.borough.as_deref().unwrap_or_default();
        [field.name.as_str(), field.address.as_str(), borough]
            .iter()
            .any(|text| text.to_lowercase().contains(&self.0))
    }
}

impl From<&str> for SearchTerm {
    fn from(term: &str) -> Self {
        Self::new(term)
    }
}

/// The constraints picked by the user. `None` always means unconstrained;
/// the sentinel strings only exist at the parsing and serialization edges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    #[serde(rename = "type", with = "sentinel_all")]
    pub surface_type: Option<String>,
    #[serde(with = "sentinel_all")]
    pub size: Option<String>,
    pub lighting: Option<bool>,
    pub parking: Option<bool>,
    pub accessibility: Option<bool>,
    #[serde(with = "sentinel_all_boroughs")]
    pub borough: Option<String>,
}

fn constraint(value: &str, sentinel: &str) -> Option<String> {
    (value != sentinel).then(|| value.to_string())
}

impl FilterSelection {
    pub fn parse_type(value: &str) -> Option<String> {
        constraint(value, ALL)
    }

    pub fn parse_size(value: &str) -> Option<String> {
        constraint(value, ALL)
    }

    pub fn parse_borough(value: &str) -> Option<String> {
        constraint(value, ALL_BOROUGHS)
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `field` satisfies the search term and every active constraint.
    pub fn matches(&self, field: &Field, search: &SearchTerm) -> bool {
        search.matches(field)
            && matches_exact(self.surface_type.as_deref(), field.surface_type.as_deref())
            && matches_exact(self.size.as_deref(), field.format.as_deref())
            && matches_flag(self.lighting, field.lighting)
            && matches_flag(self.parking, field.parking)
            && matches_flag(self.accessibility, field.accessibility)
            && matches_borough(self.borough.as_deref(), field.borough.as_deref())
    }
}

fn matches_exact(required: Option<&str>, actual: Option<&str>) -> bool {
    required.map_or(true, |r| actual.unwrap_or_default() == r)
}

// Unknown counts as false.
fn matches_flag(required: Option<bool>, actual: Option<bool>) -> bool {
    required.map_or(true, |r| actual.unwrap_or(false) == r)
}

fn matches_borough(required: Option<&str>, actual: Option<&str>) -> bool {
    required.map_or(true, |r| {
        actual.unwrap_or_default().to_lowercase() == r.to_lowercase()
    })
}

/// Keep the fields matching `selection` and `search`, in their original order.
pub fn filter_fields<'a, I>(fields: I, selection: &FilterSelection, search: &str) -> Vec<&'a Field>
where
    I: IntoIterator<Item = &'a Field>,
{
    let search = SearchTerm::new(search);
    fields
        .into_iter()
        .filter(|field| selection.matches(field, &search))
        .collect()
}

macro_rules! sentinel_module {
    ($name:ident, $sentinel:expr) => {
        mod $name {
            use serde::{Deserialize, Deserializer, Serializer};

            pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(value.as_deref().unwrap_or($sentinel))
            }

            pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = Option::<String>::deserialize(deserializer)?;
                Ok(value.and_then(|v| super::constraint(&v, $sentinel)))
            }
        }
    };
}

sentinel_module!(sentinel_all, super::ALL);
sentinel_module!(sentinel_all_boroughs, super::ALL_BOROUGHS);
