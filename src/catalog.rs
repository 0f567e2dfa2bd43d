//! Known values used to populate choices. The field model keeps these as
//! plain strings, so listings with other values are still valid.

use serde::{Deserialize, Serialize};
use strum::Display;
use strum_macros::{AsRefStr, EnumIter, EnumString};

#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
)]
pub enum SurfaceKind {
    Natural,
    Artificial,
    Indoor,
}

pub const FORMATS: [&str; 3] = ["5v5", "7v7", "11v11"];

/// Value offered in admin choices for anything not in a list.
pub const OTHER: &str = "Autre";

pub const BOROUGHS: [&str; 27] = [
    "Ahuntsic-Cartierville",
    "Anjou",
    "Boucherville",
    "Brossard",
    "Candiac",
    "Châteauguay",
    "Côte-des-Neiges–Notre-Dame-de-Grâce",
    "La Prairie",
    "Lachine",
    "Lasalle",
    "Le Sud-Ouest",
    "Longueuil",
    "L'Île-Bizard–Sainte-Geneviève",
    "Mercier–Hochelaga-Maisonneuve",
    "Montréal-Nord",
    "Outremont",
    "Pierrefonds-Roxboro",
    "Plateau-Mont-Royal",
    "Rivière-des-Prairies–Pointe-aux-Trembles",
    "Rosemont–La Petite-Patrie",
    "Saint-Constant",
    "Saint-Hubert",
    "Saint-Lambert",
    "Saint-Léonard",
    "Verdun",
    "Ville-Marie",
    "Villeray–Saint-Michel–Parc-Extension",
];

/// Choices for an admin form: the known values followed by [`OTHER`].
pub fn with_other<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut choices: Vec<&str> = Vec::new();
    for value in values.into_iter().chain([OTHER]) {
        if !choices.contains(&value) {
            choices.push(value);
        }
    }
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn surface_kinds_round_trip_through_strings() {
        for kind in SurfaceKind::iter() {
            assert_eq!(SurfaceKind::from_str(kind.as_ref()).unwrap(), kind);
        }
        assert!(SurfaceKind::from_str("natural").is_err());
    }

    #[test]
    fn other_is_appended_once() {
        assert_eq!(with_other(FORMATS), vec!["5v5", "7v7", "11v11", OTHER]);
        assert_eq!(with_other(["a", OTHER]), vec!["a", OTHER]);
    }
}
