use crate::field::{Coordinates, FieldData, FieldId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of create and update requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldPayload {
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub lighting: bool,
    pub parking: bool,
    pub accessibility: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borough: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("The field name and address are required")]
    MissingNameOrAddress,
    #[error("Please provide a valid latitude and longitude")]
    InvalidCoordinates,
}

/// Admin input for a field, as typed. `id` is set when editing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldForm {
    pub id: Option<FieldId>,
    pub name: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub surface_type: String,
    pub format: String,
    pub borough: String,
    pub lighting: bool,
    pub parking: bool,
    pub accessibility: bool,
    pub phone: String,
    pub website: String,
    pub description: String,
    /// Comma separated
    pub amenities: String,
    /// Comma separated
    pub photos: String,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn to_list(value: &str) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect();
    (!items.is_empty()).then_some(items)
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

impl FieldForm {
    /// Hydrate from a listing as the API stores it. Values the API doesn't
    /// have stay empty, so saving never writes display defaults back.
    pub fn from_data(field: &FieldData) -> Self {
        let coordinates = field.coordinates();
        Self {
            id: Some(field.id),
            name: field.name.clone(),
            address: field.address.clone(),
            latitude: coordinates
                .map(|c| c.latitude.to_string())
                .unwrap_or_default(),
            longitude: coordinates
                .map(|c| c.longitude.to_string())
                .unwrap_or_default(),
            surface_type: field.surface_type.clone().unwrap_or_default(),
            format: field.format.clone().unwrap_or_default(),
            borough: field.borough.clone().unwrap_or_default(),
            lighting: field.lighting.unwrap_or(false),
            parking: field.parking.unwrap_or(false),
            accessibility: field.accessibility.unwrap_or(false),
            phone: field.phone.clone().unwrap_or_default(),
            website: field.website.clone().unwrap_or_default(),
            description: field.description.clone().unwrap_or_default(),
            amenities: field.amenities.join(", "),
            photos: field.photos.join(", "),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn build_payload(&self) -> Result<FieldPayload, FormError> {
        let name = self.name.trim();
        let address = self.address.trim();
        if name.is_empty() || address.is_empty() {
            return Err(FormError::MissingNameOrAddress);
        }
        let (Some(latitude), Some(longitude)) = (
            parse_coordinate(&self.latitude),
            parse_coordinate(&self.longitude),
        ) else {
            return Err(FormError::InvalidCoordinates);
        };

        Ok(FieldPayload {
            name: name.to_string(),
            address: address.to_string(),
            coordinates: Coordinates::new(latitude, longitude),
            surface_type: optional(&self.surface_type),
            format: optional(&self.format),
            lighting: self.lighting,
            parking: self.parking,
            accessibility: self.accessibility,
            phone: optional(&self.phone),
            website: optional(&self.website),
            borough: optional(&self.borough),
            description: optional(&self.description),
            amenities: to_list(&self.amenities),
            photos: to_list(&self.photos),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn form() -> FieldForm {
        FieldForm {
            name: " Parc Jarry ".to_string(),
            address: "285 Rue Faillon O".to_string(),
            latitude: "45.5343".to_string(),
            longitude: " -73.6280".to_string(),
            surface_type: "Artificial".to_string(),
            format: "  ".to_string(),
            lighting: true,
            amenities: "Vestiaires, , Toilettes ,".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn builds_a_trimmed_payload() {
        let payload = form().build_payload().unwrap();
        assert_eq!(payload.name, "Parc Jarry");
        assert_eq!(payload.coordinates, Coordinates::new(45.5343, -73.628));
        assert_eq!(payload.surface_type.as_deref(), Some("Artificial"));
        assert_eq!(payload.format, None);
        assert_eq!(
            payload.amenities,
            Some(vec!["Vestiaires".to_string(), "Toilettes".to_string()])
        );
        assert_eq!(payload.photos, None);
    }

    #[test]
    fn payload_omits_empty_optionals_on_the_wire() {
        let value = serde_json::to_value(form().build_payload().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Parc Jarry",
                "address": "285 Rue Faillon O",
                "coordinates": [45.5343, -73.628],
                "surface_type": "Artificial",
                "lighting": true,
                "parking": false,
                "accessibility": false,
                "amenities": ["Vestiaires", "Toilettes"],
            })
        );
    }

    #[test]
    fn name_and_address_are_required() {
        let mut form = form();
        form.address = "   ".to_string();
        assert_eq!(form.build_payload(), Err(FormError::MissingNameOrAddress));
    }

    #[test]
    fn coordinates_must_be_finite_numbers() {
        for (lat, lon) in [("", "-73.6"), ("45.5", "west"), ("NaN", "1"), ("inf", "1")] {
            let form = FieldForm {
                latitude: lat.to_string(),
                longitude: lon.to_string(),
                ..form()
            };
            assert_eq!(form.build_payload(), Err(FormError::InvalidCoordinates));
        }
    }

    fn stored(value: serde_json::Value) -> FieldData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn hydrates_from_stored_data() {
        let field = stored(json!({
            "id": 7,
            "name": "Stade",
            "address": "1 Rue",
            "coordinates": [45.5, -73.6],
            "amenities": ["Douches", "Bancs"],
            "parking": true,
        }));
        let form = FieldForm::from_data(&field);
        assert!(form.is_edit());
        assert_eq!(form.amenities, "Douches, Bancs");
        assert!(form.parking);
        assert!(!form.lighting);

        let payload = form.build_payload().unwrap();
        assert_eq!(payload.coordinates, Coordinates::new(45.5, -73.6));
        assert_eq!(payload.amenities, Some(field.amenities.clone()));
    }

    #[test]
    fn renaming_does_not_store_display_defaults() {
        let field = stored(json!({
            "id": 7,
            "name": "Stade",
            "address": "1 Rue",
            "coordinates": [45.5, -73.6],
        }));
        let mut form = FieldForm::from_data(&field);
        form.name = "Stade renamed".to_string();
        let payload = form.build_payload().unwrap();
        assert_eq!(payload.name, "Stade renamed");
        assert_eq!(payload.photos, None);
        assert_eq!(payload.coordinates, Coordinates::new(45.5, -73.6));
    }

    #[test]
    fn missing_coordinates_must_be_entered() {
        let field = stored(json!({"id": 7, "name": "Stade", "address": "1 Rue"}));
        let mut form = FieldForm::from_data(&field);
        assert_eq!(form.latitude, "");
        assert_eq!(form.longitude, "");
        assert_eq!(form.build_payload(), Err(FormError::InvalidCoordinates));

        form.latitude = "45.45".to_string();
        form.longitude = "-73.57".to_string();
        assert_eq!(
            form.build_payload().unwrap().coordinates,
            Coordinates::new(45.45, -73.57)
        );
    }
}
