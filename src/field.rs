use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

pub type FieldId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Default for Coordinates {
    /// Central Montreal
    fn default() -> Self {
        Self::new(45.5017, -73.5673)
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Coordinates> for (f64, f64) {
    fn from(c: Coordinates) -> Self {
        (c.latitude, c.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A soccer field listing as used by the rest of the application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borough: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Field {
    pub fn new(id: FieldId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: String::new(),
            coordinates: Coordinates::default(),
            surface_type: None,
            format: None,
            lighting: None,
            parking: None,
            accessibility: None,
            phone: None,
            website: None,
            borough: None,
            description: None,
            amenities: Vec::new(),
            rating: None,
            reviews: None,
            photos: Vec::new(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.borough {
            Some(borough) => write!(f, "{} ({})", self.name, borough),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A listing exactly as the API sends it. Everything except the id may be
/// missing, null or malformed.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldData {
    pub id: FieldId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<Value>,
    pub surface_type: Option<String>,
    pub format: Option<String>,
    pub lighting: Option<bool>,
    pub parking: Option<bool>,
    pub accessibility: Option<bool>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub borough: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub amenities: Vec<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub photos: Vec<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Defaults substituted for data the API leaves out.
#[derive(Clone, Debug)]
pub struct Normalization {
    pub default_coordinates: Coordinates,
    pub placeholder_photo: String,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            default_coordinates: Coordinates::default(),
            placeholder_photo: "/Images/placeholder.jpeg".to_string(),
        }
    }
}

impl FieldData {
    /// The coordinates when the API sent a usable pair.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates.as_ref().and_then(parse_coordinates)
    }

    pub fn normalize(self, opts: &Normalization) -> Field {
        let coordinates = self.coordinates().unwrap_or_else(|| {
            debug!("Field {} has no usable coordinates", self.id);
            opts.default_coordinates
        });
        let photos = if self.photos.is_empty() {
            vec![opts.placeholder_photo.clone()]
        } else {
            self.photos
        };

        Field {
            id: self.id,
            name: self.name,
            address: self.address,
            coordinates,
            surface_type: self.surface_type,
            format: self.format,
            lighting: self.lighting,
            parking: self.parking,
            accessibility: self.accessibility,
            phone: self.phone,
            website: self.website,
            borough: self.borough,
            description: self.description,
            amenities: self.amenities,
            rating: self.rating,
            reviews: self.reviews,
            photos,
        }
    }
}

fn parse_coordinates(value: &Value) -> Option<Coordinates> {
    let [lat, lon] = value.as_array()?.as_slice() else {
        return None;
    };
    let latitude = coordinate(lat)?;
    let longitude = coordinate(lon)?;
    Some(Coordinates::new(latitude, longitude))
}

fn coordinate(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Decode a raw `/fields` payload without filling anything in. Entries that
/// can't be decoded are dropped so one bad record never hides the rest.
pub fn decode_fields(payload: Value) -> Vec<FieldData> {
    let Value::Array(entries) = payload else {
        warn!("Expected an array of fields, got {}", json_kind(&payload));
        return Vec::new();
    };

    let mut fields = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<FieldData>(entry) {
            Ok(data) => fields.push(data),
            Err(err) => warn!("Skipping malformed field at index {index}: {err}"),
        }
    }
    fields
}

/// Turn a raw `/fields` payload into listings ready for display.
pub fn normalize_fields(payload: Value, opts: &Normalization) -> Vec<Field> {
    decode_fields(payload)
        .into_iter()
        .map(|data| data.normalize(opts))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skips_malformed_entries() {
        let payload = json!([
            {"id": 1, "name": "Parc Jarry", "address": "285 Rue Faillon O", "coordinates": [45.53, -73.62]},
            "not a field",
            {"name": "No id"},
            {"id": 2, "name": "Stade Complexe", "lighting": "yes"},
            {"id": 3, "name": null, "address": null, "coordinates": null},
        ]);
        let fields = normalize_fields(payload, &Normalization::default());
        let ids: Vec<_> = fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(fields[1].name, "");
        assert_eq!(fields[1].address, "");
    }

    #[test]
    fn non_array_payload_is_empty() {
        let fields = normalize_fields(json!({"detail": "oops"}), &Normalization::default());
        assert!(fields.is_empty());
    }

    #[test]
    fn substitutes_default_coordinates() {
        let opts = Normalization::default();
        let payload = json!([
            {"id": 1, "coordinates": [45.1]},
            {"id": 2, "coordinates": ["45.2", "-73.1"]},
            {"id": 3, "coordinates": ["north", "-73.1"]},
            {"id": 4},
        ]);
        let fields = normalize_fields(payload, &opts);
        assert_eq!(fields[0].coordinates, opts.default_coordinates);
        assert_eq!(fields[1].coordinates, Coordinates::new(45.2, -73.1));
        assert_eq!(fields[2].coordinates, opts.default_coordinates);
        assert_eq!(fields[3].coordinates, opts.default_coordinates);
    }

    #[test]
    fn substitutes_placeholder_photo() {
        let opts = Normalization {
            placeholder_photo: "placeholder.png".to_string(),
            ..Default::default()
        };
        let payload = json!([
            {"id": 1, "photos": []},
            {"id": 2, "photos": null},
            {"id": 3, "photos": ["a.jpg", "b.jpg"]},
        ]);
        let fields = normalize_fields(payload, &opts);
        assert_eq!(fields[0].photos, vec!["placeholder.png"]);
        assert_eq!(fields[1].photos, vec!["placeholder.png"]);
        assert_eq!(fields[2].photos, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn decoding_keeps_missing_values_missing() {
        let fields = decode_fields(json!([
            {"id": 7, "name": "Stade", "address": "1 Rue"},
            {"id": 8, "coordinates": [45.2, -73.1], "photos": ["a.jpg"]},
            42,
        ]));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].coordinates(), None);
        assert!(fields[0].photos.is_empty());
        assert_eq!(fields[1].coordinates(), Some(Coordinates::new(45.2, -73.1)));
    }

    #[test]
    fn coordinates_serialize_as_pair() {
        let value = serde_json::to_value(Coordinates::new(45.5, -73.5)).unwrap();
        assert_eq!(value, json!([45.5, -73.5]));
    }
}
