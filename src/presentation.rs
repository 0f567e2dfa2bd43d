use crate::catalog::SurfaceKind;
use crate::field::Field;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::fmt::Write;
use std::str::FromStr;

pub const MAX_STARS: usize = 5;
const FILLED_STAR: char = '★';
const EMPTY_STAR: char = '☆';
const MISSING: &str = "—";

impl SurfaceKind {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Natural => "🌱",
            Self::Artificial => "🏟️",
            Self::Indoor => "🏢",
        }
    }
}

pub fn field_icon(surface_type: &str) -> &'static str {
    SurfaceKind::from_str(surface_type)
        .map(|kind| kind.icon())
        .unwrap_or("⚽")
}

/// Five stars, floor of the rating filled. Missing, negative and non-finite
/// ratings all show as zero.
pub fn format_rating(rating: Option<f64>) -> String {
    let rating = rating.filter(|r| r.is_finite()).unwrap_or(0.0);
    let filled = rating.clamp(0.0, MAX_STARS as f64).floor() as usize;
    let mut stars = String::with_capacity(MAX_STARS * FILLED_STAR.len_utf8());
    stars.extend(std::iter::repeat(FILLED_STAR).take(filled));
    stars.extend(std::iter::repeat(EMPTY_STAR).take(MAX_STARS - filled));
    stars
}

fn or_missing(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

fn flags(field: &Field) -> String {
    let mut flags = Vec::new();
    if field.lighting.unwrap_or(false) {
        flags.push("💡");
    }
    if field.parking.unwrap_or(false) {
        flags.push("🅿️");
    }
    if field.accessibility.unwrap_or(false) {
        flags.push("♿");
    }
    flags.join(" ")
}

pub fn fields_table<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "ID", "", "Name", "Borough", "Format", "Rating", "Amenities", "Location",
        ]);

    for field in fields {
        table.add_row(vec![
            field.id.to_string(),
            field_icon(field.surface_type.as_deref().unwrap_or_default()).to_string(),
            field.name.clone(),
            or_missing(&field.borough).to_string(),
            or_missing(&field.format).to_string(),
            format_rating(field.rating),
            flags(field),
            field.coordinates.to_string(),
        ]);
    }
    table
}

/// Detailed, multi-line description of a single field.
pub fn field_card(field: &Field) -> String {
    let mut card = String::new();
    let icon = field_icon(field.surface_type.as_deref().unwrap_or_default());
    // Writing to a String can't fail.
    let _ = writeln!(card, "{icon} {}", field.name);
    if !field.address.is_empty() {
        let _ = writeln!(card, "📍 {}", field.address);
    }
    if let Some(rating) = field.rating.filter(|r| *r != 0.0) {
        let _ = writeln!(
            card,
            "{} {rating} ({} reviews)",
            format_rating(Some(rating)),
            field.reviews.unwrap_or(0)
        );
    }
    if let Some(description) = field.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(card, "{description}");
    }
    let _ = writeln!(card, "Surface:  {}", or_missing(&field.surface_type));
    let _ = writeln!(card, "Format:   {}", or_missing(&field.format));
    let _ = writeln!(card, "Borough:  {}", or_missing(&field.borough));

    let mut badges = Vec::new();
    if field.lighting.unwrap_or(false) {
        badges.push("💡 Lighting");
    }
    if field.parking.unwrap_or(false) {
        badges.push("🅿️ Parking");
    }
    if field.accessibility.unwrap_or(false) {
        badges.push("♿ Accessible");
    }
    if !badges.is_empty() {
        let _ = writeln!(card, "{}", badges.join("  "));
    }
    if !field.amenities.is_empty() {
        let _ = writeln!(card, "Amenities: {}", field.amenities.join(", "));
    }
    if let Some(phone) = field.phone.as_deref().filter(|p| !p.is_empty()) {
        let _ = writeln!(card, "📞 {phone}");
    }
    if let Some(website) = field.website.as_deref().filter(|w| !w.is_empty()) {
        let _ = writeln!(card, "🌐 {website}");
    }
    if let Some(photo) = field.photos.first() {
        let _ = writeln!(card, "📷 {photo}");
    }
    let _ = write!(card, "🗺️ {}", field.coordinates);
    card
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn icons() {
        assert_eq!(field_icon("Natural"), "🌱");
        assert_eq!(field_icon("Artificial"), "🏟️");
        assert_eq!(field_icon("Indoor"), "🏢");
        assert_eq!(field_icon("Unknown"), "⚽");
        assert_eq!(field_icon(""), "⚽");
        assert_eq!(field_icon("indoor"), "⚽");
    }

    #[test]
    fn rating_stars() {
        assert_eq!(format_rating(Some(3.0)), "★★★☆☆");
        assert_eq!(format_rating(Some(3.0)).chars().count(), 5);
        assert_eq!(format_rating(Some(4.9)), "★★★★☆");
        assert_eq!(format_rating(Some(7.0)), format_rating(Some(5.0)));
        assert_eq!(format_rating(Some(-1.0)), "☆☆☆☆☆");
        assert_eq!(format_rating(None), "☆☆☆☆☆");
        assert_eq!(format_rating(Some(f64::NAN)), "☆☆☆☆☆");
        assert_eq!(format_rating(Some(f64::INFINITY)), "☆☆☆☆☆");
    }

    #[test]
    fn card_shows_placeholders_for_missing_values() {
        let mut field = Field::new(1, "Parc Jarry");
        field.surface_type = Some("Artificial".to_string());
        field.lighting = Some(true);
        field.parking = Some(false);
        let card = field_card(&field);
        assert!(card.starts_with("🏟️ Parc Jarry\n"));
        assert!(card.contains("Format:   —"));
        assert!(card.contains("💡 Lighting"));
        assert!(!card.contains("Parking"));
        assert!(!card.contains("reviews"));
    }

    #[test]
    fn card_shows_rating_line() {
        let mut field = Field::new(1, "Stade");
        field.rating = Some(3.5);
        field.reviews = Some(12);
        assert!(field_card(&field).contains("★★★☆☆ 3.5 (12 reviews)"));
    }

    #[test]
    fn table_has_a_row_per_field() {
        let fields = vec![Field::new(1, "A"), Field::new(2, "B")];
        let table = fields_table(&fields);
        assert_eq!(table.row_iter().count(), 2);
    }
}
