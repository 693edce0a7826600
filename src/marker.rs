use serde::{Deserialize, Serialize};

/// Closed set of marker kinds shown over the panorama.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerCategory {
    History,
    Anomaly,
    Sensor,
    #[serde(rename = "POI")]
    Poi,
}

/// Percentage offsets across the panorama: `x` of the width, `y` of the height.
///
/// Values are deliberately not clamped. Out-of-range or NaN coordinates are
/// carried as-is so clustering can fall back to singleton groups for them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Plain Euclidean distance. No wraparound on `x`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Anything that can be laid out on the panorama.
pub trait Positioned {
    fn position(&self) -> Position;
}

impl Positioned for Position {
    fn position(&self) -> Position {
        *self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub label: String,
    pub description: String,
    pub category: MarkerCategory,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Marker {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        category: MarkerCategory,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            category,
            position,
            thumbnail: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

impl Positioned for Marker {
    fn position(&self) -> Position {
        self.position
    }
}

impl<T: Positioned + ?Sized> Positioned for &T {
    fn position(&self) -> Position {
        (**self).position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_plain_euclidean() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn distance_does_not_wrap_across_the_seam() {
        let left = Position::new(1.0, 50.0);
        let right = Position::new(99.0, 50.0);
        assert_eq!(left.distance_to(&right), 98.0);
    }

    #[test]
    fn marker_json_uses_flat_coordinates_and_poi_tag() {
        let marker = Marker::new("m1", "Tower", MarkerCategory::Poi, Position::new(12.5, 40.0))
            .with_description("Old radio tower");
        let json = serde_json::to_value(&marker).expect("serialize marker");

        assert_eq!(json["x"], 12.5);
        assert_eq!(json["y"], 40.0);
        assert_eq!(json["category"], "POI");
        assert!(json.get("thumbnail").is_none());

        let parsed: Marker = serde_json::from_value(json).expect("parse marker");
        assert_eq!(parsed, marker);
    }

    #[test]
    fn marker_json_thumbnail_is_optional() {
        let raw = r#"{"id":"a","label":"A","description":"","category":"Sensor","x":1.0,"y":2.0}"#;
        let parsed: Marker = serde_json::from_str(raw).expect("parse marker");
        assert_eq!(parsed.category, MarkerCategory::Sensor);
        assert_eq!(parsed.thumbnail, None);
    }
}
