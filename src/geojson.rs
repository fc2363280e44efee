use serde::Serialize;

/// One GeoJSON feature, carried opaquely. Geometry is never inspected or
/// validated; features move from source to output intact.
pub type Feature = serde_json::Value;

/// Typed wrapper for writing a batch back out as a standalone GeoJSON
/// document: `{"type": "FeatureCollection", "features": [...]}` with no
/// other top-level keys.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }

    /// The wrapped features, in document order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
