//! GeoJSON conversion for feature collections.

use crate::error::{CartographyError, Result};
use crate::model::{FeatureCollection, PointOfInterest};
use cartography_types::GeoPoint;
use geojson::{Feature, Geometry, JsonObject, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Converts a single point of interest to a GeoJSON feature.
///
/// The payload must serialize to a JSON object; it becomes the feature's
/// `properties`.
pub fn feature_to_geojson<P: Serialize>(poi: &PointOfInterest<P>) -> Result<Feature> {
    let position = poi.position();
    let geometry = Geometry::new(Value::Point(vec![position.longitude(), position.latitude()]));

    let properties = match serde_json::to_value(poi.properties())? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(CartographyError::Serialization(format!(
                "Feature properties must be a JSON object, got: {}",
                other
            )));
        }
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Converts a feature collection to a GeoJSON `FeatureCollection`.
pub fn collection_to_geojson<P: Serialize>(
    collection: &FeatureCollection<P>,
) -> Result<geojson::FeatureCollection> {
    let features = collection
        .iter()
        .map(feature_to_geojson)
        .collect::<Result<Vec<_>>>()?;

    Ok(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Converts a feature collection to a GeoJSON string.
pub fn collection_to_geojson_string<P: Serialize>(
    collection: &FeatureCollection<P>,
) -> Result<String> {
    let geojson = collection_to_geojson(collection)?;

    serde_json::to_string(&geojson).map_err(|e| {
        CartographyError::Serialization(format!("Failed to serialize feature collection: {}", e))
    })
}

/// Parses a GeoJSON `FeatureCollection` of points.
///
/// Coordinates go through the usual range check, so a feature outside the
/// valid range is an `InvalidCoordinate` error rather than a silent clamp.
pub fn collection_from_geojson<P: DeserializeOwned>(geojson: &str) -> Result<FeatureCollection<P>> {
    let parsed: geojson::FeatureCollection = serde_json::from_str(geojson).map_err(|e| {
        CartographyError::Serialization(format!("Failed to parse GeoJSON: {}", e))
    })?;

    parsed
        .features
        .into_iter()
        .map(feature_from_geojson)
        .collect()
}

fn feature_from_geojson<P: DeserializeOwned>(feature: Feature) -> Result<PointOfInterest<P>> {
    let coords = match feature.geometry.map(|geometry| geometry.value) {
        Some(Value::Point(coords)) => coords,
        _ => {
            return Err(CartographyError::Serialization(
                "GeoJSON feature geometry is not a Point".to_string(),
            ));
        }
    };
    if coords.len() < 2 {
        return Err(CartographyError::Serialization(
            "Point must have at least 2 coordinates".to_string(),
        ));
    }

    let position = GeoPoint::from_lon_lat(coords[0], coords[1])?;
    let properties: P = serde_json::from_value(serde_json::Value::Object(
        feature.properties.unwrap_or_else(JsonObject::new),
    ))?;

    Ok(PointOfInterest::new(position, properties))
}

impl<P: Serialize> FeatureCollection<P> {
    /// Export as a GeoJSON `FeatureCollection`.
    pub fn to_geojson(&self) -> Result<geojson::FeatureCollection> {
        collection_to_geojson(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Feature as MarkerFeature, MarkerProperties, RegionAggregate, SiteRecord};

    fn region() -> MarkerFeature {
        MarkerFeature::new(
            GeoPoint::new(45.734377, 4.816864).unwrap(),
            RegionAggregate {
                region: "Auvergne-Rhône-Alpes".to_string(),
                count: 42,
                bounding_zoom: 8,
            }
            .into(),
        )
    }

    #[test]
    fn test_collection_export() {
        let collection = FeatureCollection::new(vec![region()]);
        let geojson = collection.to_geojson().unwrap();

        assert_eq!(geojson.features.len(), 1);
        let feature = &geojson.features[0];
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["markerType"], "region");
        assert_eq!(properties["count"], 42);

        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) => {
                // GeoJSON order is longitude first
                assert_eq!(coords[0], 4.816864);
                assert_eq!(coords[1], 45.734377);
            }
            other => panic!("expected a point geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_string_export_and_parse() {
        let site = SiteRecord {
            id: "s-1".to_string(),
            name: "France Services".to_string(),
            address: "2 place de la Mairie, 13001 Marseille".to_string(),
            structure_type: "Mairie".to_string(),
            is_labeled: true,
            phone: None,
            contacts: Vec::new(),
        };
        let collection = FeatureCollection::new(vec![
            region(),
            MarkerFeature::new(GeoPoint::new(43.305645, 5.380007).unwrap(), site.into()),
        ]);

        let json = collection_to_geojson_string(&collection).unwrap();
        assert!(json.contains("\"FeatureCollection\""));

        let parsed: FeatureCollection<MarkerProperties> = collection_from_geojson(&json).unwrap();
        assert_eq!(parsed, collection);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-1.01, 95.0]},
                "properties": {"markerType": "region", "region": "x", "count": 1, "boundingZoom": 8}
            }]
        }"#;
        let result: Result<FeatureCollection<MarkerProperties>> = collection_from_geojson(json);
        assert!(matches!(result, Err(CartographyError::InvalidCoordinate(_))));
    }

    #[test]
    fn test_non_object_properties() {
        let collection = FeatureCollection::new(vec![PointOfInterest::new(
            GeoPoint::new(0.0, 0.0).unwrap(),
            7_u32,
        )]);
        assert!(matches!(
            collection.to_geojson(),
            Err(CartographyError::Serialization(_))
        ));
    }
}
