use serde_json::{json, Value};

use super::{GeometryMode, NamedPoint};
use crate::utils::error::Result;

const CRS84: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

fn position(point: &NamedPoint) -> Value {
    json!([point.point.longitude(), point.point.latitude()])
}

/// FeatureCollection in CRS84 axis order (longitude first).
pub fn render_geojson(points: &[NamedPoint], name: &str, geometry: GeometryMode) -> Result<String> {
    let features: Vec<Value> = match geometry {
        GeometryMode::Polygon if points.len() >= 3 => {
            let ring: Vec<Value> = points.iter().chain(points.first()).map(position).collect();
            vec![json!({
                "type": "Feature",
                "properties": { "name": name },
                "geometry": { "type": "Polygon", "coordinates": [ring] }
            })]
        }
        _ => points
            .iter()
            .map(|point| {
                json!({
                    "type": "Feature",
                    "properties": { "name": point.name },
                    "geometry": { "type": "Point", "coordinates": position(point) }
                })
            })
            .collect(),
    };

    let collection = json!({
        "type": "FeatureCollection",
        "name": name,
        "crs": { "type": "name", "properties": { "name": CRS84 } },
        "features": features,
    });
    Ok(serde_json::to_string_pretty(&collection)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::GeodeticPoint;

    fn named(name: &str, lat: f64, lng: f64) -> NamedPoint {
        NamedPoint {
            name: name.to_string(),
            point: GeodeticPoint::new(lat, lng),
        }
    }

    #[test]
    fn test_point_features() {
        let points = vec![named("Plaza de Mayo", -34.6083, -58.3712)];
        let text = render_geojson(&points, "centro", GeometryMode::Points).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["crs"]["properties"]["name"], CRS84);
        let feature = &value["features"][0];
        assert_eq!(feature["properties"]["name"], "Plaza de Mayo");
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"], json!([-58.3712, -34.6083]));
    }

    #[test]
    fn test_polygon_feature_is_closed() {
        let points = vec![
            named("a", -34.0, -58.0),
            named("b", -34.1, -58.0),
            named("c", -34.1, -58.1),
        ];
        let text = render_geojson(&points, "lote", GeometryMode::Polygon).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        let ring = features[0]["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);
    }

    #[test]
    fn test_empty_collection() {
        let text = render_geojson(&[], "vacio", GeometryMode::Points).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["features"], json!([]));
    }
}
