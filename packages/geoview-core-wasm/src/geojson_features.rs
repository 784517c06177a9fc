use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Geometry part of a GeoJSON feature. Coordinates stay as raw JSON so every
// geometry type can be carried through to the map untouched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureGeometry {
    pub r#type: String,
    #[serde(default)]
    pub coordinates: Value,
}

// A single geographic record. Immutable once loaded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Feature {
    #[serde(default = "feature_type")]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<FeatureGeometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

// An ordered set of features loaded from one dataset
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureCollection {
    pub r#type: String,
    pub features: Vec<Feature>,
}

impl Feature {
    /// Build a feature from a geometry and a property object. Mostly useful
    /// for fixtures; loaded data comes in through serde.
    pub fn new(geometry: Option<FeatureGeometry>, properties: Map<String, Value>) -> Self {
        Feature {
            r#type: feature_type(),
            id: None,
            geometry,
            properties: Some(properties),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }

    /// String property lookup. Empty strings count as missing.
    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.property(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Numeric property lookup. Accepts JSON numbers and numeric strings,
    /// since exported datasets are not consistent about either.
    pub fn number_property(&self, key: &str) -> Option<f64> {
        let number = match self.property(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    pub fn name(&self) -> Option<&str> {
        self.string_property("name")
    }

    pub fn place(&self) -> Option<&str> {
        self.string_property("place")
    }

    pub fn population(&self) -> Option<f64> {
        self.number_property("population")
    }

    pub fn area_sqkm(&self) -> Option<f64> {
        self.number_property("area_sqkm")
    }

    pub fn geometry_type(&self) -> Option<&str> {
        self.geometry.as_ref().map(|g| g.r#type.as_str())
    }

    pub fn to_geo(&self) -> Option<Geometry<f64>> {
        self.geometry.as_ref().and_then(FeatureGeometry::to_geo)
    }
}

impl FeatureGeometry {
    pub fn new(r#type: &str, coordinates: Value) -> Self {
        FeatureGeometry {
            r#type: r#type.to_string(),
            coordinates,
        }
    }

    // Convert the raw coordinates into geo-types. Returns None for malformed
    // coordinates or geometry types we do not draw.
    pub fn to_geo(&self) -> Option<Geometry<f64>> {
        let coords = &self.coordinates;
        match self.r#type.as_str() {
            "Point" => position(coords).map(|c| Geometry::Point(Point(c))),
            "MultiPoint" => positions(coords)
                .map(|cs| Geometry::MultiPoint(MultiPoint(cs.into_iter().map(Point).collect()))),
            "LineString" => positions(coords).map(|cs| Geometry::LineString(LineString::new(cs))),
            "MultiLineString" => {
                rings(coords).map(|lines| Geometry::MultiLineString(MultiLineString::new(lines)))
            }
            "Polygon" => polygon(coords).map(Geometry::Polygon),
            "MultiPolygon" => coords
                .as_array()?
                .iter()
                .map(polygon)
                .collect::<Option<Vec<_>>>()
                .map(|polys| Geometry::MultiPolygon(MultiPolygon::new(polys))),
            _ => None,
        }
    }
}

fn position(value: &Value) -> Option<Coord<f64>> {
    let pair = value.as_array()?;
    Some(Coord {
        x: pair.first()?.as_f64()?,
        y: pair.get(1)?.as_f64()?,
    })
}

fn positions(value: &Value) -> Option<Vec<Coord<f64>>> {
    value.as_array()?.iter().map(position).collect()
}

fn rings(value: &Value) -> Option<Vec<LineString<f64>>> {
    value
        .as_array()?
        .iter()
        .map(|ring| positions(ring).map(LineString::new))
        .collect()
}

fn polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = rings(value)?.into_iter();
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection {
            r#type: "FeatureCollection".to_string(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Feature {
        serde_json::from_value(value).expect("valid feature")
    }

    #[test]
    fn reads_properties_with_fallbacks() {
        let feature = parse(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [32.53, 15.59] },
            "properties": { "name": "Khartoum", "place": "city", "population": "639598", "area_sqkm": "" }
        }));

        assert_eq!(feature.name(), Some("Khartoum"));
        assert_eq!(feature.place(), Some("city"));
        assert_eq!(feature.population(), Some(639598.0));
        assert_eq!(feature.area_sqkm(), None);
        assert_eq!(feature.string_property("adm1_name"), None);
    }

    #[test]
    fn tolerates_null_properties_and_geometry() {
        let feature = parse(json!({ "type": "Feature", "geometry": null, "properties": null }));
        assert_eq!(feature.name(), None);
        assert_eq!(feature.geometry_type(), None);
        assert!(feature.to_geo().is_none());
    }

    #[test]
    fn empty_name_counts_as_missing() {
        let feature = parse(json!({ "type": "Feature", "properties": { "name": "" } }));
        assert_eq!(feature.name(), None);
    }

    #[test]
    fn converts_polygons_to_geo_types() {
        let geometry = FeatureGeometry::new(
            "Polygon",
            json!([[[30.0, 10.0], [31.0, 10.0], [31.0, 11.0], [30.0, 10.0]]]),
        );
        match geometry.to_geo() {
            Some(Geometry::Polygon(poly)) => {
                assert_eq!(poly.exterior().0.len(), 4);
                assert!(poly.interiors().is_empty());
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn malformed_coordinates_yield_none() {
        let geometry = FeatureGeometry::new("Point", json!(["east", 12.0]));
        assert!(geometry.to_geo().is_none());

        let unknown = FeatureGeometry::new("Circle", json!([1.0, 2.0]));
        assert!(unknown.to_geo().is_none());
    }
}
