//! Boundary ingestion from GeoJSON feature collections

use crate::error::{Error, Result};
use crate::vector::{AdminLevel, Boundary, BoundarySet};
use geojson::{Feature, GeoJson};
use std::path::Path;
use tracing::debug;

/// Which feature properties carry the unit code and display name
#[derive(Debug, Clone)]
pub struct BoundaryFields {
    /// Property holding the unit code, e.g. `ADM1_PCODE`
    pub code: String,
    /// Property holding the display name, e.g. `ADM1_EN`
    pub name: Option<String>,
}

impl BoundaryFields {
    /// Conventional HDX/OCHA field names for a level (`ADM{n}_PCODE`, `ADM{n}_EN`)
    pub fn pcode(level: AdminLevel) -> Self {
        let n = match level {
            AdminLevel::Adm0 => 0,
            AdminLevel::Adm1 => 1,
            AdminLevel::Adm2 => 2,
            AdminLevel::Adm3 => 3,
            AdminLevel::Location => {
                return Self {
                    code: "code".into(),
                    name: Some("name".into()),
                }
            }
        };
        Self {
            code: format!("ADM{n}_PCODE"),
            name: Some(format!("ADM{n}_EN")),
        }
    }
}

/// Read every polygonal feature of a GeoJSON file into a boundary set
pub fn read_boundaries<P: AsRef<Path>>(
    path: P,
    level: AdminLevel,
    fields: &BoundaryFields,
) -> Result<BoundarySet> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_boundaries(&text, level, fields)
}

/// Parse GeoJSON text (a FeatureCollection or a single Feature)
pub fn parse_boundaries(text: &str, level: AdminLevel, fields: &BoundaryFields) -> Result<BoundarySet> {
    let geojson: GeoJson = text.parse()?;
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(Error::Parse(
                "boundary file must contain features with a code property".into(),
            ))
        }
    };

    let mut set = BoundarySet::new();
    for feature in features {
        set.push(feature_to_boundary(feature, level, fields)?)?;
    }
    debug!("Loaded {} {} boundaries", set.len(), level);
    Ok(set)
}

fn feature_to_boundary(feature: Feature, level: AdminLevel, fields: &BoundaryFields) -> Result<Boundary> {
    let code = property_string(&feature, &fields.code)
        .ok_or_else(|| Error::Parse(format!("feature is missing property '{}'", fields.code)))?;
    let name = fields
        .name
        .as_deref()
        .and_then(|key| property_string(&feature, key));

    let geometry = feature
        .geometry
        .ok_or_else(|| Error::Parse(format!("feature '{code}' has no geometry")))?;
    let geometry = geo_types::Geometry::<f64>::try_from(geometry)?;

    let boundary = Boundary::from_geometry(code, level, geometry)?;
    Ok(match name {
        Some(name) => boundary.with_name(name),
        None => boundary,
    })
}

fn property_string(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_REGIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"ADM1_PCODE": "MMR013", "ADM1_EN": "Yangon"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"ADM1_PCODE": "MMR010", "ADM1_EN": "Mandalay"},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,0],[4,0],[4,2],[2,2],[2,0]]]]}
            }
        ]
    }"#;

    #[test]
    fn parses_pcode_fields() {
        let set = parse_boundaries(TWO_REGIONS, AdminLevel::Adm1, &BoundaryFields::pcode(AdminLevel::Adm1))
            .unwrap();
        assert_eq!(set.len(), 2);
        let yangon = set.find(AdminLevel::Adm1, "MMR013").unwrap();
        assert_eq!(yangon.name(), Some("Yangon"));
        assert!(yangon.covers_point(1.0, 1.0));
        assert!(set.find(AdminLevel::Adm1, "MMR010").unwrap().covers_point(3.0, 1.0));
    }

    #[test]
    fn missing_code_property_is_an_error() {
        let fields = BoundaryFields {
            code: "GID".into(),
            name: None,
        };
        assert!(parse_boundaries(TWO_REGIONS, AdminLevel::Adm1, &fields).is_err());
    }
}
