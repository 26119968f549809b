//! Administrative boundaries used for masking and aggregation

use crate::error::{Error, Result};
use geo::{BoundingRect, Intersects, Point, Rect};
use geo_types::{Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative level a boundary belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    /// National outline
    Adm0,
    /// First-order regions (states, provinces)
    Adm1,
    Adm2,
    /// Townships and similar local units
    Adm3,
    /// Named location footprint (a city, an industrial zone)
    Location,
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdminLevel::Adm0 => "adm0",
            AdminLevel::Adm1 => "adm1",
            AdminLevel::Adm2 => "adm2",
            AdminLevel::Adm3 => "adm3",
            AdminLevel::Location => "location",
        };
        f.write_str(s)
    }
}

impl FromStr for AdminLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "adm0" | "0" | "national" | "country" => Ok(AdminLevel::Adm0),
            "adm1" | "1" | "regional" | "region" | "state" => Ok(AdminLevel::Adm1),
            "adm2" | "2" | "district" => Ok(AdminLevel::Adm2),
            "adm3" | "3" | "township" => Ok(AdminLevel::Adm3),
            "location" | "loc" | "city" => Ok(AdminLevel::Location),
            other => Err(Error::InvalidParameter {
                name: "level",
                value: other.to_string(),
                reason: "expected adm0, adm1, adm2, adm3 or location".into(),
            }),
        }
    }
}

/// A polygonal spatial unit identified by its code (e.g. a PCODE)
#[derive(Debug, Clone)]
pub struct Boundary {
    code: String,
    name: Option<String>,
    level: AdminLevel,
    geometry: MultiPolygon<f64>,
    envelope: Option<Rect<f64>>,
}

impl Boundary {
    pub fn new(code: impl Into<String>, level: AdminLevel, geometry: MultiPolygon<f64>) -> Self {
        let envelope = geometry.bounding_rect();
        Self {
            code: code.into(),
            name: None,
            level,
            geometry,
            envelope,
        }
    }

    /// Build from any polygonal geometry; other geometry kinds are rejected
    pub fn from_geometry(
        code: impl Into<String>,
        level: AdminLevel,
        geometry: Geometry<f64>,
    ) -> Result<Self> {
        let code = code.into();
        let multi = match geometry {
            Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            Geometry::MultiPolygon(mp) => mp,
            Geometry::Rect(r) => MultiPolygon::new(vec![r.to_polygon()]),
            _ => {
                return Err(Error::InvalidParameter {
                    name: "geometry",
                    value: code,
                    reason: "boundary geometry must be a polygon or multipolygon".into(),
                })
            }
        };
        Ok(Self::new(code, level, multi))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn level(&self) -> AdminLevel {
        self.level
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Bounding box (min_x, min_y, max_x, max_y); `None` for empty geometry
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.envelope
            .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y))
    }

    /// Whether the bounding box overlaps the given extent
    pub fn intersects_extent(&self, extent: (f64, f64, f64, f64)) -> bool {
        let (min_x, min_y, max_x, max_y) = extent;
        self.bounds().is_some_and(|(bx0, by0, bx1, by1)| {
            bx0 <= max_x && bx1 >= min_x && by0 <= max_y && by1 >= min_y
        })
    }

    /// Point-in-polygon test; points on the boundary line count as inside.
    ///
    /// Neighbouring units both cover a shared edge, so callers assigning a
    /// point to exactly one unit must break the tie themselves.
    pub fn covers_point(&self, x: f64, y: f64) -> bool {
        let inside_envelope = self.envelope.is_some_and(|r| {
            x >= r.min().x && x <= r.max().x && y >= r.min().y && y <= r.max().y
        });
        inside_envelope && self.geometry.intersects(&Point::new(x, y))
    }
}

/// Boundaries of one or more administrative levels
#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    boundaries: Vec<Boundary>,
}

impl BoundarySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a boundary; codes must be unique within a level
    pub fn push(&mut self, boundary: Boundary) -> Result<()> {
        if self.find(boundary.level, &boundary.code).is_some() {
            return Err(Error::InvalidParameter {
                name: "boundary",
                value: boundary.code,
                reason: format!("duplicate code at level {}", boundary.level),
            });
        }
        self.boundaries.push(boundary);
        Ok(())
    }

    pub fn find(&self, level: AdminLevel, code: &str) -> Option<&Boundary> {
        self.boundaries
            .iter()
            .find(|b| b.level == level && b.code == code)
    }

    /// First boundary with this code at any level
    pub fn find_code(&self, code: &str) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.code == code)
    }

    /// Boundaries of one level, in insertion order
    pub fn at_level(&self, level: AdminLevel) -> Vec<&Boundary> {
        self.boundaries.iter().filter(|b| b.level == level).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Boundary> {
        self.boundaries.iter()
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

impl FromIterator<Boundary> for BoundarySet {
    /// Collects without the duplicate check of [`BoundarySet::push`]
    fn from_iter<I: IntoIterator<Item = Boundary>>(iter: I) -> Self {
        Self {
            boundaries: iter.into_iter().collect(),
        }
    }
}
