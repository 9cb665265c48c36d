//! Element-selection requests
//!
//! A [`Request`] selects map elements by type, tag filters and spatial
//! constraints, and compiles to a single QL statement (without the
//! `->.name;` suffix, which the owning query appends).

use crate::Filter;
use osmql_diagnostics::{OSM0001, OSM0100, OSM0104, QlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The OSM element type a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "node")]
    Nodes,
    #[serde(rename = "way")]
    Ways,
    #[serde(rename = "rel")]
    Relations,
    #[serde(rename = "area")]
    Area,
    #[serde(rename = "nw")]
    Nw,
    #[serde(rename = "nr")]
    Nr,
    #[serde(rename = "wr")]
    Wr,
    #[serde(rename = "nwr")]
    Nwr,
}

impl ElementType {
    /// Derive the type from the node/way/relation checkboxes, or `Area`
    /// exclusively. Selecting nothing is an error.
    pub fn from_flags(node: bool, way: bool, relation: bool, area: bool) -> Result<Self> {
        if area {
            return Ok(Self::Area);
        }
        let bits = (node as u8) | ((way as u8) << 1) | ((relation as u8) << 2);
        match bits {
            1 => Ok(Self::Nodes),
            2 => Ok(Self::Ways),
            3 => Ok(Self::Nw),
            4 => Ok(Self::Relations),
            5 => Ok(Self::Nr),
            6 => Ok(Self::Wr),
            7 => Ok(Self::Nwr),
            _ => Err(QlError::model(OSM0100, "No element type selected")),
        }
    }

    /// The (node, way, relation, area) flag combination for this type.
    pub const fn flags(&self) -> (bool, bool, bool, bool) {
        match self {
            Self::Nodes => (true, false, false, false),
            Self::Ways => (false, true, false, false),
            Self::Relations => (false, false, true, false),
            Self::Area => (false, false, false, true),
            Self::Nw => (true, true, false, false),
            Self::Nr => (true, false, true, false),
            Self::Wr => (false, true, true, false),
            Self::Nwr => (true, true, true, false),
        }
    }

    /// The QL type token.
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Nodes => "node",
            Self::Ways => "way",
            Self::Relations => "rel",
            Self::Area => "area",
            Self::Nw => "nw",
            Self::Nr => "nr",
            Self::Wr => "wr",
            Self::Nwr => "nwr",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// How a request widens its base selection geometrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Surround {
    /// No widening
    #[default]
    None,
    /// Elements within `around_radius` meters of the base selection
    Around,
    /// Elements sharing an endpoint node with a selected way
    Adjacent,
}

/// Default around radius in meters.
pub const DEFAULT_AROUND_RADIUS: u32 = 100;

/// One element-selection clause of a query.
///
/// A request with no filters, no polygon, no ids and no area reference is
/// transiently allowed (the user may still be editing) but cannot compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    element_type: ElementType,
    filters: Vec<Filter>,
    surround: Surround,
    around_radius: u32,
    polygon: Vec<[f64; 2]>,
    ids: Vec<u64>,
    area_id: Option<i64>,
    location_name: String,
}

impl Request {
    /// Create a request with no filters or spatial data.
    pub fn new(element_type: ElementType, surround: Surround) -> Self {
        Self {
            element_type,
            filters: Vec::new(),
            surround,
            around_radius: DEFAULT_AROUND_RADIUS,
            polygon: Vec::new(),
            ids: Vec::new(),
            area_id: None,
            location_name: String::new(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn set_element_type(&mut self, element_type: ElementType) {
        self.element_type = element_type;
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Append a filter; order affects the generated text but not its
    /// semantics.
    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn surround(&self) -> Surround {
        self.surround
    }

    pub fn set_surround(&mut self, surround: Surround) {
        self.surround = surround;
    }

    pub fn around_radius(&self) -> u32 {
        self.around_radius
    }

    /// Set the around radius in meters. Zero is rejected.
    pub fn set_around_radius(&mut self, radius: u32) -> Result<()> {
        if radius == 0 {
            return Err(QlError::model(OSM0104, "Invalid around radius"));
        }
        self.around_radius = radius;
        Ok(())
    }

    pub fn polygon(&self) -> &[[f64; 2]] {
        &self.polygon
    }

    /// Replace the bounding polygon ([lat, lng] pairs).
    pub fn set_polygon(&mut self, polygon: Vec<[f64; 2]>) {
        self.polygon = polygon;
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Restrict the selection to explicit element ids.
    pub fn set_ids(&mut self, ids: Vec<u64>) {
        self.ids = ids;
    }

    pub fn area_id(&self) -> Option<i64> {
        self.area_id
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Scope the request to a named area. The id comes from an external
    /// geocoding collaborator; the name is kept only for persistence.
    pub fn set_area(&mut self, area_id: i64, location_name: impl Into<String>) {
        self.area_id = Some(area_id);
        self.location_name = location_name.into();
    }

    pub fn clear_area(&mut self) {
        self.area_id = None;
        self.location_name.clear();
    }

    /// Whether the request selects nothing at all.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.polygon.is_empty()
            && self.ids.is_empty()
            && self.area_id.is_none()
    }

    /// Compile the request to a QL statement (no trailing `->.name;`).
    pub fn to_ql(&self) -> Result<String> {
        if self.is_empty() {
            return Err(QlError::structural(OSM0001, "Empty request"));
        }

        let token = self.element_type.token();
        let mut ql = if self.surround != Surround::None {
            format!("({}", token)
        } else {
            token.to_string()
        };

        if let Some(area_id) = self.area_id {
            ql.push_str(&format!("(area:{})", area_id));
        }

        if !self.ids.is_empty() {
            let ids: Vec<String> = self.ids.iter().map(u64::to_string).collect();
            ql.push_str(&format!("(id:{})", ids.join(", ")));
        }

        if !self.polygon.is_empty() {
            let coords: Vec<String> = self
                .polygon
                .iter()
                .flat_map(|point| point.iter())
                .map(f64::to_string)
                .collect();
            ql.push_str(&format!("(poly:\"{}\")", coords.join(" ")));
        }

        for filter in &self.filters {
            ql.push_str(&filter.to_ql());
        }

        match self.surround {
            Surround::Around => {
                ql.push_str(&format!(";{}(around:{});)", token, self.around_radius));
            }
            Surround::Adjacent => ql.push_str(";>;way(bn);>;)"),
            Surround::None => {}
        }
        Ok(ql)
    }
}
