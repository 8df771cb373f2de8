//! Cartesian-product expansion of dimension ranges into design points.
//!
//! Points are ordered lexicographically by dimension declaration order: the
//! last dimension varies fastest. A point's grid index is the mixed-radix
//! number whose digits are the per-dimension value offsets.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::contract::{validate_dimensions, DimensionSpec};
use crate::error::SweepError;

/// One concrete design: a value for every dimension, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterPoint {
    names: Arc<[String]>,
    values: Vec<i64>,
}

impl ParameterPoint {
    pub(crate) fn new(names: Arc<[String]>, values: Vec<i64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Builds a standalone point from `(name, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let (names, values): (Vec<String>, Vec<i64>) = pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        Self::new(names.into(), values)
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|slot| self.values[slot])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (slot, (name, value)) in self.iter().enumerate() {
            if slot > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl Serialize for ParameterPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// The ordered, finite set of all design points in a sweep.
#[derive(Debug, Clone)]
pub struct Grid {
    names: Arc<[String]>,
    points: Vec<ParameterPoint>,
}

impl Grid {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dimension_names(&self) -> &[String] {
        &self.names
    }

    pub fn points(&self) -> &[ParameterPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&ParameterPoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ParameterPoint)> + '_ {
        self.points.iter().enumerate()
    }
}

/// Expands dimension ranges into the full grid, or reports a configuration
/// error before any point is produced.
pub fn generate(dimensions: &[DimensionSpec]) -> Result<Grid, SweepError> {
    let total_points = validate_dimensions(dimensions)?;
    let names: Arc<[String]> = dimensions
        .iter()
        .map(|dimension| dimension.name.trim().to_string())
        .collect();
    let axes: Vec<Vec<i64>> = dimensions.iter().map(DimensionSpec::values).collect();
    let points = (0..total_points)
        .map(|index| decode_point(&names, &axes, index))
        .collect();

    Ok(Grid { names, points })
}

fn decode_point(names: &Arc<[String]>, axes: &[Vec<i64>], index: usize) -> ParameterPoint {
    let mut values = vec![0; axes.len()];
    let mut remainder = index;
    for (slot, axis) in axes.iter().enumerate().rev() {
        let radix = axis.len();
        values[slot] = axis[remainder % radix];
        remainder /= radix;
    }
    ParameterPoint::new(Arc::clone(names), values)
}
