//! Core identifiers, attribute values and intervals

use std::fmt;
use std::ops::Bound;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Node identifier
pub type NodeId = u64;

/// Edge identifier (properties and relationships share one id space)
pub type EdgeId = u64;

/// Edge type identifier
pub type ETypeId = u32;

/// Transaction identifier
pub type TxId = u64;

// ============================================================================
// Attribute Values
// ============================================================================

/// Value carried by a property edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AttrValue {
  Bool(bool),
  Int(i64),
  Float(OrderedFloat<f64>),
  String(String),
}

/// Kind of an attribute value, used as a property type's declared data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrKind {
  Bool,
  Int,
  Float,
  String,
}

impl AttrValue {
  pub fn kind(&self) -> AttrKind {
    match self {
      AttrValue::Bool(_) => AttrKind::Bool,
      AttrValue::Int(_) => AttrKind::Int,
      AttrValue::Float(_) => AttrKind::Float,
      AttrValue::String(_) => AttrKind::String,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      AttrValue::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      AttrValue::Int(v) => Some(*v),
      _ => None,
    }
  }
}

impl fmt::Display for AttrValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AttrValue::Bool(v) => write!(f, "{v}"),
      AttrValue::Int(v) => write!(f, "{v}"),
      AttrValue::Float(v) => write!(f, "{}", v.0),
      AttrValue::String(v) => write!(f, "{v:?}"),
    }
  }
}

impl From<bool> for AttrValue {
  fn from(value: bool) -> Self {
    AttrValue::Bool(value)
  }
}

impl From<i64> for AttrValue {
  fn from(value: i64) -> Self {
    AttrValue::Int(value)
  }
}

impl From<i32> for AttrValue {
  fn from(value: i32) -> Self {
    AttrValue::Int(value as i64)
  }
}

impl From<f64> for AttrValue {
  fn from(value: f64) -> Self {
    AttrValue::Float(OrderedFloat(value))
  }
}

impl From<&str> for AttrValue {
  fn from(value: &str) -> Self {
    AttrValue::String(value.to_string())
  }
}

impl From<String> for AttrValue {
  fn from(value: String) -> Self {
    AttrValue::String(value)
  }
}

// ============================================================================
// Intervals
// ============================================================================

/// Predicate over attribute values used by attribute lookups
///
/// A range only matches values of the same kind as its bounds: `Int(1)..`
/// never matches a string, even though the enum ordering places strings after
/// integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval {
  Point(AttrValue),
  Range {
    start: Bound<AttrValue>,
    end: Bound<AttrValue>,
  },
}

impl Interval {
  pub fn point(value: impl Into<AttrValue>) -> Self {
    Interval::Point(value.into())
  }

  /// Half-open range `[start, end)`
  pub fn between(start: impl Into<AttrValue>, end: impl Into<AttrValue>) -> Self {
    Interval::Range {
      start: Bound::Included(start.into()),
      end: Bound::Excluded(end.into()),
    }
  }

  /// Closed range `[start, end]`
  pub fn closed(start: impl Into<AttrValue>, end: impl Into<AttrValue>) -> Self {
    Interval::Range {
      start: Bound::Included(start.into()),
      end: Bound::Included(end.into()),
    }
  }

  pub fn at_least(start: impl Into<AttrValue>) -> Self {
    Interval::Range {
      start: Bound::Included(start.into()),
      end: Bound::Unbounded,
    }
  }

  pub fn less_than(end: impl Into<AttrValue>) -> Self {
    Interval::Range {
      start: Bound::Unbounded,
      end: Bound::Excluded(end.into()),
    }
  }

  pub fn is_point(&self) -> bool {
    matches!(self, Interval::Point(_))
  }

  /// The point value, or the inclusive/exclusive start of a bounded range
  pub fn start_point(&self) -> Option<&AttrValue> {
    match self {
      Interval::Point(v) => Some(v),
      Interval::Range { start, .. } => match start {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
      },
    }
  }

  /// Interval membership test
  pub fn contains(&self, value: &AttrValue) -> bool {
    match self {
      Interval::Point(v) => v == value,
      Interval::Range { start, end } => {
        let after_start = match start {
          Bound::Included(s) => s.kind() == value.kind() && value >= s,
          Bound::Excluded(s) => s.kind() == value.kind() && value > s,
          Bound::Unbounded => true,
        };
        let before_end = match end {
          Bound::Included(e) => e.kind() == value.kind() && value <= e,
          Bound::Excluded(e) => e.kind() == value.kind() && value < e,
          Bound::Unbounded => true,
        };
        after_start && before_end
      }
    }
  }

  /// True if no value can satisfy the interval
  pub fn is_empty(&self) -> bool {
    let Interval::Range { start, end } = self else {
      return false;
    };
    match (start, end) {
      (Bound::Included(s), Bound::Included(e)) => s.kind() != e.kind() || s > e,
      (Bound::Included(s), Bound::Excluded(e))
      | (Bound::Excluded(s), Bound::Included(e))
      | (Bound::Excluded(s), Bound::Excluded(e)) => s.kind() != e.kind() || s >= e,
      _ => false,
    }
  }

  /// Bounds borrowed for ordered-map range scans
  pub fn bounds(&self) -> (Bound<&AttrValue>, Bound<&AttrValue>) {
    match self {
      Interval::Point(v) => (Bound::Included(v), Bound::Included(v)),
      Interval::Range { start, end } => (start.as_ref(), end.as_ref()),
    }
  }
}

impl From<AttrValue> for Interval {
  fn from(value: AttrValue) -> Self {
    Interval::Point(value)
  }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_point_interval() {
    let interval = Interval::point("x");
    assert!(interval.is_point());
    assert_eq!(interval.start_point(), Some(&AttrValue::from("x")));
    assert!(interval.contains(&"x".into()));
    assert!(!interval.contains(&"y".into()));
  }

  #[test]
  fn test_half_open_range() {
    let interval = Interval::between(10, 20);
    assert!(!interval.is_point());
    assert!(interval.contains(&10.into()));
    assert!(interval.contains(&19.into()));
    assert!(!interval.contains(&20.into()));
    assert!(!interval.contains(&9.into()));
  }

  #[test]
  fn test_range_ignores_other_kinds() {
    let interval = Interval::at_least(0);
    assert!(interval.contains(&5.into()));
    assert!(!interval.contains(&"zzz".into()));
    assert!(!interval.contains(&1.5.into()));
  }

  #[test]
  fn test_empty_ranges() {
    assert!(Interval::between(5, 5).is_empty());
    assert!(Interval::closed(6, 5).is_empty());
    assert!(Interval::closed(1, "a").is_empty());
    assert!(!Interval::closed(5, 5).is_empty());
    assert!(!Interval::at_least(5).is_empty());
    assert!(!Interval::point(1).is_empty());
  }

  #[test]
  fn test_attr_value_display() {
    assert_eq!(AttrValue::from(30).to_string(), "30");
    assert_eq!(AttrValue::from("x").to_string(), "\"x\"");
    assert_eq!(AttrValue::from(true).to_string(), "true");
  }
}
