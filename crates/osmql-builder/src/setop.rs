//! Set algebra over named result sets
//!
//! The three operation kinds form a closed set, so they live in one enum
//! dispatched by match. Serialization tags each operation with its kind
//! (`Union`, `Intersection`, `Difference`), which is also the persisted
//! discriminator.

use osmql_diagnostics::{OSM0003, OSM0004, OSM0005, QlError, Result};
use serde::{Deserialize, Serialize};

/// A set operation combining named sets into a new named set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SetOp {
    /// Everything in any input set
    Union { sets: Vec<String> },
    /// Ways present in every input set
    Intersection { sets: Vec<String> },
    /// Everything in the included set except the excluded sets
    #[serde(rename_all = "camelCase")]
    Difference {
        included_set: String,
        sets: Vec<String>,
    },
}

impl SetOp {
    /// Create a union of the given sets.
    pub fn union<I, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Union {
            sets: sets.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an intersection of the given sets.
    pub fn intersection<I, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Intersection {
            sets: sets.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a difference: `included` minus every set in `excluded`.
    pub fn difference<I, S>(included: impl Into<String>, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Difference {
            included_set: included.into(),
            sets: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// The operation kind name, as persisted.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Union { .. } => "Union",
            Self::Intersection { .. } => "Intersection",
            Self::Difference { .. } => "Difference",
        }
    }

    /// The plain input sets (the excluded list for a difference).
    pub fn sets(&self) -> &[String] {
        match self {
            Self::Union { sets } | Self::Intersection { sets } | Self::Difference { sets, .. } => {
                sets
            }
        }
    }

    /// The distinguished included set of a difference.
    pub fn included_set(&self) -> Option<&str> {
        match self {
            Self::Difference { included_set, .. } if !included_set.is_empty() => {
                Some(included_set)
            }
            _ => None,
        }
    }

    /// Every set name the operation references.
    pub fn referenced_sets(&self) -> impl Iterator<Item = &str> {
        self.included_set().into_iter().chain(self.sets().iter().map(String::as_str))
    }

    /// Add an input set (an excluded set for a difference).
    pub fn add_set(&mut self, name: impl Into<String>) {
        match self {
            Self::Union { sets } | Self::Intersection { sets } | Self::Difference { sets, .. } => {
                sets.push(name.into());
            }
        }
    }

    /// Drop every reference to `name`.
    ///
    /// For a difference, removing the included set clears it to empty
    /// rather than touching the excluded list; the cascade-removal
    /// protocol relies on this asymmetry to detect the operation as
    /// invalid afterwards.
    pub fn remove_set(&mut self, name: &str) {
        match self {
            Self::Union { sets } | Self::Intersection { sets } => sets.retain(|s| s != name),
            Self::Difference { included_set, sets } => {
                if included_set == name {
                    included_set.clear();
                } else {
                    sets.retain(|s| s != name);
                }
            }
        }
    }

    /// Whether the operation is semantically meaningful.
    ///
    /// Unions and intersections need at least two inputs (one input still
    /// compiles, with a warning); a difference needs its included set and
    /// at least one excluded set.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Union { sets } | Self::Intersection { sets } => sets.len() > 1,
            Self::Difference { included_set, sets } => {
                !included_set.is_empty() && !sets.is_empty()
            }
        }
    }

    /// Compile the operation to QL, including the `->.name;` assignment.
    pub fn to_ql(&self, name: &str) -> Result<String> {
        let expr = match self {
            Self::Union { sets } => {
                if sets.is_empty() {
                    return Err(QlError::structural(OSM0003, "Union without sets"));
                }
                if sets.len() == 1 {
                    log::warn!("compiling union '{}' with a single input set", name);
                }
                format!("(.{};)", sets.join(";."))
            }
            Self::Intersection { sets } => {
                if sets.is_empty() {
                    return Err(QlError::structural(OSM0004, "Intersection without sets"));
                }
                if sets.len() == 1 {
                    log::warn!("compiling intersection '{}' with a single input set", name);
                }
                format!("way.{}", sets.join("."))
            }
            Self::Difference { included_set, sets } => {
                if !self.is_valid() {
                    return Err(QlError::structural(
                        OSM0005,
                        "Difference without excluded sets nor included set",
                    ));
                }
                format!("(.{};- .{};)", included_set, sets.join(";- ."))
            }
        };
        Ok(format!("{}->.{};\n", expr, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_union_ql() {
        let op = SetOp::union(["a", "b"]);
        assert_eq!(op.to_ql("c").unwrap(), "(.a;.b;)->.c;\n");
    }

    #[test]
    fn test_union_three_inputs() {
        let op = SetOp::union(["a", "b", "d"]);
        assert_eq!(op.to_ql("e").unwrap(), "(.a;.b;.d;)->.e;\n");
    }

    #[test]
    fn test_union_without_sets_fails() {
        let op = SetOp::union(Vec::<String>::new());
        assert_eq!(op.to_ql("c").unwrap_err().code(), OSM0003);
    }

    #[test]
    fn test_single_input_union_compiles_but_is_invalid() {
        let op = SetOp::union(["a"]);
        assert!(!op.is_valid());
        assert_eq!(op.to_ql("c").unwrap(), "(.a;)->.c;\n");
    }

    #[test]
    fn test_intersection_ql() {
        let op = SetOp::intersection(["a", "b"]);
        assert_eq!(op.to_ql("c").unwrap(), "way.a.b->.c;\n");
    }

    #[test]
    fn test_intersection_without_sets_fails() {
        let op = SetOp::intersection(Vec::<String>::new());
        assert_eq!(op.to_ql("c").unwrap_err().code(), OSM0004);
    }

    #[test]
    fn test_difference_ql() {
        let op = SetOp::difference("a", ["b", "c"]);
        assert_eq!(op.to_ql("d").unwrap(), "(.a;- .b;- .c;)->.d;\n");
    }

    #[test]
    fn test_difference_requires_both_sides() {
        assert!(!SetOp::difference("", ["b"]).is_valid());
        assert!(!SetOp::difference("a", Vec::<String>::new()).is_valid());
        let op = SetOp::difference("", ["b"]);
        assert_eq!(op.to_ql("d").unwrap_err().code(), OSM0005);
    }

    #[test]
    fn test_difference_remove_asymmetry() {
        let mut op = SetOp::difference("a", ["b", "c"]);
        op.remove_set("a");
        // The included set clears to empty; the excluded list is untouched.
        assert_eq!(op.included_set(), None);
        assert_eq!(op.sets(), ["b", "c"]);
        assert!(!op.is_valid());

        let mut op = SetOp::difference("a", ["b", "c"]);
        op.remove_set("b");
        assert_eq!(op.included_set(), Some("a"));
        assert_eq!(op.sets(), ["c"]);
        assert!(op.is_valid());
    }

    #[test]
    fn test_referenced_sets() {
        let op = SetOp::difference("a", ["b", "c"]);
        let refs: Vec<&str> = op.referenced_sets().collect();
        assert_eq!(refs, ["a", "b", "c"]);
    }

    #[test]
    fn test_serde_discriminator() {
        let json = serde_json::to_value(SetOp::difference("a", ["b"])).unwrap();
        assert_eq!(json["type"], "Difference");
        assert_eq!(json["includedSet"], "a");
        assert_eq!(json["sets"][0], "b");

        let back: SetOp = serde_json::from_value(json).unwrap();
        assert_eq!(back, SetOp::difference("a", ["b"]));
    }

    #[test]
    fn test_union_add_and_remove() {
        let mut op = SetOp::union(["a", "b"]);
        op.add_set("c");
        op.remove_set("a");
        assert_eq!(op.sets(), ["b", "c"]);
    }
}
