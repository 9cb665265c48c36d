//! Tag filters
//!
//! A [`Filter`] is a single tag-matching predicate that compiles to one or
//! more Overpass QL bracket clauses (or an `(if: ...)` clause for numeric
//! comparisons). Filters are immutable values; validation happens in the
//! constructors, never in the compiler.

use osmql_diagnostics::{OSM0101, OSM0102, QlError, Result};
use serde::{Deserialize, Serialize};

/// The comparison kind of a tag filter.
///
/// Each kind statically fixes which filter fields apply: whether the key or
/// value is a list, whether the exact/negate flags make sense, and whether
/// the value is compared numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    /// Tag value equals (or regex-matches) the given value
    Equal,
    /// Numeric tag value is at most the given value
    AtMost,
    /// Numeric tag value is at least the given value
    AtLeast,
    /// Tag value matches every word in the list
    ContainAll,
    /// Tag value matches one of the words in the list
    IsOneOf,
    /// The key is present
    HasKey,
    /// At least one of the keys is present
    HasOneKey,
    /// The key is absent
    HasNotKey,
}

impl Comparison {
    /// Whether the filter key is a list of keys.
    pub const fn multiple_keys(&self) -> bool {
        matches!(self, Self::HasOneKey)
    }

    /// Whether the filter value is a list of words.
    pub const fn multiple_values(&self) -> bool {
        matches!(self, Self::ContainAll | Self::IsOneOf)
    }

    /// Whether the exact-value flag applies.
    pub const fn supports_exact(&self) -> bool {
        matches!(
            self,
            Self::Equal | Self::ContainAll | Self::IsOneOf | Self::HasKey | Self::HasOneKey
        )
    }

    /// Whether the negate flag applies.
    pub const fn supports_negate(&self) -> bool {
        matches!(
            self,
            Self::Equal | Self::ContainAll | Self::IsOneOf | Self::AtMost | Self::AtLeast
        )
    }

    /// Whether the value is compared numerically.
    pub const fn numeric_value(&self) -> bool {
        matches!(self, Self::AtMost | Self::AtLeast)
    }

    /// Whether a non-empty value is required.
    pub const fn requires_value(&self) -> bool {
        matches!(
            self,
            Self::AtMost | Self::AtLeast | Self::ContainAll | Self::IsOneOf
        )
    }
}

/// A single tag-matching predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    keys: Vec<String>,
    comparison: Comparison,
    values: Vec<String>,
    negated: bool,
    exact_value: bool,
}

impl Filter {
    /// Build a filter from raw parts, validating key/value arity for the
    /// comparison kind. All named constructors and deserialization funnel
    /// through here.
    pub fn from_parts(
        keys: Vec<String>,
        comparison: Comparison,
        values: Vec<String>,
        negated: bool,
        exact_value: bool,
    ) -> Result<Self> {
        if keys.is_empty() || keys.iter().any(String::is_empty) {
            return Err(QlError::model(OSM0101, "Empty filter key"));
        }
        if !comparison.multiple_keys() && keys.len() > 1 {
            return Err(QlError::model(OSM0101, "Empty filter key")
                .with_context("this comparison takes a single key"));
        }
        // An empty Equal value is legal and compiles to a bare key test.
        let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if comparison.requires_value() && values.is_empty() {
            return Err(QlError::model(OSM0102, "Empty filter value"));
        }
        if !comparison.multiple_values() && values.len() > 1 {
            return Err(QlError::model(OSM0102, "Empty filter value")
                .with_context("this comparison takes a single value"));
        }
        Ok(Self {
            keys,
            comparison,
            values,
            negated: negated && comparison.supports_negate(),
            exact_value: exact_value && comparison.supports_exact(),
        })
    }

    /// Tag value equals (exact) or regex-matches (non-exact) `value`.
    ///
    /// An empty value compiles to a bare key-presence bracket.
    pub fn equal(
        key: impl Into<String>,
        value: impl Into<String>,
        negated: bool,
        exact_value: bool,
    ) -> Result<Self> {
        Self::from_parts(
            vec![key.into()],
            Comparison::Equal,
            vec![value.into()],
            negated,
            exact_value,
        )
    }

    /// Numeric tag value is at most `value` (at least, when negated).
    ///
    /// Caveat: the Overpass API rejects a request whose *only* filter is
    /// this numeric form; pair it with at least one plain tag filter.
    /// [`crate::Query::validate`] flags offending requests.
    pub fn at_most(
        key: impl Into<String>,
        value: impl Into<String>,
        negated: bool,
    ) -> Result<Self> {
        Self::from_parts(
            vec![key.into()],
            Comparison::AtMost,
            vec![value.into()],
            negated,
            false,
        )
    }

    /// Numeric tag value is at least `value` (at most, when negated).
    ///
    /// Same single-filter caveat as [`Filter::at_most`].
    pub fn at_least(
        key: impl Into<String>,
        value: impl Into<String>,
        negated: bool,
    ) -> Result<Self> {
        Self::from_parts(
            vec![key.into()],
            Comparison::AtLeast,
            vec![value.into()],
            negated,
            false,
        )
    }

    /// Tag value matches every word in `words`.
    pub fn contain_all(
        key: impl Into<String>,
        words: Vec<String>,
        negated: bool,
        exact_value: bool,
    ) -> Result<Self> {
        Self::from_parts(
            vec![key.into()],
            Comparison::ContainAll,
            words,
            negated,
            exact_value,
        )
    }

    /// Tag value matches one of the words in `words`.
    pub fn is_one_of(
        key: impl Into<String>,
        words: Vec<String>,
        negated: bool,
        exact_value: bool,
    ) -> Result<Self> {
        Self::from_parts(
            vec![key.into()],
            Comparison::IsOneOf,
            words,
            negated,
            exact_value,
        )
    }

    /// The key is present. Non-exact matches the key itself as a
    /// case-insensitive regex.
    pub fn has_key(key: impl Into<String>, exact_value: bool) -> Result<Self> {
        Self::from_parts(
            vec![key.into()],
            Comparison::HasKey,
            Vec::new(),
            false,
            exact_value,
        )
    }

    /// The key is absent.
    pub fn has_not_key(key: impl Into<String>) -> Result<Self> {
        Self::from_parts(
            vec![key.into()],
            Comparison::HasNotKey,
            Vec::new(),
            false,
            false,
        )
    }

    /// At least one of `keys` is present.
    pub fn has_one_key(keys: Vec<String>, exact_value: bool) -> Result<Self> {
        Self::from_parts(keys, Comparison::HasOneKey, Vec::new(), false, exact_value)
    }

    /// The filter keys (a single element except for `HasOneKey`).
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The first (for most kinds, only) key.
    pub fn key(&self) -> &str {
        &self.keys[0]
    }

    /// The comparison kind.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// The filter values (zero, one or several per kind).
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether the predicate is negated.
    pub fn negated(&self) -> bool {
        self.negated
    }

    /// Whether the value matches literally rather than as a regex.
    pub fn exact_value(&self) -> bool {
        self.exact_value
    }

    /// A word, regex-escaped when the filter wants literal matching.
    fn word(&self, value: &str) -> String {
        if self.exact_value {
            regex::escape(value)
        } else {
            value.to_string()
        }
    }

    /// Compile the filter to its QL fragment.
    pub fn to_ql(&self) -> String {
        let negation = if self.negated { "!" } else { "" };
        let key = quote(self.key());
        match self.comparison {
            Comparison::Equal => match self.values.first() {
                Some(value) => {
                    let op = if self.exact_value { "=" } else { "~" };
                    format!("[\"{}\"{}{}\"{}\"]", key, negation, op, quote(value))
                }
                None => format!("[{}\"{}\"]", negation, key),
            },
            Comparison::ContainAll => self
                .values
                .iter()
                .map(|w| format!("[\"{}\"{}~\"{}\"]", key, negation, quote(&self.word(w))))
                .collect(),
            Comparison::IsOneOf => {
                let words: Vec<String> = self.values.iter().map(|w| self.word(w)).collect();
                format!(
                    "[\"{}\"{}~\"^({})$\"]",
                    key,
                    negation,
                    quote(&words.join("|"))
                )
            }
            Comparison::HasKey => {
                if self.exact_value {
                    format!("[\"{}\"]", key)
                } else {
                    format!("[~\"{}\"~\".*\",i]", key)
                }
            }
            Comparison::HasNotKey => format!("[!\"{}\"]", key),
            Comparison::HasOneKey => {
                let keys: Vec<String> = self.keys.iter().map(|k| self.word(k)).collect();
                format!("[~\"^({})$\"~\".*\"]", quote(&keys.join("|")))
            }
            Comparison::AtMost | Comparison::AtLeast => {
                let op = match (self.comparison, self.negated) {
                    (Comparison::AtMost, false) => "<=",
                    (Comparison::AtMost, true) => ">",
                    (Comparison::AtLeast, false) => ">=",
                    (Comparison::AtLeast, true) => "<",
                    _ => unreachable!(),
                };
                format!(
                    "(if: is_number(t[\"{0}\"]) && number(t[\"{0}\"]) {1} \"{2}\")",
                    key,
                    op,
                    quote(&self.values[0])
                )
            }
        }
    }
}

/// Escape embedded backslashes and double quotes so keys and values cannot
/// break out of the QL string they are emitted into. Backslashes first, so
/// the quote escapes are not doubled afterwards.
pub(crate) fn quote(text: &str) -> String {
    if text.contains(['"', '\\']) {
        text.replace('\\', "\\\\").replace('"', "\\\"")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_equal_exact() {
        let f = Filter::equal("highway", "residential", false, true).unwrap();
        assert_eq!(f.to_ql(), "[\"highway\"=\"residential\"]");
    }

    #[test]
    fn test_equal_regex_negated() {
        let f = Filter::equal("name", "^Main", true, false).unwrap();
        assert_eq!(f.to_ql(), "[\"name\"!~\"^Main\"]");
    }

    #[rstest]
    #[case(false, "[\"highway\"]")]
    #[case(true, "[!\"highway\"]")]
    fn test_equal_empty_value(#[case] negated: bool, #[case] expected: &str) {
        let f = Filter::equal("highway", "", negated, true).unwrap();
        assert_eq!(f.to_ql(), expected);
    }

    #[test]
    fn test_at_most() {
        let f = Filter::at_most("maxspeed", "120", false).unwrap();
        assert_eq!(
            f.to_ql(),
            "(if: is_number(t[\"maxspeed\"]) && number(t[\"maxspeed\"]) <= \"120\")"
        );
    }

    #[rstest]
    #[case(Comparison::AtMost, true, ">")]
    #[case(Comparison::AtLeast, false, ">=")]
    #[case(Comparison::AtLeast, true, "<")]
    fn test_numeric_operator_selection(
        #[case] comparison: Comparison,
        #[case] negated: bool,
        #[case] op: &str,
    ) {
        let f = Filter::from_parts(
            vec!["lanes".into()],
            comparison,
            vec!["2".into()],
            negated,
            false,
        )
        .unwrap();
        assert!(f.to_ql().contains(&format!(") {} \"2\")", op)));
    }

    #[test]
    fn test_contain_all_emits_one_bracket_per_word() {
        let f = Filter::contain_all("name", vec!["Calle".into(), "Mayor".into()], false, false)
            .unwrap();
        assert_eq!(f.to_ql(), "[\"name\"~\"Calle\"][\"name\"~\"Mayor\"]");
    }

    #[test]
    fn test_contain_all_exact_escapes_regex() {
        let f = Filter::contain_all("ref", vec!["A-1".into()], false, true).unwrap();
        assert_eq!(f.to_ql(), "[\"ref\"~\"A\\-1\"]");
    }

    #[test]
    fn test_is_one_of() {
        let f = Filter::is_one_of(
            "highway",
            vec!["footway".into(), "path".into(), "steps".into()],
            false,
            false,
        )
        .unwrap();
        assert_eq!(f.to_ql(), "[\"highway\"~\"^(footway|path|steps)$\"]");
    }

    #[test]
    fn test_is_one_of_negated_exact() {
        let f = Filter::is_one_of("access", vec!["no".into(), "pri.vate".into()], true, true)
            .unwrap();
        assert_eq!(f.to_ql(), "[\"access\"!~\"^(no|pri\\.vate)$\"]");
    }

    #[rstest]
    #[case(true, "[\"maxspeed\"]")]
    #[case(false, "[~\"maxspeed\"~\".*\",i]")]
    fn test_has_key(#[case] exact: bool, #[case] expected: &str) {
        let f = Filter::has_key("maxspeed", exact).unwrap();
        assert_eq!(f.to_ql(), expected);
    }

    #[test]
    fn test_has_not_key() {
        let f = Filter::has_not_key("construction").unwrap();
        assert_eq!(f.to_ql(), "[!\"construction\"]");
    }

    #[test]
    fn test_has_one_key() {
        let f = Filter::has_one_key(vec!["maxspeed".into(), "lanes".into()], false).unwrap();
        assert_eq!(f.to_ql(), "[~\"^(maxspeed|lanes)$\"~\".*\"]");
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = Filter::equal("", "x", false, true).unwrap_err();
        assert_eq!(err.code(), OSM0101);
    }

    #[test]
    fn test_missing_numeric_value_rejected() {
        let err = Filter::at_most("maxspeed", "", false).unwrap_err();
        assert_eq!(err.code(), OSM0102);
    }

    #[test]
    fn test_flags_dropped_where_unsupported() {
        // HasKey supports neither negation nor (here) values.
        let f = Filter::from_parts(
            vec!["highway".into()],
            Comparison::HasKey,
            Vec::new(),
            true,
            true,
        )
        .unwrap();
        assert!(!f.negated());
    }

    #[test]
    fn test_embedded_quote_is_escaped() {
        let f = Filter::equal("name", "The \"Arms\"", false, true).unwrap();
        assert_eq!(f.to_ql(), "[\"name\"=\"The \\\"Arms\\\"\"]");
    }

    #[test]
    fn test_trailing_backslash_cannot_break_out() {
        // An unescaped trailing backslash would turn the closing quote
        // into an escaped quote and leave the QL string unterminated.
        let f = Filter::equal("name", "a\\", false, true).unwrap();
        assert_eq!(f.to_ql(), "[\"name\"=\"a\\\\\"]");
    }

    #[test]
    fn test_backslash_escaped_before_quote() {
        let f = Filter::equal("name", "\\\"", false, true).unwrap();
        assert_eq!(f.to_ql(), "[\"name\"=\"\\\\\\\"\"]");
    }

    #[test]
    fn test_metadata_table() {
        assert!(Comparison::HasOneKey.multiple_keys());
        assert!(Comparison::IsOneOf.multiple_values());
        assert!(!Comparison::AtMost.supports_exact());
        assert!(!Comparison::HasNotKey.supports_negate());
        assert!(Comparison::AtLeast.numeric_value());
        assert!(!Comparison::Equal.requires_value());
    }
}
