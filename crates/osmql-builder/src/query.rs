//! Query assembly
//!
//! [`Query`] owns the named requests and set operations of one query
//! document, the output-set selector, the global settings and the document's
//! [`NameAllocator`]. Compilation is a pure function of the current state:
//! compiling twice without mutation yields byte-identical text.

use crate::{Comparison, NameAllocator, Request, SetOp};
use chrono::{Local, NaiveDate};
use indexmap::IndexMap;
use osmql_diagnostics::{
    Diagnostic, QlError, Result, OSM0001, OSM0002, OSM0103, OSM0150, OSM0151, OSM0152, OSM0200,
};
use std::collections::BTreeMap;

/// Settings key carrying the snapshot date.
pub const DATE_SETTING: &str = "date";

/// An Overpass QL query document.
#[derive(Debug, Clone, Default)]
pub struct Query {
    requests: IndexMap<String, Request>,
    ops: IndexMap<String, SetOp>,
    output_set: String,
    settings: BTreeMap<String, String>,
    names: NameAllocator,
}

impl Query {
    /// Create an empty query.
    pub fn new() -> Self {
        Self {
            requests: IndexMap::new(),
            ops: IndexMap::new(),
            output_set: String::new(),
            settings: BTreeMap::new(),
            names: NameAllocator::new(),
        }
    }

    /// Add a request under a freshly allocated set name; returns the name.
    ///
    /// The first set added to an empty query becomes the output set until
    /// the caller selects another one.
    pub fn add_request(&mut self, request: Request) -> String {
        let name = self.names.allocate();
        self.requests.insert(name.clone(), request);
        self.default_output_set(&name);
        name
    }

    /// Add a request under an externally-chosen name (used when loading a
    /// persisted query). Fails if the name is already live.
    pub fn add_named_request(&mut self, name: impl Into<String>, request: Request) -> Result<()> {
        let name = name.into();
        if !self.names.reserve(name.clone()) {
            return Err(QlError::naming(
                OSM0200,
                format!("set name '{}' already in use", name),
            ));
        }
        self.requests.insert(name.clone(), request);
        self.default_output_set(&name);
        Ok(())
    }

    /// Add a set operation under a freshly allocated name; returns the name.
    pub fn add_operation(&mut self, op: SetOp) -> String {
        let name = self.names.allocate();
        self.ops.insert(name.clone(), op);
        self.default_output_set(&name);
        name
    }

    /// Add a set operation under an externally-chosen name.
    pub fn add_named_operation(&mut self, name: impl Into<String>, op: SetOp) -> Result<()> {
        let name = name.into();
        if !self.names.reserve(name.clone()) {
            return Err(QlError::naming(
                OSM0200,
                format!("set name '{}' already in use", name),
            ));
        }
        self.ops.insert(name.clone(), op);
        self.default_output_set(&name);
        Ok(())
    }

    fn default_output_set(&mut self, name: &str) {
        if self.output_set.is_empty() {
            self.output_set = name.to_string();
        }
    }

    /// The requests in insertion order.
    pub fn requests(&self) -> impl Iterator<Item = (&str, &Request)> {
        self.requests.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// The set operations in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &SetOp)> {
        self.ops.iter().map(|(name, op)| (name.as_str(), op))
    }

    pub fn request(&self, name: &str) -> Option<&Request> {
        self.requests.get(name)
    }

    pub fn request_mut(&mut self, name: &str) -> Option<&mut Request> {
        self.requests.get_mut(name)
    }

    pub fn operation(&self, name: &str) -> Option<&SetOp> {
        self.ops.get(name)
    }

    pub fn operation_mut(&mut self, name: &str) -> Option<&mut SetOp> {
        self.ops.get_mut(name)
    }

    /// Every declared set name, requests first, in insertion order.
    pub fn set_names(&self) -> Vec<&str> {
        self.requests
            .keys()
            .chain(self.ops.keys())
            .map(String::as_str)
            .collect()
    }

    /// Whether a set with this name is declared.
    pub fn contains_set(&self, name: &str) -> bool {
        self.requests.contains_key(name) || self.ops.contains_key(name)
    }

    /// The selected output set name.
    pub fn output_set(&self) -> &str {
        &self.output_set
    }

    /// Select the output set. The name must reference a declared set.
    pub fn set_output_set(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !self.contains_set(&name) {
            return Err(QlError::model(
                OSM0103,
                format!("output set '{}' is not declared", name),
            ));
        }
        self.output_set = name;
        Ok(())
    }

    /// The global settings map.
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Set a global setting verbatim.
    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    /// Select the snapshot date of the query.
    ///
    /// Today's date means "current data" and clears the setting; anything
    /// else is persisted as an ISO-8601 midnight timestamp.
    pub fn set_date(&mut self, date: NaiveDate) {
        if date == Local::now().date_naive() {
            self.settings.remove(DATE_SETTING);
        } else {
            self.settings.insert(
                DATE_SETTING.to_string(),
                date.format("%Y-%m-%dT00:00:00Z").to_string(),
            );
        }
    }

    /// Remove a named set and everything that transitively depended on it.
    ///
    /// The name is stripped from every operation; operations left invalid
    /// join the removal worklist, and removing them repeats the process for
    /// their own output names. Names return to the allocator only after
    /// their entry is gone, so a name is never reusable while referenced.
    ///
    /// The output-set selector is deliberately not repaired: if it named a
    /// removed set the caller must pick a replacement before compiling.
    /// Returns the names actually removed, in removal order.
    pub fn remove_set(&mut self, name: &str) -> Vec<String> {
        let mut removed = Vec::new();
        let mut worklist = std::collections::VecDeque::from([name.to_string()]);
        let mut seen = std::collections::BTreeSet::from([name.to_string()]);

        while let Some(current) = worklist.pop_front() {
            for (op_name, op) in self.ops.iter_mut() {
                op.remove_set(&current);
                if !op.is_valid() && seen.insert(op_name.clone()) {
                    worklist.push_back(op_name.clone());
                }
            }

            let existed = self.requests.shift_remove(&current).is_some()
                || self.ops.shift_remove(&current).is_some();
            if existed {
                self.names.release(&current);
                removed.push(current);
            }
        }
        removed
    }

    /// Compile the query to Overpass QL text.
    ///
    /// Deterministic and side-effect free: an unmutated query always
    /// compiles to the same bytes.
    pub fn compile(&self) -> Result<String> {
        if self.requests.is_empty() {
            return Err(QlError::structural(OSM0002, "Query without requests"));
        }
        if !self.contains_set(&self.output_set) {
            return Err(QlError::model(
                OSM0103,
                format!("output set '{}' is not declared", self.output_set),
            ));
        }

        let mut statement = String::new();

        if !self.settings.is_empty() {
            for (key, value) in &self.settings {
                statement.push_str(&format!(
                    "[{}:\"{}\"]",
                    key,
                    crate::filter::quote(value)
                ));
            }
            statement.push_str(";\n");
        }

        for (name, request) in &self.requests {
            statement.push_str(&format!("{}->.{};\n", request.to_ql()?, name));
        }

        for (name, op) in &self.ops {
            statement.push_str(&op.to_ql(name)?);
        }

        Ok(format!("{}(.{};>;);\nout meta;", statement, self.output_set))
    }

    /// Check the query for problems without compiling it.
    ///
    /// Errors reported here would also fail [`Query::compile`]; warnings
    /// (degenerate single-input operations, a numeric comparison as the
    /// only filter of a request) do not block compilation but should be
    /// surfaced to the user.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if self.requests.is_empty() {
            diagnostics.push(Diagnostic::error(OSM0002, "query has no requests"));
        } else if !self.contains_set(&self.output_set) {
            diagnostics.push(
                Diagnostic::error(
                    OSM0103,
                    format!("output set '{}' is not declared", self.output_set),
                ),
            );
        }

        for (name, request) in &self.requests {
            if request.is_empty() {
                diagnostics.push(
                    Diagnostic::error(OSM0001, "request selects nothing").with_set(name.clone()),
                );
            }
            let only_numeric = request.filters().len() == 1
                && request.filters()[0].comparison().numeric_value();
            if only_numeric {
                diagnostics.push(
                    Diagnostic::warning(
                        OSM0152,
                        "a numeric comparison as the only filter is rejected by the Overpass API",
                    )
                    .with_set(name.clone())
                    .with_help("add a plain tag filter alongside it"),
                );
            }
        }

        for (name, op) in &self.ops {
            // Single-input unions and intersections still compile; anything
            // else invalid is a hard error and reported as such.
            let degenerate = matches!(
                op,
                SetOp::Union { sets } | SetOp::Intersection { sets } if sets.len() == 1
            );
            if degenerate {
                let (code, message) = match op {
                    SetOp::Union { .. } => (OSM0150, "union with a single input set"),
                    _ => (OSM0151, "intersection with a single input set"),
                };
                diagnostics.push(Diagnostic::warning(code, message).with_set(name.clone()));
            } else if let Err(err) = op.to_ql(name) {
                diagnostics.push(err.to_diagnostic().with_set(name.clone()));
            }
        }
        diagnostics
    }

    /// Whether any filter of any request uses a numeric comparison.
    pub fn uses_numeric_filters(&self) -> bool {
        self.requests.values().any(|request| {
            request
                .filters()
                .iter()
                .any(|f| matches!(f.comparison(), Comparison::AtMost | Comparison::AtLeast))
        })
    }

    pub(crate) fn restore_output_set(&mut self, name: String) {
        self.output_set = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementType, Filter, Surround};
    use pretty_assertions::assert_eq;

    fn highway_request() -> Request {
        let mut request = Request::new(ElementType::Ways, Surround::None);
        request.add_filter(Filter::equal("highway", "", false, true).unwrap());
        request
    }

    #[test]
    fn test_single_request_query() {
        let mut query = Query::new();
        let name = query.add_request(highway_request());
        assert_eq!(name, "a");
        assert_eq!(
            query.compile().unwrap(),
            "way[\"highway\"]->.a;\n(.a;>;);\nout meta;"
        );
    }

    #[test]
    fn test_empty_query_fails() {
        let query = Query::new();
        assert_eq!(query.compile().unwrap_err().code(), OSM0002);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut query = Query::new();
        query.add_request(highway_request());
        let op = SetOp::union(["a", "a"]);
        query.add_operation(op);
        query.set_output_set("b").unwrap();
        assert_eq!(query.compile().unwrap(), query.compile().unwrap());
    }

    #[test]
    fn test_settings_prologue() {
        let mut query = Query::new();
        query.add_request(highway_request());
        query.set_setting("date", "2020-01-01T00:00:00Z");
        assert_eq!(
            query.compile().unwrap(),
            "[date:\"2020-01-01T00:00:00Z\"];\nway[\"highway\"]->.a;\n(.a;>;);\nout meta;"
        );
    }

    #[test]
    fn test_setting_value_is_escaped() {
        let mut query = Query::new();
        query.add_request(highway_request());
        query.set_setting("note", "C:\\data \"raw\"");
        assert!(
            query
                .compile()
                .unwrap()
                .starts_with("[note:\"C:\\\\data \\\"raw\\\"\"];\n")
        );
    }

    #[test]
    fn test_set_date_today_is_dropped() {
        let mut query = Query::new();
        query.set_date(Local::now().date_naive());
        assert!(query.settings().is_empty());
    }

    #[test]
    fn test_set_date_past_is_kept() {
        let mut query = Query::new();
        query.set_date(NaiveDate::from_ymd_opt(2019, 6, 1).unwrap());
        assert_eq!(
            query.settings().get(DATE_SETTING).map(String::as_str),
            Some("2019-06-01T00:00:00Z")
        );
    }

    #[test]
    fn test_operations_after_requests() {
        let mut query = Query::new();
        query.add_request(highway_request());
        query.add_request(highway_request());
        let op_name = query.add_operation(SetOp::union(["a", "b"]));
        assert_eq!(op_name, "c");
        query.set_output_set("c").unwrap();
        assert_eq!(
            query.compile().unwrap(),
            "way[\"highway\"]->.a;\nway[\"highway\"]->.b;\n(.a;.b;)->.c;\n(.c;>;);\nout meta;"
        );
    }

    #[test]
    fn test_output_set_must_exist() {
        let mut query = Query::new();
        query.add_request(highway_request());
        assert_eq!(query.set_output_set("z").unwrap_err().code(), OSM0103);
    }

    #[test]
    fn test_removed_output_set_fails_compile() {
        let mut query = Query::new();
        query.add_request(highway_request());
        query.add_request(highway_request());
        query.set_output_set("b").unwrap();
        query.remove_set("b");
        assert_eq!(query.compile().unwrap_err().code(), OSM0103);
    }

    #[test]
    fn test_name_collision_on_named_insert() {
        let mut query = Query::new();
        query.add_named_request("a", highway_request()).unwrap();
        let err = query.add_named_request("a", highway_request()).unwrap_err();
        assert_eq!(err.code(), OSM0200);
    }

    #[test]
    fn test_allocation_skips_named_inserts() {
        let mut query = Query::new();
        query.add_named_request("b", highway_request()).unwrap();
        assert_eq!(query.add_request(highway_request()), "a");
        assert_eq!(query.add_request(highway_request()), "c");
    }

    #[test]
    fn test_remove_request_releases_name() {
        let mut query = Query::new();
        let name = query.add_request(highway_request());
        let removed = query.remove_set(&name);
        assert_eq!(removed, vec!["a".to_string()]);
        assert!(!query.contains_set("a"));
        // The cursor does not rewind, so the next name is "b".
        assert_eq!(query.add_request(highway_request()), "b");
    }

    #[test]
    fn test_cascade_union_then_difference() {
        let mut query = Query::new();
        let a = query.add_request(highway_request());
        let b = query.add_request(highway_request());
        let c = query.add_request(highway_request());
        let union = query.add_operation(SetOp::union([a.clone(), b.clone()]));
        let diff = query.add_operation(SetOp::difference(union.clone(), [c.clone()]));

        // Dropping one union input drives it under two sets: invalid, so it
        // is removed, which in turn invalidates the difference built on it.
        let removed = query.remove_set(&b);
        assert_eq!(removed, vec![b, union, diff]);
        assert!(query.contains_set(&a));
        assert!(query.contains_set(&c));
        assert_eq!(query.operations().count(), 0);
    }

    #[test]
    fn test_cascade_difference_survives_excluded_removal() {
        let mut query = Query::new();
        let a = query.add_request(highway_request());
        let b = query.add_request(highway_request());
        let c = query.add_request(highway_request());
        let diff = query.add_operation(SetOp::difference(a.clone(), [b.clone(), c.clone()]));

        let removed = query.remove_set(&b);
        assert_eq!(removed, vec![b]);
        let op = query.operation(&diff).unwrap();
        assert_eq!(op.sets(), [c]);
        assert!(op.is_valid());
    }

    #[test]
    fn test_cascade_difference_dies_with_included_set() {
        let mut query = Query::new();
        let a = query.add_request(highway_request());
        let b = query.add_request(highway_request());
        let diff = query.add_operation(SetOp::difference(a.clone(), [b.clone()]));

        let removed = query.remove_set(&a);
        assert_eq!(removed, vec![a, diff]);
        assert!(query.contains_set(&b));
    }

    #[test]
    fn test_removing_unknown_set_is_a_no_op() {
        let mut query = Query::new();
        query.add_request(highway_request());
        assert!(query.remove_set("zz").is_empty());
        assert!(query.contains_set("a"));
    }

    #[test]
    fn test_validate_reports_degenerate_union() {
        let mut query = Query::new();
        query.add_request(highway_request());
        query.add_operation(SetOp::union(["a"]));
        let diagnostics = query.validate();
        assert!(diagnostics.iter().any(|d| d.code == OSM0150));
    }

    #[test]
    fn test_validate_reports_numeric_only_filter() {
        let mut query = Query::new();
        let mut request = Request::new(ElementType::Ways, Surround::None);
        request.add_filter(Filter::at_most("maxspeed", "120", false).unwrap());
        query.add_request(request);
        let diagnostics = query.validate();
        assert!(diagnostics.iter().any(|d| d.code == OSM0152));
        assert!(query.uses_numeric_filters());
    }

    #[test]
    fn test_validate_clean_query() {
        let mut query = Query::new();
        query.add_request(highway_request());
        query.add_request(highway_request());
        query.add_operation(SetOp::union(["a", "b"]));
        assert!(query.validate().is_empty());
    }
}
