//! Component locator.
//!
//! Finds nodes below a root by selector. CSS selectors are handed to the
//! toolkit's own query engine. Name and kind selectors walk the tree here,
//! preferring shallow matches: all direct children are checked before any
//! subtree is entered.
//!
//! Every function in this module touches toolkit nodes and must run on the
//! event-loop thread.

use crate::platform::NodeRef;
use crate::property::{get_property, PropertyValue};
use crate::result::{GuiCheckError, GuiCheckResult};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use tracing::trace;

/// A title, name or id pattern.
///
/// A value matches if it starts with the pattern literally, or else if the
/// whole value matches the pattern as a regular expression. The regex is
/// only compiled when the prefix test fails.
#[derive(Debug)]
pub struct Pattern {
    text: String,
    regex: OnceLock<Result<Regex, regex::Error>>,
}

impl Pattern {
    /// Create a pattern
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            regex: OnceLock::new(),
        }
    }

    /// The pattern text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether `actual` matches; an absent value never does
    ///
    /// # Errors
    /// [`GuiCheckError::InvalidPattern`] if the regex fallback is needed and
    /// the pattern does not compile
    pub fn is_match(&self, actual: Option<&str>) -> GuiCheckResult<bool> {
        let Some(actual) = actual else {
            return Ok(false);
        };
        if actual.starts_with(&self.text) {
            return Ok(true);
        }
        let compiled = self
            .regex
            .get_or_init(|| Regex::new(&format!("^(?:{})$", self.text)));
        match compiled {
            Ok(regex) => Ok(regex.is_match(actual)),
            Err(source) => Err(GuiCheckError::InvalidPattern {
                pattern: self.text.clone(),
                source: source.clone(),
            }),
        }
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Self::new(self.text.clone())
    }
}

/// Match `actual` against `pattern`.
///
/// Both absent matches; an absent pattern never matches a present value;
/// otherwise prefix first, then full regex match.
///
/// # Errors
/// [`GuiCheckError::InvalidPattern`] if the pattern is needed as a regex
/// and does not compile
pub fn try_matches(actual: Option<&str>, pattern: Option<&str>) -> GuiCheckResult<bool> {
    match (actual, pattern) {
        (None, pattern) => Ok(pattern.is_none()),
        (Some(_), None) => Ok(false),
        (Some(_), Some(pattern)) => Pattern::new(pattern).is_match(actual),
    }
}

/// Like [`try_matches`], treating an invalid pattern as no match
#[must_use]
pub fn matches(actual: Option<&str>, pattern: Option<&str>) -> bool {
    try_matches(actual, pattern).unwrap_or(false)
}

/// How to find a node
#[derive(Debug, Clone)]
pub enum Selector {
    /// CSS-like query evaluated by the toolkit (`#ok`, `.button`, `TextField`)
    Css(String),
    /// Node name/id matched with [`Pattern`], shallowest match first
    Name(Pattern),
    /// Toolkit type name, shallowest match first
    Kind(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a name selector
    #[must_use]
    pub fn name(pattern: impl Into<String>) -> Self {
        Self::Name(Pattern::new(pattern))
    }

    /// Create a kind selector
    #[must_use]
    pub fn kind(type_name: impl Into<String>) -> Self {
        Self::Kind(type_name.into())
    }
}

impl From<&str> for Selector {
    fn from(selector: &str) -> Self {
        Self::css(selector)
    }
}

impl From<String> for Selector {
    fn from(selector: String) -> Self {
        Self::Css(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => f.write_str(s),
            Self::Name(p) => write!(f, "name={}", p.as_str()),
            Self::Kind(t) => write!(f, "kind={t}"),
        }
    }
}

/// Predicate over nodes; errors abort the search
type NodeTest<'a> = dyn Fn(&NodeRef) -> GuiCheckResult<bool> + 'a;

fn node_test(selector: &Selector) -> Option<Box<NodeTest<'_>>> {
    match selector {
        Selector::Css(_) => None,
        Selector::Name(pattern) => Some(Box::new(move |node: &NodeRef| {
            pattern.is_match(node.id().as_deref())
        })),
        Selector::Kind(type_name) => {
            Some(Box::new(move |node: &NodeRef| Ok(node.type_name() == *type_name)))
        }
    }
}

fn search_first(parent: &NodeRef, test: &NodeTest<'_>) -> GuiCheckResult<Option<NodeRef>> {
    let children = parent.children();
    for child in &children {
        if test(child)? {
            return Ok(Some(child.clone()));
        }
    }
    for child in children.iter().filter(|c| c.is_container()) {
        if let Some(found) = search_first(child, test)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

// Same order as search_first: a level's matches before any deeper ones
fn search_all(parent: &NodeRef, test: &NodeTest<'_>, out: &mut Vec<NodeRef>) -> GuiCheckResult<()> {
    let children = parent.children();
    for child in &children {
        if test(child)? {
            out.push(child.clone());
        }
    }
    for child in children.iter().filter(|c| c.is_container()) {
        search_all(child, test, out)?;
    }
    Ok(())
}

/// First node below `root` matching `selector`, if any
///
/// # Errors
/// Hard failure for an invalid name pattern
pub fn lookup(root: &NodeRef, selector: &Selector) -> GuiCheckResult<Option<NodeRef>> {
    if let Selector::Css(query) = selector {
        return Ok(root.query(query));
    }
    node_test(selector).map_or(Ok(None), |test| search_first(root, test.as_ref()))
}

/// All nodes below `root` matching `selector`
///
/// # Errors
/// Hard failure for an invalid name pattern
pub fn lookup_all(root: &NodeRef, selector: &Selector) -> GuiCheckResult<Vec<NodeRef>> {
    if let Selector::Css(query) = selector {
        return Ok(root.query_all(query));
    }
    let mut found = Vec::new();
    if let Some(test) = node_test(selector) {
        search_all(root, test.as_ref(), &mut found)?;
    }
    Ok(found)
}

/// Find the node for `selector`
///
/// # Errors
/// Assertion failure naming the selector if nothing matches
pub fn find(root: &NodeRef, selector: &Selector) -> GuiCheckResult<NodeRef> {
    match lookup(root, selector)? {
        Some(node) => {
            trace!(%selector, id = ?node.id(), "node found");
            Ok(node)
        }
        None => Err(GuiCheckError::assertion(format!(
            "Cannot find node for selector: {selector}"
        ))),
    }
}

/// Find the first node for `selector` whose `property` equals `expected`
///
/// # Errors
/// Assertion failure naming selector, value and property if no candidate
/// matches; hard failure if a candidate's property cannot be read
pub fn find_where(
    root: &NodeRef,
    selector: &Selector,
    property: &str,
    expected: &PropertyValue,
) -> GuiCheckResult<NodeRef> {
    let value_type = expected.value_type();
    for candidate in lookup_all(root, selector)? {
        let actual = get_property(candidate.as_reflect(), property, value_type.as_ref())?;
        if actual == *expected {
            trace!(%selector, property, "node found by property");
            return Ok(candidate);
        }
    }
    Err(GuiCheckError::assertion(format!(
        "Cannot find node for selector: {selector} with value {expected} for property {property}"
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockNode;

    /// ```text
    /// root
    /// ├── form (Pane)
    /// │   ├── ok (Button, text "deep")
    /// │   └── name (TextField)
    /// ├── okButton (Button, text "Ok")
    /// └── cancel (Button, text "Cancel")
    /// ```
    fn tree() -> NodeRef {
        let root = MockNode::new("Pane").with_id("root");
        let form = root.add_child(MockNode::new("Pane").with_id("form"));
        form.add_child(MockNode::new("Button").with_id("ok").with_text("deep"));
        form.add_child(MockNode::new("TextField").with_id("name"));
        root.add_child(MockNode::new("Button").with_id("okButton").with_text("Ok"));
        root.add_child(MockNode::new("Button").with_id("cancel").with_text("Cancel"));
        root
    }

    fn id_of(node: &NodeRef) -> String {
        node.id().unwrap_or_default()
    }

    mod matching {
        use super::*;

        #[test]
        fn test_both_absent() {
            assert!(matches(None, None));
        }

        #[test]
        fn test_absent_pattern() {
            assert!(!matches(Some("Foo"), None));
        }

        #[test]
        fn test_absent_value() {
            assert!(!matches(None, Some("Foo")));
        }

        #[test]
        fn test_prefix() {
            assert!(matches(Some("FooBar"), Some("Foo")));
        }

        #[test]
        fn test_regex_fallback() {
            assert!(matches(Some("FooBar"), Some("F.*r")));
            assert!(!matches(Some("FooBarBaz"), Some("F.*r")));
        }

        #[test]
        fn test_regex_must_match_whole_value() {
            assert!(!matches(Some("xFooBar"), Some("Foo")));
            assert!(!matches(Some("FooBar"), Some("o+B")));
        }

        #[test]
        fn test_prefix_wins_over_invalid_regex() {
            assert!(try_matches(Some("a(b"), Some("a(")).unwrap());
        }

        #[test]
        fn test_invalid_regex_is_hard_failure() {
            let err = try_matches(Some("abc"), Some("(")).unwrap_err();
            assert!(matches!(err, GuiCheckError::InvalidPattern { .. }));
            assert!(!matches(Some("abc"), Some("(")));
        }
    }

    mod selector {
        use super::*;

        #[test]
        fn test_display() {
            assert_eq!(Selector::from("#ok").to_string(), "#ok");
            assert_eq!(Selector::name("ok.*").to_string(), "name=ok.*");
            assert_eq!(Selector::kind("Button").to_string(), "kind=Button");
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn test_css_uses_toolkit_query() {
            let root = tree();
            let node = find(&root, &"#cancel".into()).unwrap();
            assert_eq!(id_of(&node), "cancel");
            let buttons = lookup_all(&root, &"Button".into()).unwrap();
            assert_eq!(buttons.len(), 3);
        }

        #[test]
        fn test_not_found_names_selector() {
            let root = tree();
            let err = find(&root, &"#missing".into()).err().unwrap();
            assert!(err.is_retryable());
            assert_eq!(err.to_string(), "Cannot find node for selector: #missing");
        }

        #[test]
        fn test_name_prefers_shallow_match() {
            // "ok" is a prefix of both form/ok (deep, seen first depth-first)
            // and okButton (shallow); the shallow one wins
            let root = tree();
            let node = find(&root, &Selector::name("ok")).unwrap();
            assert_eq!(id_of(&node), "okButton");
        }

        #[test]
        fn test_name_recurses_when_level_has_no_match() {
            let root = tree();
            let node = find(&root, &Selector::name("na.e")).unwrap();
            assert_eq!(id_of(&node), "name");
        }

        #[test]
        fn test_name_lookup_all_order() {
            let root = tree();
            let ids: Vec<_> = lookup_all(&root, &Selector::name("ok"))
                .unwrap()
                .iter()
                .map(id_of)
                .collect();
            assert_eq!(ids, vec!["okButton", "ok"]);
        }

        #[test]
        fn test_name_does_not_match_root() {
            let root = tree();
            assert!(lookup(&root, &Selector::name("root")).unwrap().is_none());
        }

        #[test]
        fn test_invalid_name_pattern_is_hard() {
            let root = tree();
            let err = find(&root, &Selector::name("[")).err().unwrap();
            assert!(!err.is_retryable());
        }

        #[test]
        fn test_kind_prefers_shallow_match() {
            let root = tree();
            let node = find(&root, &Selector::kind("Button")).unwrap();
            assert_eq!(id_of(&node), "okButton");
            let node = find(&root, &Selector::kind("TextField")).unwrap();
            assert_eq!(id_of(&node), "name");
        }
    }

    mod find_where {
        use super::*;

        #[test]
        fn test_returns_first_with_value() {
            let root = tree();
            let node = find_where(&root, &"Button".into(), "text", &"Cancel".into()).unwrap();
            assert_eq!(id_of(&node), "cancel");
        }

        #[test]
        fn test_no_candidate_with_value() {
            let root = tree();
            let err = find_where(&root, &"Button".into(), "text", &"Apply".into()).err().unwrap();
            assert!(err.is_retryable());
            assert_eq!(
                err.to_string(),
                "Cannot find node for selector: Button with value Apply for property text"
            );
        }

        #[test]
        fn test_unreadable_property_is_hard() {
            let root = tree();
            let err = find_where(&root, &"Button".into(), "tooltip", &"x".into()).err().unwrap();
            assert!(!err.is_retryable());
        }

        #[test]
        fn test_name_selector_with_property() {
            let root = tree();
            let node = find_where(&root, &Selector::name("ok"), "text", &"deep".into()).unwrap();
            assert_eq!(id_of(&node), "ok");
            assert_eq!(id_of(&node.parent().unwrap()), "form");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_every_prefix_matches(value in ".{0,16}", cut in 0usize..16) {
                let cut = value.char_indices().nth(cut).map_or(value.len(), |(i, _)| i);
                prop_assert!(matches(Some(value.as_str()), Some(&value[..cut])));
            }

            #[test]
            fn prop_escaped_value_matches_itself(value in ".{1,16}") {
                let escaped = regex::escape(&value);
                prop_assert!(matches(Some(value.as_str()), Some(escaped.as_str())));
            }

            #[test]
            fn prop_absent_value_matches_only_absent_pattern(pattern in proptest::option::of(".{0,8}")) {
                prop_assert_eq!(matches(None, pattern.as_deref()), pattern.is_none());
            }
        }
    }
}
