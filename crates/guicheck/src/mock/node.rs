//! Scene-graph nodes for the mock toolkit.

use super::{lock, ActionFn, MockMenuItem, MockPopup};
use crate::platform::{BoundingBox, MenuRef, NodeRef, Point, UiNode};
use crate::property::{getter_name, setter_name, AccessError, PropertyValue, Reflect, ValueType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

#[derive(Debug, Clone)]
struct Property {
    value: PropertyValue,
    declared: ValueType,
    writable: bool,
    failure: Option<String>,
}

impl Property {
    fn new(value: PropertyValue, declared: ValueType) -> Self {
        Self {
            value,
            declared,
            writable: true,
            failure: None,
        }
    }
}

/// Setters of mock properties are declared with the primitive type, the
/// way most toolkit setters are.
fn declared_type(value: &PropertyValue) -> ValueType {
    match value.value_type() {
        Some(ValueType::Boxed(p)) => ValueType::Primitive(p),
        Some(other) => other,
        None => ValueType::Object("Object".into()),
    }
}

/// A node of the mock scene graph.
///
/// Builders take and return `Arc<Self>` so a tree can be assembled in one
/// expression. Every node has the properties `id`, `visible`, `focused`
/// (read-only) and `disable`; more are added with the `with_*` builders.
pub struct MockNode {
    this: Weak<MockNode>,
    type_name: String,
    style_classes: Mutex<Vec<String>>,
    properties: Mutex<BTreeMap<String, Property>>,
    children: Mutex<Vec<Arc<MockNode>>>,
    parent: Mutex<Weak<MockNode>>,
    bounds: Mutex<BoundingBox>,
    on_action: Mutex<Option<ActionFn>>,
    context_menu: Mutex<Option<Arc<MockPopup>>>,
    menus: Mutex<Option<Vec<Arc<MockMenuItem>>>>,
}

impl fmt::Debug for MockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockNode")
            .field("type_name", &self.type_name)
            .field("id", &UiNode::id(self))
            .field("children", &lock(&self.children).len())
            .finish_non_exhaustive()
    }
}

impl MockNode {
    /// Create a node of the given toolkit type
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Arc<Self> {
        let mut properties = BTreeMap::new();
        properties.insert(
            "id".to_string(),
            Property::new(PropertyValue::Null, ValueType::String),
        );
        for name in ["visible", "disable"] {
            let value = PropertyValue::Bool(name == "visible");
            let property = Property::new(value.clone(), declared_type(&value));
            properties.insert(name.to_string(), property);
        }
        let mut focused = Property::new(PropertyValue::Bool(false), declared_type(&false.into()));
        focused.writable = false;
        properties.insert("focused".to_string(), focused);

        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            type_name: type_name.into(),
            style_classes: Mutex::new(Vec::new()),
            properties: Mutex::new(properties),
            children: Mutex::new(Vec::new()),
            parent: Mutex::new(Weak::new()),
            bounds: Mutex::new(BoundingBox::default()),
            on_action: Mutex::new(None),
            context_menu: Mutex::new(None),
            menus: Mutex::new(None),
        })
    }

    /// Create a menu bar holding `menus`
    #[must_use]
    pub fn menu_bar(menus: Vec<Arc<MockMenuItem>>) -> Arc<Self> {
        let bar = Self::new("MenuBar");
        *lock(&bar.menus) = Some(menus);
        bar
    }

    /// Set the id
    #[must_use]
    pub fn with_id(self: Arc<Self>, id: impl Into<String>) -> Arc<Self> {
        self.put("id", PropertyValue::Str(id.into()));
        self
    }

    /// Add a style class
    #[must_use]
    pub fn with_style_class(self: Arc<Self>, class: impl Into<String>) -> Arc<Self> {
        lock(&self.style_classes).push(class.into());
        self
    }

    /// Set the `text` property
    #[must_use]
    pub fn with_text(self: Arc<Self>, text: impl Into<String>) -> Arc<Self> {
        self.with_property("text", text.into())
    }

    /// Add a property whose setter takes the primitive type
    #[must_use]
    pub fn with_property(
        self: Arc<Self>,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Arc<Self> {
        let value = value.into();
        let declared = declared_type(&value);
        lock(&self.properties).insert(name.to_string(), Property::new(value, declared));
        self
    }

    /// Add a property whose setter takes the boxed type
    #[must_use]
    pub fn with_boxed_property(
        self: Arc<Self>,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Arc<Self> {
        let value = value.into();
        let declared = value
            .value_type()
            .unwrap_or_else(|| ValueType::Object("Object".into()));
        lock(&self.properties).insert(name.to_string(), Property::new(value, declared));
        self
    }

    /// Add a property without a setter
    #[must_use]
    pub fn with_read_only(
        self: Arc<Self>,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Arc<Self> {
        let value = value.into();
        let mut property = Property::new(value.clone(), declared_type(&value));
        property.writable = false;
        lock(&self.properties).insert(name.to_string(), property);
        self
    }

    /// Add a property whose accessors raise `message`
    #[must_use]
    pub fn with_failing_property(self: Arc<Self>, name: &str, message: &str) -> Arc<Self> {
        let mut property = Property::new(PropertyValue::Null, ValueType::String);
        property.failure = Some(message.to_string());
        lock(&self.properties).insert(name.to_string(), property);
        self
    }

    /// Set bounds in scene coordinates
    #[must_use]
    pub fn with_bounds(self: Arc<Self>, x: f32, y: f32, width: f32, height: f32) -> Arc<Self> {
        *lock(&self.bounds) = BoundingBox::new(x, y, width, height);
        self
    }

    /// Set visibility
    #[must_use]
    pub fn with_visible(self: Arc<Self>, visible: bool) -> Arc<Self> {
        self.set_visible(visible);
        self
    }

    /// Set the action run on primary click or Enter
    #[must_use]
    pub fn with_on_action(self: Arc<Self>, action: impl Fn() + Send + Sync + 'static) -> Arc<Self> {
        *lock(&self.on_action) = Some(Arc::new(action));
        self
    }

    /// Set the popup opened on secondary click
    #[must_use]
    pub fn with_context_menu(self: Arc<Self>, popup: Arc<MockPopup>) -> Arc<Self> {
        *lock(&self.context_menu) = Some(popup);
        self
    }

    /// Append `child` and return it
    pub fn add_child(self: &Arc<Self>, child: Arc<Self>) -> Arc<Self> {
        *lock(&child.parent) = Arc::downgrade(self);
        lock(&self.children).push(Arc::clone(&child));
        child
    }

    /// Detach the child with the given id; returns whether one was removed
    pub fn remove_child(&self, id: &str) -> bool {
        let mut children = lock(&self.children);
        let before = children.len();
        children.retain(|c| c.id().as_deref() != Some(id));
        before != children.len()
    }

    /// Toolkit type name
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.type_name
    }

    /// Current value of a property, bypassing accessors
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        lock(&self.properties).get(name).map(|p| p.value.clone())
    }

    /// Overwrite a property value, bypassing accessors
    pub fn put(&self, name: &str, value: PropertyValue) {
        let mut properties = lock(&self.properties);
        match properties.get_mut(name) {
            Some(property) => property.value = value,
            None => {
                let declared = declared_type(&value);
                properties.insert(name.to_string(), Property::new(value, declared));
            }
        }
    }

    /// Current text, if the node has a text property
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.get("text")
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Show or hide the node
    pub fn set_visible(&self, visible: bool) {
        self.put("visible", PropertyValue::Bool(visible));
    }

    /// Whether the node has keyboard focus
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.flag("focused")
    }

    /// Whether the node is disabled
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.flag("disable")
    }

    /// Bounds in scene coordinates
    #[must_use]
    pub fn scene_bounds(&self) -> BoundingBox {
        *lock(&self.bounds)
    }

    /// Run the action callback, if any
    pub fn fire(&self) {
        let action = lock(&self.on_action).clone();
        if let Some(action) = action {
            action();
        }
    }

    /// Popup opened on secondary click
    #[must_use]
    pub fn context_menu(&self) -> Option<Arc<MockPopup>> {
        lock(&self.context_menu).clone()
    }

    /// Parent node, if attached
    #[must_use]
    pub fn parent_node(&self) -> Option<Arc<Self>> {
        lock(&self.parent).upgrade()
    }

    /// Direct children
    #[must_use]
    pub fn child_nodes(&self) -> Vec<Arc<Self>> {
        lock(&self.children).clone()
    }

    /// Top of the tree this node belongs to
    #[must_use]
    pub fn tree_root(self: &Arc<Self>) -> Arc<Self> {
        let mut current = Arc::clone(self);
        loop {
            let parent = lock(&current.parent).upgrade();
            match parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Node holding keyboard focus in this subtree
    #[must_use]
    pub fn focus_owner(self: &Arc<Self>) -> Option<Arc<Self>> {
        if self.is_focused() {
            return Some(Arc::clone(self));
        }
        self.child_nodes().iter().find_map(Self::focus_owner)
    }

    /// Deepest visible node containing `point`, topmost child first
    #[must_use]
    pub fn hit_test(self: &Arc<Self>, point: Point) -> Option<Arc<Self>> {
        if !self.flag("visible") || !self.scene_bounds().contains(&point) {
            return None;
        }
        self.child_nodes()
            .iter()
            .rev()
            .find_map(|child| child.hit_test(point))
            .or_else(|| Some(Arc::clone(self)))
    }

    /// Give this node focus, clearing it elsewhere in its tree
    pub fn focus(self: &Arc<Self>) {
        self.tree_root().clear_focus();
        self.put("focused", PropertyValue::Bool(true));
    }

    fn clear_focus(&self) {
        self.put("focused", PropertyValue::Bool(false));
        for child in self.child_nodes() {
            child.clear_focus();
        }
    }

    fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn matches_compound(&self, compound: &Compound) -> bool {
        if compound.kind.as_deref().is_some_and(|k| k != self.type_name) {
            return false;
        }
        if let Some(id) = &compound.id {
            if UiNode::id(self).as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        let classes = lock(&self.style_classes);
        compound.classes.iter().all(|c| classes.contains(c))
    }

    fn matches_selector(self: &Arc<Self>, selector: &[Compound]) -> bool {
        let Some((last, ancestors)) = selector.split_last() else {
            return false;
        };
        if !self.matches_compound(last) {
            return false;
        }
        // Remaining compounds must match ancestors, innermost first
        let mut pending = ancestors.len();
        let mut current = lock(&self.parent).upgrade();
        while pending > 0 {
            let Some(node) = current else {
                break;
            };
            if node.matches_compound(&ancestors[pending - 1]) {
                pending -= 1;
            }
            current = lock(&node.parent).upgrade();
        }
        pending == 0
    }

    fn collect_matches(
        self: &Arc<Self>,
        selector: &[Compound],
        first_only: bool,
        out: &mut Vec<NodeRef>,
    ) {
        if first_only && !out.is_empty() {
            return;
        }
        if self.matches_selector(selector) {
            out.push(Arc::clone(self) as NodeRef);
        }
        for child in self.child_nodes() {
            child.collect_matches(selector, first_only, out);
        }
    }

    fn query_nodes(&self, selector: &str, first_only: bool) -> Vec<NodeRef> {
        let (Some(parsed), Some(me)) = (parse_selector(selector), self.this.upgrade()) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        me.collect_matches(&parsed, first_only, &mut out);
        out
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Compound {
    kind: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

/// Parse `Type#id.class` compounds separated by whitespace (descendant)
fn parse_selector(selector: &str) -> Option<Vec<Compound>> {
    let parsed: Option<Vec<Compound>> = selector.split_whitespace().map(parse_compound).collect();
    parsed.filter(|compounds| !compounds.is_empty())
}

fn parse_compound(text: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = text;
    let kind_end = rest.find(['#', '.']).unwrap_or(rest.len());
    if kind_end > 0 {
        compound.kind = Some(rest[..kind_end].to_string());
    }
    rest = &rest[kind_end..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let end = body.find(['#', '.']).unwrap_or(body.len());
        let name = &body[..end];
        if name.is_empty() {
            return None;
        }
        match marker {
            '#' => compound.id = Some(name.to_string()),
            _ => compound.classes.push(name.to_string()),
        }
        rest = &body[end..];
    }
    Some(compound)
}

impl UiNode for MockNode {
    fn id(&self) -> Option<String> {
        self.get("id").and_then(|v| v.as_str().map(str::to_string))
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn children(&self) -> Vec<NodeRef> {
        self.child_nodes()
            .into_iter()
            .map(|c| c as NodeRef)
            .collect()
    }

    fn parent(&self) -> Option<NodeRef> {
        lock(&self.parent).upgrade().map(|p| p as NodeRef)
    }

    fn is_visible(&self) -> bool {
        self.flag("visible")
    }

    fn query(&self, selector: &str) -> Option<NodeRef> {
        self.query_nodes(selector, true).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeRef> {
        self.query_nodes(selector, false)
    }

    fn local_bounds(&self) -> BoundingBox {
        let bounds = self.scene_bounds();
        BoundingBox::new(0.0, 0.0, bounds.width, bounds.height)
    }

    fn local_to_scene(&self, point: Point) -> Point {
        let bounds = self.scene_bounds();
        Point::new(bounds.x + point.x, bounds.y + point.y)
    }

    fn request_focus(&self) {
        if let Some(me) = self.this.upgrade() {
            me.focus();
        }
    }

    fn menus(&self) -> Option<Vec<MenuRef>> {
        lock(&self.menus)
            .as_ref()
            .map(|menus| menus.iter().map(|m| Arc::clone(m) as MenuRef).collect())
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

impl Reflect for MockNode {
    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn call_getter(&self, accessor: &str) -> Result<PropertyValue, AccessError> {
        let properties = lock(&self.properties);
        let found = properties
            .iter()
            .find(|(name, p)| getter_name(name, Some(&p.declared)) == accessor);
        match found {
            Some((_, Property {
                failure: Some(message),
                ..
            })) => Err(AccessError::invocation(message.clone())),
            Some((_, property)) => Ok(property.value.clone()),
            None => Err(AccessError::no_such_method(accessor)),
        }
    }

    fn call_setter(
        &self,
        accessor: &str,
        parameter: Option<&ValueType>,
        value: PropertyValue,
    ) -> Result<(), AccessError> {
        let mut properties = lock(&self.properties);
        let found = properties.iter_mut().find(|(name, p)| {
            p.writable
                && setter_name(name) == accessor
                && match parameter {
                    Some(parameter) => *parameter == p.declared,
                    None => !matches!(p.declared, ValueType::Primitive(_)),
                }
        });
        match found {
            Some((_, property)) => {
                if let Some(message) = &property.failure {
                    return Err(AccessError::invocation(message.clone()));
                }
                property.value = value;
                Ok(())
            }
            None => Err(AccessError::no_such_method(accessor)),
        }
    }
}
