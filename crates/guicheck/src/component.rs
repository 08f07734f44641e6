//! Assertions shared by stages, nodes and menu bars.
//!
//! Every operation is one retried evaluation: the wrapped object is resolved
//! again on the event-loop thread for each attempt, so a tree that changed
//! between attempts is seen as it is now.

use crate::assertion::RetryPolicy;
use crate::context::GuiCheck;
use crate::locator::{self, Selector};
use crate::menu::MenuBar;
use crate::node::Node;
use crate::platform::{NodeRef, Target, UiNode, WindowRef};
use crate::property::{check_property, get_property, set_property, PropertyValue, ValueType};
use crate::result::{GuiCheckError, GuiCheckResult};
use std::fmt;
use std::sync::{Arc, Weak};

/// Non-owning reference to the object a component wraps
#[derive(Clone)]
pub enum Handle {
    /// A window; its scene root is looked up on every use
    Window(WindowRef),
    /// A node, held weakly so the toolkit stays its only owner
    Node {
        /// The node
        node: Weak<dyn UiNode>,
        /// Selector the node was found with
        description: String,
    },
}

impl Handle {
    /// Handle to `node`
    #[must_use]
    pub fn for_node(node: &NodeRef, description: String) -> Self {
        Self::Node {
            node: Arc::downgrade(node),
            description,
        }
    }

    /// Root of the subtree searched by node lookups
    ///
    /// # Errors
    /// Assertion failure if the window has no scene;
    /// [`GuiCheckError::NodeDetached`] if the node is gone
    pub fn scene_root(&self) -> GuiCheckResult<NodeRef> {
        match self {
            Self::Window(window) => window
                .root()
                .ok_or_else(|| GuiCheckError::assertion("The stage has no scene")),
            Self::Node { node, description } => {
                node.upgrade().ok_or_else(|| GuiCheckError::NodeDetached {
                    description: description.clone(),
                })
            }
        }
    }

    /// Object whose properties are read and written
    ///
    /// # Errors
    /// [`GuiCheckError::NodeDetached`] if the node is gone
    pub fn target(&self) -> GuiCheckResult<Target> {
        match self {
            Self::Window(window) => Ok(Target::Window(window.clone())),
            Self::Node { .. } => self.scene_root().map(Target::Node),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(window) => f.debug_tuple("Window").field(&window.window_id()).finish(),
            Self::Node { description, .. } => f.debug_tuple("Node").field(description).finish(),
        }
    }
}

/// Fluent assertions on a wrapped toolkit object.
///
/// Methods returning `&Self` can be chained:
///
/// ```rust,ignore
/// stage
///     .node("#count")?
///     .property_is("text", "0")?
///     .property_is_not("disable", true)?;
/// ```
pub trait Component: Sized {
    /// Session the component belongs to
    fn context(&self) -> &GuiCheck;

    /// The wrapped object
    fn handle(&self) -> &Handle;

    /// Find a node below this component, with retry
    ///
    /// # Errors
    /// Assertion failure naming the selector if nothing matched on the last
    /// attempt; hard failure for an invalid name pattern
    fn node(&self, selector: impl Into<Selector>) -> GuiCheckResult<Node> {
        let policy = *self.context().evaluator().policy();
        self.node_with(selector, &policy)
    }

    /// Find a node below this component under `policy`
    ///
    /// # Errors
    /// As [`Component::node`]
    fn node_with(
        &self,
        selector: impl Into<Selector>,
        policy: &RetryPolicy,
    ) -> GuiCheckResult<Node> {
        let selector = selector.into();
        let context = self.context();
        let found = context.evaluator().eval_with(policy, || {
            let handle = self.handle().clone();
            let selector = selector.clone();
            context
                .dispatcher()
                .invoke(move || locator::find(&handle.scene_root()?, &selector))
        })?;
        Ok(Node::new(context.clone(), &found, selector.to_string()))
    }

    /// Find the first node for `selector` whose `property` equals
    /// `expected`, with retry
    ///
    /// # Errors
    /// Assertion failure if no candidate matched on the last attempt; hard
    /// failure if a candidate's property cannot be read
    fn node_where(
        &self,
        selector: impl Into<Selector>,
        property: &str,
        expected: impl Into<PropertyValue>,
    ) -> GuiCheckResult<Node> {
        let selector = selector.into();
        let expected = expected.into();
        let context = self.context();
        let found = context.evaluator().eval(|| {
            let handle = self.handle().clone();
            let selector = selector.clone();
            let property = property.to_string();
            let expected = expected.clone();
            context.dispatcher().invoke(move || {
                locator::find_where(&handle.scene_root()?, &selector, &property, &expected)
            })
        })?;
        Ok(Node::new(context.clone(), &found, selector.to_string()))
    }

    /// Every node currently matching `selector`; not retried
    ///
    /// # Errors
    /// Hard failure for an invalid name pattern or a detached component
    fn nodes(&self, selector: impl Into<Selector>) -> GuiCheckResult<Vec<Node>> {
        let selector = selector.into();
        let context = self.context();
        let handle = self.handle().clone();
        let query = selector.clone();
        let found = context
            .dispatcher()
            .invoke(move || locator::lookup_all(&handle.scene_root()?, &query))?;
        let description = selector.to_string();
        Ok(found
            .iter()
            .map(|node| Node::new(context.clone(), node, description.clone()))
            .collect())
    }

    /// Find a menu bar below this component, with retry
    ///
    /// # Errors
    /// As [`Component::node`]; [`GuiCheckError::Unsupported`] if the node
    /// found is not a menu bar
    fn menu_bar(&self, selector: impl Into<Selector>) -> GuiCheckResult<MenuBar> {
        let selector = selector.into();
        let context = self.context();
        let found = context.evaluator().eval(|| {
            let handle = self.handle().clone();
            let selector = selector.clone();
            context.dispatcher().invoke(move || {
                let node = locator::find(&handle.scene_root()?, &selector)?;
                if node.menus().is_none() {
                    return Err(GuiCheckError::unsupported(format!(
                        "{} found for {selector} is not a menu bar",
                        node.type_name()
                    )));
                }
                Ok(node)
            })
        })?;
        Ok(MenuBar::new(context.clone(), &found, selector.to_string()))
    }

    /// Read `name` through its `get` accessor
    ///
    /// # Errors
    /// Hard failure if the getter is missing or failed
    fn property(&self, name: &str) -> GuiCheckResult<PropertyValue> {
        self.property_of_type(name, None)
    }

    /// Read `name` through the accessor for `value_type` (`is` for booleans)
    ///
    /// # Errors
    /// Hard failure if the getter is missing or failed
    fn property_of_type(
        &self,
        name: &str,
        value_type: Option<ValueType>,
    ) -> GuiCheckResult<PropertyValue> {
        let handle = self.handle().clone();
        let name = name.to_string();
        self.context().dispatcher().invoke(move || {
            get_property(handle.target()?.reflect(), &name, value_type.as_ref())
        })
    }

    /// Check that `name` equals `expected`, with retry
    ///
    /// # Errors
    /// Assertion failure on mismatch after the last attempt; hard failure if
    /// the getter is missing or failed
    fn property_is(&self, name: &str, expected: impl Into<PropertyValue>) -> GuiCheckResult<&Self> {
        check(self, name, expected.into(), true)?;
        Ok(self)
    }

    /// Check that `name` differs from `unexpected`, with retry
    ///
    /// # Errors
    /// As [`Component::property_is`]
    fn property_is_not(
        &self,
        name: &str,
        unexpected: impl Into<PropertyValue>,
    ) -> GuiCheckResult<&Self> {
        check(self, name, unexpected.into(), false)?;
        Ok(self)
    }

    /// Set `name` to `value` and check it took, in one retried evaluation
    ///
    /// # Errors
    /// Assertion failure if the value read back differs after the last
    /// attempt; hard failure if no setter or getter exists or either failed
    fn ensure_property_is(
        &self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> GuiCheckResult<&Self> {
        let value = value.into();
        let context = self.context();
        context.evaluator().eval(|| {
            let handle = self.handle().clone();
            let name = name.to_string();
            let value = value.clone();
            context.dispatcher().invoke(move || {
                let target = handle.target()?;
                set_property(target.reflect(), &name, value.clone())?;
                check_property(target.reflect(), &name, &value, true)
            })
        })?;
        Ok(self)
    }
}

fn check<C: Component>(
    component: &C,
    name: &str,
    expected: PropertyValue,
    expected_result: bool,
) -> GuiCheckResult<()> {
    let context = component.context();
    context.evaluator().eval(|| {
        let handle = component.handle().clone();
        let name = name.to_string();
        let expected = expected.clone();
        context.dispatcher().invoke(move || {
            check_property(handle.target()?.reflect(), &name, &expected, expected_result)
        })
    })
}
