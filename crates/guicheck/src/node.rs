//! A node found in a scene.

use crate::assertion::ensure_eq;
use crate::component::{Component, Handle};
use crate::context::GuiCheck;
use crate::platform::NodeRef;
use crate::result::GuiCheckResult;
use std::fmt;

/// Wrapper around a located scene-graph node.
///
/// The node is held weakly: once the toolkit drops it, every operation
/// fails with [`GuiCheckError::NodeDetached`](crate::GuiCheckError::NodeDetached).
/// Look the node up again instead of keeping a `Node` across changes that
/// rebuild the tree.
#[derive(Clone)]
pub struct Node {
    context: GuiCheck,
    handle: Handle,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub(crate) fn new(context: GuiCheck, node: &NodeRef, description: String) -> Self {
        Self {
            context,
            handle: Handle::for_node(node, description),
        }
    }

    /// The underlying toolkit node
    ///
    /// # Errors
    /// [`GuiCheckError::NodeDetached`](crate::GuiCheckError::NodeDetached)
    /// if the toolkit dropped it
    pub fn resolve(&self) -> GuiCheckResult<NodeRef> {
        self.handle.scene_root()
    }

    /// Id of the node
    ///
    /// # Errors
    /// Hard failure if the node is detached or the event loop is gone
    pub fn id(&self) -> GuiCheckResult<Option<String>> {
        let handle = self.handle.clone();
        self.context
            .dispatcher()
            .invoke(move || Ok(handle.scene_root()?.id()))
    }

    /// Check whether the node is effectively visible: it and every ancestor
    /// are visible. Retried.
    ///
    /// # Errors
    /// Assertion failure if the visibility differs from `visible`
    pub fn tree_visible_is(&self, visible: bool) -> GuiCheckResult<&Self> {
        self.context.evaluator().eval(|| {
            let handle = self.handle.clone();
            self.context.dispatcher().invoke(move || {
                let actual = tree_visible(&handle.scene_root()?);
                ensure_eq("value of treeVisible", &visible, &actual)
            })
        })?;
        Ok(self)
    }
}

fn tree_visible(node: &NodeRef) -> bool {
    let mut current = Some(node.clone());
    while let Some(node) = current {
        if !node.is_visible() {
            return false;
        }
        current = node.parent();
    }
    true
}

impl Component for Node {
    fn context(&self) -> &GuiCheck {
        &self.context
    }

    fn handle(&self) -> &Handle {
        &self.handle
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assertion::RetryPolicy;
    use crate::config::GuiCheckConfig;
    use crate::mock::{MockNode, MockToolkit, MockWindow};
    use crate::result::GuiCheckError;
    use std::sync::Arc;

    fn scene() -> (Arc<MockToolkit>, Arc<MockNode>, GuiCheck) {
        let toolkit = MockToolkit::start();
        let root = MockNode::new("VBox");
        let group = root.add_child(MockNode::new("Pane").with_id("group"));
        group.add_child(MockNode::new("Label").with_id("caption").with_text("Hi"));
        toolkit.add_window(MockWindow::new("Main").with_root(Arc::clone(&root)));
        let config = GuiCheckConfig::default()
            .with_retry(RetryPolicy::new(3, 1))
            .with_slow_motion(1)
            .with_dispatch_poll_interval_ms(20);
        let gc = GuiCheck::new(toolkit.clone(), config);
        (toolkit, root, gc)
    }

    #[test]
    fn test_id() {
        let (toolkit, _root, gc) = scene();
        let caption = gc.stage("Main").unwrap().node("#caption").unwrap();
        assert_eq!(caption.id().unwrap().as_deref(), Some("caption"));
        toolkit.shutdown();
    }

    #[test]
    fn test_hidden_ancestor_hides_tree() {
        let (toolkit, root, gc) = scene();
        let caption = gc.stage("Main").unwrap().node("#caption").unwrap();
        root.child_nodes()[0].set_visible(false);
        let err = caption.tree_visible_is(true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected value of treeVisible: Expected: true, Actual: false"
        );
        caption.tree_visible_is(false).unwrap();
        toolkit.shutdown();
    }

    #[test]
    fn test_detached_node() {
        let (toolkit, root, gc) = scene();
        let group = gc.stage("Main").unwrap().node("#group").unwrap();
        assert!(root.remove_child("group"));
        assert!(matches!(
            group.resolve().err().unwrap(),
            GuiCheckError::NodeDetached { .. }
        ));
        assert!(group.node("#caption").is_err());
        toolkit.shutdown();
    }
}
