//! UI State Snapshot
//!
//! Focus, list position and scroll offsets are read from the tree before a
//! reconciliation pass and written back afterwards, so that rebuilt controls
//! look as if they never went away.

use std::collections::HashMap;

use super::engine::WidgetHost;
use super::node::{ScrollOffset, WidgetNode};
use super::registry::{ControlKind, WidgetRole};

/// UI state captured from the widget tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiStateSnapshot {
    /// Parameter whose control had focus
    pub focused: Option<String>,

    /// Top visible index of multi-select lists, by parameter
    pub top_values: HashMap<String, usize>,

    /// Scroll offset of the root panel
    pub scroll: Option<ScrollOffset>,
}

impl UiStateSnapshot {
    pub fn is_empty(&self) -> bool {
        self.focused.is_none() && self.top_values.is_empty() && self.scroll.is_none()
    }
}

fn is_multi_list(node: &WidgetNode) -> bool {
    node.role == WidgetRole::Control(ControlKind::List) && node.multi_select
}

/// Record focus, list positions and scroll offset of a tree.
///
/// List positions are skipped when `restore_list_position` is off.
pub fn capture_ui_state(root: &WidgetNode, restore_list_position: bool) -> UiStateSnapshot {
    let mut snapshot = UiStateSnapshot {
        scroll: root.scroll,
        ..Default::default()
    };

    root.walk(&mut |node| {
        if !node.is_control() {
            return;
        }
        let Some(param) = &node.param else {
            return;
        };

        if node.has_focus && snapshot.focused.is_none() {
            snapshot.focused = Some(param.clone());
        }
        if restore_list_position && is_multi_list(node) {
            if let Some(top) = node.top_visible_index {
                snapshot.top_values.insert(param.clone(), top);
            }
        }
    });

    snapshot
}

/// Write a snapshot back into the tree.
///
/// On the refresh path the scroll offset is not applied; it is returned so
/// the caller can restore it once layout has settled.
pub fn restore_ui_state(
    root: &mut WidgetNode,
    snapshot: &UiStateSnapshot,
    host: &mut dyn WidgetHost,
    is_refresh: bool,
) -> Option<ScrollOffset> {
    root.walk_mut(&mut |node| {
        if !node.is_control() {
            return;
        }
        let Some(param) = node.param.clone() else {
            return;
        };

        let focused = snapshot.focused.as_deref() == Some(param.as_str());
        node.auto_focus = focused;
        node.has_focus = focused;
        if focused {
            host.focus(node);
        }

        if is_multi_list(node) {
            if let Some(top) = snapshot.top_values.get(&param) {
                node.auto_top_value = Some(*top);
                node.top_visible_index = Some(*top);
                host.restore_top_index(node, *top);
            }
        }
    });

    let scroll = snapshot.scroll?;
    if is_refresh {
        return Some(scroll);
    }
    apply_scroll(root, scroll, host);
    None
}

/// Scroll the root panel to an offset
pub fn apply_scroll(root: &mut WidgetNode, offset: ScrollOffset, host: &mut dyn WidgetHost) {
    root.scroll = Some(offset);
    host.scroll_to(root, offset);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FocusRecorder {
        focused: Vec<String>,
        scrolled: Vec<ScrollOffset>,
    }

    impl WidgetHost for FocusRecorder {
        fn focus(&mut self, node: &WidgetNode) {
            self.focused.push(node.name.clone());
        }

        fn scroll_to(&mut self, _node: &WidgetNode, offset: ScrollOffset) {
            self.scrolled.push(offset);
        }
    }

    fn control(kind: ControlKind, param: &str) -> WidgetNode {
        WidgetNode::new(WidgetRole::Control(kind), param).with_param(param)
    }

    fn tree() -> WidgetNode {
        let mut list = control(ControlKind::List, "products");
        list.multi_select = true;
        list.top_visible_index = Some(7);
        let mut text = control(ControlKind::TextBox, "name");
        text.has_focus = true;

        let mut root = WidgetNode::new(WidgetRole::PromptPanel, "root").with_children(vec![list, text]);
        root.scroll = Some(ScrollOffset { top: 120.0, left: 0.0 });
        root
    }

    #[test]
    fn test_capture() {
        let snapshot = capture_ui_state(&tree(), true);
        assert_eq!(snapshot.focused.as_deref(), Some("name"));
        assert_eq!(snapshot.top_values.get("products"), Some(&7));
        assert_eq!(snapshot.scroll, Some(ScrollOffset { top: 120.0, left: 0.0 }));

        let without_lists = capture_ui_state(&tree(), false);
        assert!(without_lists.top_values.is_empty());
    }

    #[test]
    fn test_restore_focus_and_scroll() {
        let snapshot = capture_ui_state(&tree(), true);
        let mut fresh = WidgetNode::new(WidgetRole::PromptPanel, "root").with_children(vec![
            control(ControlKind::TextBox, "name"),
            {
                let mut list = control(ControlKind::List, "products");
                list.multi_select = true;
                list
            },
        ]);
        let mut host = FocusRecorder::default();

        let deferred = restore_ui_state(&mut fresh, &snapshot, &mut host, false);
        assert!(deferred.is_none());
        assert_eq!(host.focused, vec!["name"]);
        assert_eq!(host.scrolled.len(), 1);
        assert!(fresh.children[0].auto_focus);
        assert_eq!(fresh.children[1].auto_top_value, Some(7));
    }

    #[test]
    fn test_refresh_defers_scroll() {
        let snapshot = capture_ui_state(&tree(), true);
        let mut fresh = tree();
        let mut host = FocusRecorder::default();

        let deferred = restore_ui_state(&mut fresh, &snapshot, &mut host, true);
        assert_eq!(deferred, Some(ScrollOffset { top: 120.0, left: 0.0 }));
        assert!(host.scrolled.is_empty());
    }
}
