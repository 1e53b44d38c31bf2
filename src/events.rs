//! Engine event dispatch
//!
//! Consumers register handlers per event kind; handlers for one kind fire in
//! registration order. Payloads carry the resolved node object, never a raw
//! index.

use std::collections::HashMap;

use crate::graph::NodeInfo;

/// Pan/zoom state snapshot delivered with [`ViewerEvent::Zoom`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformInfo {
    pub tx: f32,
    pub ty: f32,
    pub scale: f32,
}

/// Events the engine emits.
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    /// A node was clicked and became the selection.
    NodeSelect(NodeInfo),
    /// Any click inside the widget, with the node under the cursor if any.
    Click { node: Option<NodeInfo> },
    /// The cursor entered a node.
    NodeOver(NodeInfo),
    /// The cursor left a node for empty space.
    NodeOut(NodeInfo),
    /// The pan/zoom transform changed.
    Zoom(TransformInfo),
}

/// Event kinds usable as subscription keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeSelect,
    Click,
    NodeOver,
    NodeOut,
    Zoom,
}

impl ViewerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ViewerEvent::NodeSelect(_) => EventKind::NodeSelect,
            ViewerEvent::Click { .. } => EventKind::Click,
            ViewerEvent::NodeOver(_) => EventKind::NodeOver,
            ViewerEvent::NodeOut(_) => EventKind::NodeOut,
            ViewerEvent::Zoom(_) => EventKind::Zoom,
        }
    }
}

type Handler = Box<dyn FnMut(&ViewerEvent)>;

/// Handler registry keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler; multiple handlers per kind fire in the order
    /// they were registered.
    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&ViewerEvent) + 'static) {
        self.handlers
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    /// Delivers one event to every handler registered for its kind.
    pub fn emit(&mut self, event: &ViewerEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_handlers_fire_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            bus.on(EventKind::Zoom, move |_| seen.borrow_mut().push(tag));
        }
        bus.emit(&ViewerEvent::Zoom(TransformInfo {
            tx: 0.0,
            ty: 0.0,
            scale: 1.0,
        }));
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_only_matching_kind_fires() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        {
            let count = Rc::clone(&count);
            bus.on(EventKind::Click, move |_| *count.borrow_mut() += 1);
        }
        bus.emit(&ViewerEvent::Zoom(TransformInfo {
            tx: 0.0,
            ty: 0.0,
            scale: 2.0,
        }));
        assert_eq!(*count.borrow(), 0);
        bus.emit(&ViewerEvent::Click { node: None });
        assert_eq!(*count.borrow(), 1);
    }
}
