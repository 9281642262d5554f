//! Namespaced event binding.
//!
//! Every listener a meter installs carries the library namespace and the
//! key of the `on` call that created it, so a meter can later remove its
//! own listeners without touching anyone else's on the same element.

use crate::dom::{Document, ElementId, EventSpec, Handler, ListenerKey};

/// Namespace suffixed to every event a meter listens to.
pub const NAMESPACE: &str = "entropizer";

/// Puts each event name into [`NAMESPACE`].
///
/// Only the name part of each entry is kept: `keyup.mine` binds as
/// `keyup.entropizer`, so `.entropizer` always addresses every meter listener.
pub fn namespace<S: AsRef<str>>(events: &[S]) -> Vec<EventSpec> {
    events
        .iter()
        .map(|event| EventSpec {
            name: EventSpec::parse(event.as_ref()).name,
            namespace: Some(NAMESPACE.to_string()),
        })
        .collect()
}

/// Listeners installed by one [`bind`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    events: String,
    listeners: Vec<(ElementId, ListenerKey)>,
}

impl Binding {
    pub fn targets(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.listeners.iter().map(|(id, _)| *id)
    }

    /// The namespaced event string, e.g. `"keydown.entropizer keyup.entropizer"`.
    pub fn events(&self) -> &str {
        &self.events
    }
}

/// Attaches `handler` to every target for exactly the given events.
pub fn bind(
    doc: &mut Document,
    targets: &[ElementId],
    events: &[EventSpec],
    handler: Handler,
) -> Binding {
    let events = events
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let listeners = targets
        .iter()
        .map(|&target| (target, doc.on(target, &events, handler.clone())))
        .collect();
    Binding { events, listeners }
}

/// Removes the listeners `binding` installed. Returns how many were removed.
pub fn unbind(doc: &mut Document, binding: &Binding) -> usize {
    binding
        .listeners
        .iter()
        .map(|&(target, key)| doc.off(target, &binding.events, Some(key)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_handler() -> (Rc<Cell<usize>>, Handler) {
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        (hits, Rc::new(move |_: &mut Document| seen.set(seen.get() + 1)))
    }

    #[test]
    fn test_namespace_appends_tag() {
        let specs = namespace(&["keydown", "keyup"]);
        let rendered: Vec<String> = specs.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["keydown.entropizer", "keyup.entropizer"]);
    }

    #[test]
    fn test_namespace_replaces_caller_namespace() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        let (hits, handler) = counting_handler();

        let specs = namespace(&["keyup.mine"]);
        assert_eq!(specs[0].to_string(), "keyup.entropizer");

        bind(&mut doc, &[input], &specs, handler);
        assert_eq!(doc.listener_count(input, ".entropizer"), 1);
        assert_eq!(doc.listener_count(input, ".mine"), 0);
        doc.trigger(input, "keyup");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_bind_fires_on_raw_event() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        let (hits, handler) = counting_handler();

        let binding = bind(&mut doc, &[input], &namespace(&["keyup"]), handler);

        assert_eq!(binding.targets().collect::<Vec<_>>(), vec![input]);
        doc.trigger(input, "keyup");
        doc.trigger(input, "keydown");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unbind_leaves_other_bindings_intact() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        let (a_hits, a) = counting_handler();
        let (b_hits, b) = counting_handler();
        let (outside_hits, outside) = counting_handler();
        let events = namespace(&["keydown", "keyup"]);

        let binding_a = bind(&mut doc, &[input], &events, a);
        let _binding_b = bind(&mut doc, &[input], &events, b);
        doc.on(input, "keyup", outside);

        assert_eq!(unbind(&mut doc, &binding_a), 2);
        doc.trigger(input, "keyup");

        assert_eq!(a_hits.get(), 0);
        assert_eq!(b_hits.get(), 1);
        assert_eq!(outside_hits.get(), 1);
    }

    #[test]
    fn test_unbind_twice_is_harmless() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        let (_, handler) = counting_handler();
        let binding = bind(&mut doc, &[input], &namespace(&["keyup"]), handler);

        assert_eq!(unbind(&mut doc, &binding), 1);
        assert_eq!(unbind(&mut doc, &binding), 0);
    }

    #[test]
    fn test_bind_without_targets() {
        let mut doc = Document::new();
        let (_, handler) = counting_handler();
        let binding = bind(&mut doc, &[], &namespace(&["keyup"]), handler);
        assert_eq!(binding.targets().count(), 0);
        assert_eq!(unbind(&mut doc, &binding), 0);
    }
}
