//! Async event driver.
//!
//! Feeds page events from a channel into a [`Document`] one at a time, so
//! every meter update still runs to completion before the next event.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dom::{Document, ElementId};

/// An event delivered to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// Replaces the element's value without firing anything.
    SetValue { target: ElementId, value: String },
    /// Fires one event (`name` or `name.namespace`).
    Fire { target: ElementId, event: String },
    /// A keystroke leaving `value` in the field: `keydown`, value change,
    /// `input`, `keyup`.
    Type { target: ElementId, value: String },
}

/// Applies one event synchronously. Returns the number of handlers run.
pub fn dispatch(doc: &mut Document, event: DomEvent) -> usize {
    match event {
        DomEvent::SetValue { target, value } => {
            doc.set_value(target, &value);
            0
        }
        DomEvent::Fire { target, event } => doc.trigger(target, &event),
        DomEvent::Type { target, value } => {
            let mut handled = doc.trigger(target, "keydown");
            doc.set_value(target, &value);
            handled += doc.trigger(target, "input");
            handled + doc.trigger(target, "keyup")
        }
    }
}

/// Drains `rx` into `doc` until the channel closes or `token` is cancelled.
///
/// Returns the number of events applied.
pub async fn drive(
    doc: &mut Document,
    mut rx: mpsc::Receiver<DomEvent>,
    token: CancellationToken,
) -> usize {
    let mut applied = 0;
    loop {
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::info!("event driver cancelled after {} event(s)", applied);
                break;
            }
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        dispatch(doc, event);
        applied += 1;
    }
    applied
}
