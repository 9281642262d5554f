//! Password strength meter widget
//!
//! Attaches a live strength indicator to a password field: every time the
//! field changes, its entropy is estimated, classified into a strength
//! bucket and rendered.
//!
//! # Features
//!
//! - `async` (default): Enables the channel-fed event driver with cancellation support
//! - `tracing`: Enables logging via tracing crate
//!
//! # Environment Variables
//!
//! - `PWD_METER_OPTIONS_PATH`: Custom path to a JSON options file
//!   (default: `./assets/pwd-meter.json`)
//!
//! # Example
//!
//! ```rust
//! use pwd_meter::{Command, Document, Registry, UserOptions};
//!
//! let mut doc = Document::new();
//! let input = doc.create_element("input");
//! doc.set_attr(input, "type", "password");
//! doc.append_child(doc.body(), input);
//! let container = doc.create_element("div");
//! doc.append_child(doc.body(), container);
//!
//! let mut registry = Registry::new();
//! registry
//!     .apply(&mut doc, &[container], Command::Create(UserOptions::new().maximum(80.0)))
//!     .expect("container is free");
//!
//! doc.set_value(input, "correct horse");
//! doc.trigger(input, "keyup");
//!
//! registry
//!     .apply(&mut doc, &[container], Command::Destroy)
//!     .expect("meter is attached");
//! ```

// Internal modules
mod classify;
mod config;
mod dom;
mod engine;
mod events;
mod hooks;
mod meter;
mod registry;
mod ui;

#[cfg(feature = "async")]
mod driver;

// Public API
pub use classify::{Bucket, Payload, classify, default_buckets};
pub use config::{
    ConfigError, DEFAULT_EVENTS, DEFAULT_MAXIMUM, DEFAULT_TARGET, LIFECYCLE_KEYS, MapOptions,
    Options, RECOGNIZED_KEYS, Target, UserOptions, get_options_path, load_options,
    load_options_from_path, resolve,
};
pub use dom::{Document, Element, ElementId, EventSpec, Handler, ListenerKey, Selector, SelectorError};
pub use engine::{
    CharClassEngine, ClassSpec, EngineConfig, EngineOption, EntropyEngine, PredefinedClass, adopt,
    default_classes,
};
pub use events::{Binding, NAMESPACE, bind, namespace, unbind};
pub use hooks::{CreateHook, DestroyHook, MapHook, RenderData, RenderHook, UiHandle};
pub use meter::Meter;
pub use registry::{Command, MeterError, Registry};
pub use ui::{BAR_CLASS, DefaultUi, DefaultUiElements, TEXT_CLASS, TRACK_CLASS, caption};

#[cfg(feature = "async")]
pub use driver::{DomEvent, dispatch, drive};
