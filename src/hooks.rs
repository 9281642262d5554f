//! Pluggable UI hooks and the values that flow between them.
//!
//! Each hook is its own capability trait so callers can swap one without
//! touching the others. Any closure with the matching signature is a hook.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::classify::Payload;
use crate::config::MapOptions;
use crate::dom::{Document, ElementId};

/// Opaque value produced by a [`CreateHook`] and handed back, unchanged,
/// to the render and destroy hooks of the same meter.
#[derive(Clone)]
pub struct UiHandle(Rc<dyn Any>);

impl UiHandle {
    pub fn new<T: Any>(ui: T) -> Self {
        UiHandle(Rc::new(ui))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UiHandle(..)")
    }
}

/// Payload handed from the map hook to the render hook.
///
/// The default map hook fills `entropy` and `percent` and merges the
/// matched bucket's fields on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderData(Map<String, Value>);

impl RenderData {
    pub fn new(entropy: f64, percent: f64) -> Self {
        let mut fields = Map::new();
        fields.insert("entropy".to_string(), Value::from(entropy));
        fields.insert("percent".to_string(), Value::from(percent));
        RenderData(fields)
    }

    /// Shallow merge; keys in `payload` win.
    pub fn merge(&mut self, payload: Payload) {
        self.0.extend(payload);
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn entropy(&self) -> f64 {
        self.get("entropy").and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn percent(&self) -> f64 {
        self.get("percent").and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

pub trait CreateHook {
    /// Builds the meter's UI inside `container`.
    fn create(&self, doc: &mut Document, container: ElementId) -> UiHandle;
}

pub trait DestroyHook {
    /// Releases whatever the create hook built.
    fn destroy(&self, doc: &mut Document, ui: &UiHandle);
}

pub trait MapHook {
    /// Turns an entropy estimate into render data.
    fn map(&self, entropy: f64, options: &MapOptions) -> RenderData;
}

pub trait RenderHook {
    fn render(&self, doc: &mut Document, data: &RenderData, ui: &UiHandle);
}

impl<F> CreateHook for F
where
    F: Fn(&mut Document, ElementId) -> UiHandle,
{
    fn create(&self, doc: &mut Document, container: ElementId) -> UiHandle {
        self(doc, container)
    }
}

impl<F> DestroyHook for F
where
    F: Fn(&mut Document, &UiHandle),
{
    fn destroy(&self, doc: &mut Document, ui: &UiHandle) {
        self(doc, ui)
    }
}

impl<F> MapHook for F
where
    F: Fn(f64, &MapOptions) -> RenderData,
{
    fn map(&self, entropy: f64, options: &MapOptions) -> RenderData {
        self(entropy, options)
    }
}

impl<F> RenderHook for F
where
    F: Fn(&mut Document, &RenderData, &UiHandle),
{
    fn render(&self, doc: &mut Document, data: &RenderData, ui: &UiHandle) {
        self(doc, data, ui)
    }
}
