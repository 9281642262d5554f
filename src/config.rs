//! Meter configuration: defaults, caller overrides and the mapping view.
//!
//! Options are merged shallowly; nothing is validated. Caller options can
//! also be loaded from a JSON file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::classify::{Bucket, default_buckets};
use crate::dom::{Document, ElementId};
use crate::engine::{EngineConfig, EngineOption};
use crate::hooks::{CreateHook, DestroyHook, MapHook, RenderHook};
use crate::ui::DefaultUi;

/// First password input in the document.
pub const DEFAULT_TARGET: &str = "input[type=password]:first";

pub const DEFAULT_EVENTS: [&str; 2] = ["keydown", "keyup"];

pub const DEFAULT_MAXIMUM: f64 = 100.0;

/// Every key the resolver gives meaning to. Anything else is an
/// extension field passed through to the map hook.
pub const RECOGNIZED_KEYS: [&str; 9] = [
    "target", "on", "maximum", "buckets", "create", "destroy", "map", "render", "engine",
];

/// Keys that only matter to the meter lifecycle and never reach the map hook.
pub const LIFECYCLE_KEYS: [&str; 7] = ["target", "on", "create", "destroy", "map", "render", "engine"];

const OPTIONS_PATH_ENV: &str = "PWD_METER_OPTIONS_PATH";
const DEFAULT_OPTIONS_PATH: &str = "./assets/pwd-meter.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Options file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to read options file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Options file is empty")]
    EmptyFile,
    #[error("Invalid options file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Which element(s) a meter observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Selector(String),
    Element(ElementId),
    Elements(Vec<ElementId>),
}

impl Target {
    /// Concrete elements for this target. A selector that matches nothing,
    /// or a removed element, resolves to an empty set.
    pub fn resolve(&self, doc: &Document) -> Vec<ElementId> {
        match self {
            Target::Selector(selector) => doc.query(selector),
            Target::Element(id) => [*id].into_iter().filter(|id| doc.contains(*id)).collect(),
            Target::Elements(ids) => ids.iter().copied().filter(|id| doc.contains(*id)).collect(),
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::Selector(DEFAULT_TARGET.to_string())
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<ElementId> for Target {
    fn from(id: ElementId) -> Self {
        Target::Element(id)
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Target::Selector)
    }
}

/// Fully resolved options of one meter.
#[derive(Clone)]
pub struct Options {
    pub target: Target,
    pub on: Vec<String>,
    pub maximum: f64,
    pub buckets: Vec<Bucket>,
    pub create: Rc<dyn CreateHook>,
    pub destroy: Rc<dyn DestroyHook>,
    pub map: Rc<dyn MapHook>,
    pub render: Rc<dyn RenderHook>,
    pub engine: EngineOption,
    /// Extension fields, visible to the map hook.
    pub extra: Map<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        let ui = Rc::new(DefaultUi);
        Self {
            target: Target::default(),
            on: DEFAULT_EVENTS.iter().map(|e| e.to_string()).collect(),
            maximum: DEFAULT_MAXIMUM,
            buckets: default_buckets(),
            create: ui.clone(),
            destroy: ui.clone(),
            map: ui.clone(),
            render: ui,
            engine: EngineOption::Default,
            extra: Map::new(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("target", &self.target)
            .field("on", &self.on)
            .field("maximum", &self.maximum)
            .field("buckets", &self.buckets)
            .field("engine", &self.engine)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Keys present on these options: the recognized ones followed by
    /// extension fields.
    pub fn keys(&self) -> Vec<&str> {
        RECOGNIZED_KEYS
            .iter()
            .copied()
            .chain(
                self.extra
                    .keys()
                    .map(String::as_str)
                    .filter(|key| !RECOGNIZED_KEYS.contains(key)),
            )
            .collect()
    }
}

/// The options as seen by the map hook: everything but the lifecycle keys.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub maximum: f64,
    pub buckets: Vec<Bucket>,
    pub extra: Map<String, Value>,
}

impl MapOptions {
    /// Looks up an extension field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        MapOptions::from(&Options::default())
    }
}

impl From<&Options> for MapOptions {
    fn from(options: &Options) -> Self {
        let mut extra = options.extra.clone();
        for key in RECOGNIZED_KEYS {
            extra.remove(key);
        }
        Self {
            maximum: options.maximum,
            buckets: options.buckets.clone(),
            extra,
        }
    }
}

/// Caller-supplied overrides. Every `None` field falls back to the default.
#[derive(Clone, Default, Deserialize)]
pub struct UserOptions {
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default, deserialize_with = "deserialize_events")]
    pub on: Option<Vec<String>>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub buckets: Option<Vec<Bucket>>,
    #[serde(skip)]
    pub create: Option<Rc<dyn CreateHook>>,
    #[serde(skip)]
    pub destroy: Option<Rc<dyn DestroyHook>>,
    #[serde(skip)]
    pub map: Option<Rc<dyn MapHook>>,
    #[serde(skip)]
    pub render: Option<Rc<dyn RenderHook>>,
    #[serde(default, deserialize_with = "deserialize_engine")]
    pub engine: Option<EngineOption>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for UserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserOptions")
            .field("target", &self.target)
            .field("on", &self.on)
            .field("maximum", &self.maximum)
            .field("buckets", &self.buckets)
            .field("create", &self.create.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("map", &self.map.is_some())
            .field("render", &self.render.is_some())
            .field("engine", &self.engine)
            .field("extra", &self.extra)
            .finish()
    }
}

impl UserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Space separated event names, e.g. `"input change"`.
    pub fn on(mut self, events: &str) -> Self {
        self.on = Some(events.split_whitespace().map(str::to_string).collect());
        self
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn buckets(mut self, buckets: Vec<Bucket>) -> Self {
        self.buckets = Some(buckets);
        self
    }

    pub fn create(mut self, hook: impl CreateHook + 'static) -> Self {
        self.create = Some(Rc::new(hook));
        self
    }

    pub fn destroy(mut self, hook: impl DestroyHook + 'static) -> Self {
        self.destroy = Some(Rc::new(hook));
        self
    }

    pub fn map(mut self, hook: impl MapHook + 'static) -> Self {
        self.map = Some(Rc::new(hook));
        self
    }

    pub fn render(mut self, hook: impl RenderHook + 'static) -> Self {
        self.render = Some(Rc::new(hook));
        self
    }

    pub fn engine(mut self, engine: impl Into<EngineOption>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Adds an extension field.
    pub fn extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

fn deserialize_events<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Events {
        Spaced(String),
        List(Vec<String>),
    }

    Ok(Option::<Events>::deserialize(deserializer)?.map(|events| match events {
        Events::Spaced(raw) => raw.split_whitespace().map(str::to_string).collect(),
        Events::List(list) => list,
    }))
}

fn deserialize_engine<'de, D>(deserializer: D) -> Result<Option<EngineOption>, D::Error>
where
    D: Deserializer<'de>,
{
    let config = Option::<EngineConfig>::deserialize(deserializer)?;
    Ok(Some(config.map_or(EngineOption::Default, EngineOption::Config)))
}

/// Merges `user` over `defaults` and derives the map hook's view.
///
/// A field set in `user` replaces the default outright; extension fields
/// override key by key. Extension fields named like a recognized key are
/// dropped.
pub fn resolve(defaults: &Options, user: UserOptions) -> (Options, MapOptions) {
    let mut extra = defaults.extra.clone();
    extra.extend(user.extra);
    for key in RECOGNIZED_KEYS {
        extra.remove(key);
    }

    let options = Options {
        target: user.target.unwrap_or_else(|| defaults.target.clone()),
        on: user.on.unwrap_or_else(|| defaults.on.clone()),
        maximum: user.maximum.unwrap_or(defaults.maximum),
        buckets: user.buckets.unwrap_or_else(|| defaults.buckets.clone()),
        create: user.create.unwrap_or_else(|| Rc::clone(&defaults.create)),
        destroy: user.destroy.unwrap_or_else(|| Rc::clone(&defaults.destroy)),
        map: user.map.unwrap_or_else(|| Rc::clone(&defaults.map)),
        render: user.render.unwrap_or_else(|| Rc::clone(&defaults.render)),
        engine: user.engine.unwrap_or_else(|| defaults.engine.clone()),
        extra,
    };
    let map_options = MapOptions::from(&options);
    (options, map_options)
}

/// Returns the options file path.
///
/// Priority:
/// 1. Environment variable `PWD_METER_OPTIONS_PATH`
/// 2. Default path `./assets/pwd-meter.json`
pub fn get_options_path() -> PathBuf {
    std::env::var(OPTIONS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OPTIONS_PATH))
}

/// Loads caller options from the file named by [`get_options_path`].
///
/// # Errors
///
/// Returns error if the file does not exist, cannot be read, is empty, or
/// is not a valid options document.
pub fn load_options() -> Result<UserOptions, ConfigError> {
    load_options_from_path(get_options_path())
}

/// Loads caller options from a JSON file.
///
/// # Example
///
/// ```rust,ignore
/// let user = pwd_meter::load_options_from_path("config/meter.json")?;
/// registry.apply(&mut doc, &[container], Command::Create(user))?;
/// ```
pub fn load_options_from_path<P: AsRef<Path>>(path: P) -> Result<UserOptions, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        #[cfg(feature = "tracing")]
        tracing::error!("Options loading FAILED: FileNotFound {:?}", path);
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;

    if content.trim().is_empty() {
        #[cfg(feature = "tracing")]
        tracing::error!("Options loading FAILED: Empty file {:?}", path);
        return Err(ConfigError::EmptyFile);
    }

    let options: UserOptions = serde_json::from_str(&content)?;

    #[cfg(feature = "tracing")]
    tracing::info!("Options loaded from {:?}: {} extension fields", path, options.extra.len());

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PredefinedClass;
    use crate::hooks::RenderData;
    use serde_json::json;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value); }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key); }
    }

    fn write_options(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        write!(temp_file, "{}", content).expect("Failed to write");
        temp_file
    }

    #[test]
    fn test_resolve_defaults() {
        let (options, map_options) = resolve(&Options::default(), UserOptions::default());
        assert_eq!(options.target, Target::Selector(DEFAULT_TARGET.into()));
        assert_eq!(options.on, vec!["keydown", "keyup"]);
        assert_eq!(options.maximum, 100.0);
        assert_eq!(options.buckets.len(), 4);
        assert!(matches!(options.engine, EngineOption::Default));
        assert_eq!(map_options.maximum, 100.0);
        assert_eq!(map_options.buckets, default_buckets());
        assert!(map_options.extra.is_empty());
    }

    #[test]
    fn test_resolve_shallow_override() {
        let user = UserOptions::new()
            .maximum(80.0)
            .on("input")
            .buckets(vec![Bucket::new().with("strength", "any")]);
        let (options, map_options) = resolve(&Options::default(), user);

        assert_eq!(options.maximum, 80.0);
        assert_eq!(options.on, vec!["input"]);
        assert_eq!(options.buckets.len(), 1);
        assert_eq!(options.target, Target::default());
        assert_eq!(map_options.maximum, 80.0);
        assert_eq!(map_options.buckets.len(), 1);
    }

    #[test]
    fn test_extension_fields_reach_map_options() {
        let user = UserOptions::new().extra("locale", "it").extra("render", "ignored");
        let (options, map_options) = resolve(&Options::default(), user);

        assert_eq!(map_options.get("locale"), Some(&json!("it")));
        assert_eq!(map_options.get("render"), None);
        assert!(options.keys().contains(&"locale"));
        for key in LIFECYCLE_KEYS {
            assert!(map_options.get(key).is_none());
        }
    }

    #[test]
    fn test_extension_fields_cannot_shadow_recognized_keys() {
        let user = UserOptions::new()
            .extra("maximum", 5)
            .extra("render", 1)
            .extra("locale", "it");
        let (options, map_options) = resolve(&Options::default(), user);

        let keys = options.keys();
        assert_eq!(keys.len(), RECOGNIZED_KEYS.len() + 1);
        assert_eq!(keys.iter().filter(|&&key| key == "maximum").count(), 1);
        assert_eq!(keys.iter().filter(|&&key| key == "render").count(), 1);
        assert!(!options.extra.contains_key("maximum"));
        assert_eq!(map_options.maximum, 100.0);
        assert_eq!(map_options.get("maximum"), None);
        assert_eq!(map_options.get("locale"), Some(&json!("it")));
    }

    #[test]
    fn test_user_hook_replaces_default() {
        let map = |entropy: f64, _: &MapOptions| {
            let mut data = RenderData::new(entropy, 0.0);
            data.insert("custom", true);
            data
        };
        let (options, map_options) = resolve(&Options::default(), UserOptions::new().map(map));
        let data = options.map.map(3.0, &map_options);
        assert_eq!(data.get("custom"), Some(&json!(true)));
    }

    #[test]
    fn test_target_resolution() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.append_child(doc.body(), input);
        doc.set_attr(input, "type", "password");

        assert_eq!(Target::default().resolve(&doc), vec![input]);
        assert_eq!(Target::from(input).resolve(&doc), vec![input]);
        assert!(Target::from("#missing").resolve(&doc).is_empty());

        doc.remove(input);
        assert!(Target::from(input).resolve(&doc).is_empty());
    }

    #[test]
    fn test_deserialize_user_options() {
        let user: UserOptions = serde_json::from_value(json!({
            "target": "#password",
            "on": "input change",
            "maximum": 120,
            "buckets": [{ "max": 50, "strength": "weak" }, { "min": 50, "strength": "strong" }],
            "engine": { "classes": ["lowercase", "numeric"] },
            "theme": "dark"
        }))
        .unwrap();

        assert_eq!(user.target, Some(Target::Selector("#password".into())));
        assert_eq!(user.on, Some(vec!["input".to_string(), "change".to_string()]));
        assert_eq!(user.maximum, Some(120.0));
        assert_eq!(user.buckets.as_ref().map(Vec::len), Some(2));
        match user.engine {
            Some(EngineOption::Config(config)) => assert_eq!(
                config,
                EngineConfig::with_classes([PredefinedClass::Lowercase, PredefinedClass::Numeric])
            ),
            other => panic!("Expected engine config, got {:?}", other),
        }
        assert_eq!(user.extra.get("theme"), Some(&json!("dark")));
        assert!(user.map.is_none());
    }

    #[test]
    fn test_deserialize_events_list_and_null_engine() {
        let user: UserOptions =
            serde_json::from_value(json!({ "on": ["keyup", "paste"], "engine": null })).unwrap();
        assert_eq!(user.on, Some(vec!["keyup".to_string(), "paste".to_string()]));
        assert!(matches!(user.engine, Some(EngineOption::Default)));
    }

    #[test]
    #[serial]
    fn test_get_options_path_default() {
        remove_env(OPTIONS_PATH_ENV);
        assert_eq!(get_options_path(), PathBuf::from(DEFAULT_OPTIONS_PATH));
    }

    #[test]
    #[serial]
    fn test_load_options_from_env() {
        let temp_file = write_options(r#"{ "maximum": 64, "on": "input" }"#);
        set_env(OPTIONS_PATH_ENV, temp_file.path().to_str().unwrap());

        let user = load_options().expect("options should load");
        assert_eq!(user.maximum, Some(64.0));
        assert_eq!(user.on, Some(vec!["input".to_string()]));

        remove_env(OPTIONS_PATH_ENV);
    }

    #[test]
    #[serial]
    fn test_load_options_file_not_found() {
        set_env(OPTIONS_PATH_ENV, "/nonexistent/path/pwd-meter.json");

        match load_options() {
            Err(ConfigError::FileNotFound(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path/pwd-meter.json"))
            }
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }

        remove_env(OPTIONS_PATH_ENV);
    }

    #[test]
    fn test_load_options_empty_file() {
        let temp_file = write_options("   \n");
        let result = load_options_from_path(temp_file.path());
        assert!(matches!(result, Err(ConfigError::EmptyFile)));
    }

    #[test]
    fn test_load_options_malformed() {
        let temp_file = write_options(r#"{ "maximum": "#);
        let result = load_options_from_path(temp_file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
