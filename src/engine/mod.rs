//! Entropy engines and the adapter that picks one for a meter.

mod classes;

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use classes::CharClass;
pub use classes::{ClassSpec, PredefinedClass, default_classes};

/// Estimates the entropy of a password, in bits.
///
/// Implementations must be stateless: one engine is shared by every meter
/// that adopts it.
pub trait EntropyEngine: Send + Sync {
    /// Returns a non-negative entropy estimate; `0.0` for an empty password.
    fn evaluate(&self, password: &SecretString) -> f64;
}

/// Configuration for a [`CharClassEngine`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Classes making up the alphabet. `None` selects [`default_classes`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<ClassSpec>>,
}

impl EngineConfig {
    pub fn with_classes<I, C>(classes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassSpec>,
    {
        Self {
            classes: Some(classes.into_iter().map(Into::into).collect()),
        }
    }
}

/// Alphabet-size entropy estimator.
///
/// The alphabet is the summed size of every configured class that has at
/// least one member in the password; entropy is `log2(alphabet) * length`.
#[derive(Debug, Clone)]
pub struct CharClassEngine {
    classes: Vec<CharClass>,
}

impl CharClassEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let classes = match &config.classes {
            Some(specs) => specs.iter().map(CharClass::from).collect(),
            None => default_classes().iter().map(CharClass::from).collect(),
        };
        Self { classes }
    }
}

impl Default for CharClassEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl EntropyEngine for CharClassEngine {
    fn evaluate(&self, password: &SecretString) -> f64 {
        let pwd = password.expose_secret();
        if pwd.is_empty() {
            return 0.0;
        }
        let alphabet: usize = self.classes.iter().map(|c| c.contribution(pwd)).sum();
        if alphabet == 0 {
            return 0.0;
        }
        (alphabet as f64).log2() * pwd.chars().count() as f64
    }
}

/// Which engine a meter should use.
#[derive(Clone, Default)]
pub enum EngineOption {
    /// A [`CharClassEngine`] with the default configuration.
    #[default]
    Default,
    /// A fresh [`CharClassEngine`] built from this configuration.
    Config(EngineConfig),
    /// An existing engine, shared as-is.
    Instance(Arc<dyn EntropyEngine>),
}

impl fmt::Debug for EngineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineOption::Default => f.write_str("Default"),
            EngineOption::Config(config) => f.debug_tuple("Config").field(config).finish(),
            EngineOption::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

impl From<EngineConfig> for EngineOption {
    fn from(config: EngineConfig) -> Self {
        EngineOption::Config(config)
    }
}

impl From<Arc<dyn EntropyEngine>> for EngineOption {
    fn from(engine: Arc<dyn EntropyEngine>) -> Self {
        EngineOption::Instance(engine)
    }
}

/// Resolves an [`EngineOption`] to the engine a meter will evaluate with.
///
/// Live instances are returned by reference; anything else builds a new
/// engine.
pub fn adopt(option: &EngineOption) -> Arc<dyn EntropyEngine> {
    match option {
        EngineOption::Instance(engine) => Arc::clone(engine),
        EngineOption::Config(config) => Arc::new(CharClassEngine::new(config)),
        EngineOption::Default => Arc::new(CharClassEngine::default()),
    }
}
