//! Registry - attaches meters to containers and looks them up again.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::{Options, UserOptions};
use crate::dom::{Document, ElementId};
use crate::meter::Meter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeterError {
    #[error("No meter attached to container {0}")]
    NotAttached(ElementId),
    #[error("A meter is already attached to container {0}")]
    AlreadyAttached(ElementId),
    #[error("Container {0} is listed more than once")]
    DuplicateContainer(ElementId),
}

/// What [`Registry::apply`] should do with each container.
#[derive(Debug, Clone)]
pub enum Command {
    /// Build one meter per container.
    Create(UserOptions),
    /// Destroy the meter stored for each container.
    Destroy,
}

impl Default for Command {
    fn default() -> Self {
        Command::Create(UserOptions::default())
    }
}

impl From<UserOptions> for Command {
    fn from(options: UserOptions) -> Self {
        Command::Create(options)
    }
}

/// Owns the meters attached to containers, one per container.
#[derive(Debug, Default)]
pub struct Registry {
    defaults: Options,
    meters: HashMap<ElementId, Meter>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose meters resolve caller options over `defaults`.
    pub fn with_defaults(defaults: Options) -> Self {
        Self {
            defaults,
            meters: HashMap::new(),
        }
    }

    /// Runs `command` against every container and hands the collection back.
    ///
    /// The whole collection is checked before anything changes: either
    /// every container is processed or none is.
    ///
    /// # Errors
    ///
    /// - [`MeterError::AlreadyAttached`] when creating on a container that
    ///   already has a meter.
    /// - [`MeterError::NotAttached`] when destroying a container with no meter.
    /// - [`MeterError::DuplicateContainer`] when a container appears twice in
    ///   `containers`.
    pub fn apply<'a>(
        &mut self,
        doc: &mut Document,
        containers: &'a [ElementId],
        command: Command,
    ) -> Result<&'a [ElementId], MeterError> {
        match command {
            Command::Create(options) => self.attach(doc, containers, options),
            Command::Destroy => self.destroy(doc, containers),
        }
    }

    /// Builds one meter per container.
    pub fn attach<'a>(
        &mut self,
        doc: &mut Document,
        containers: &'a [ElementId],
        options: UserOptions,
    ) -> Result<&'a [ElementId], MeterError> {
        unique(containers)?;
        for &container in containers {
            if self.meters.contains_key(&container) {
                #[cfg(feature = "tracing")]
                tracing::error!("Meter creation FAILED: container {} already attached", container);
                return Err(MeterError::AlreadyAttached(container));
            }
        }

        for &container in containers {
            let meter = Meter::with_defaults(doc, container, &self.defaults, options.clone());
            self.meters.insert(container, meter);
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Attached {} meter(s)", containers.len());

        Ok(containers)
    }

    /// Destroys and forgets the meter of every container.
    pub fn destroy<'a>(
        &mut self,
        doc: &mut Document,
        containers: &'a [ElementId],
    ) -> Result<&'a [ElementId], MeterError> {
        unique(containers)?;
        for &container in containers {
            if !self.meters.contains_key(&container) {
                #[cfg(feature = "tracing")]
                tracing::error!("Meter destroy FAILED: nothing attached to {}", container);
                return Err(MeterError::NotAttached(container));
            }
        }

        for container in containers {
            if let Some(meter) = self.meters.remove(container) {
                meter.destroy(doc);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Destroyed {} meter(s)", containers.len());

        Ok(containers)
    }

    pub fn get(&self, container: ElementId) -> Option<&Meter> {
        self.meters.get(&container)
    }

    pub fn contains(&self, container: ElementId) -> bool {
        self.meters.contains_key(&container)
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    pub fn defaults(&self) -> &Options {
        &self.defaults
    }
}

fn unique(containers: &[ElementId]) -> Result<(), MeterError> {
    let mut seen = HashSet::new();
    match containers.iter().find(|&&container| !seen.insert(container)) {
        Some(&container) => {
            #[cfg(feature = "tracing")]
            tracing::error!("Container {} listed more than once", container);
            Err(MeterError::DuplicateContainer(container))
        }
        None => Ok(()),
    }
}
