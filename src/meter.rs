//! Meter - one widget instance: construction, updates and teardown.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use secrecy::SecretString;

use crate::config::{MapOptions, Options, UserOptions, resolve};
use crate::dom::{Document, ElementId, Handler};
use crate::engine::{EntropyEngine, adopt};
use crate::events::{self, Binding};
use crate::hooks::{MapHook, RenderData, RenderHook, UiHandle};

/// Everything an update needs. Shared between the meter and its event
/// listeners.
struct Pipeline {
    engine: Arc<dyn EntropyEngine>,
    map: Rc<dyn MapHook>,
    render: Rc<dyn RenderHook>,
    map_options: MapOptions,
    ui: UiHandle,
    targets: Vec<ElementId>,
}

impl Pipeline {
    /// Read -> evaluate -> map -> render.
    fn run(&self, doc: &mut Document) -> RenderData {
        let password = self.read(doc);
        let entropy = self.engine.evaluate(&password);
        let data = self.map.map(entropy, &self.map_options);
        self.render.render(doc, &data, &self.ui);
        data
    }

    /// Value of the first target; empty when there is none or it is unset.
    fn read(&self, doc: &Document) -> SecretString {
        let value = self
            .targets
            .first()
            .and_then(|&id| doc.value(id))
            .unwrap_or_default();
        SecretString::new(value.to_string().into())
    }
}

/// A live strength meter attached to one container.
///
/// Dropping a `Meter` without calling [`Meter::destroy`] leaves its
/// listeners and UI in the document.
pub struct Meter {
    container: ElementId,
    options: Options,
    pipeline: Rc<Pipeline>,
    binding: Binding,
}

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meter")
            .field("container", &self.container)
            .field("targets", &self.pipeline.targets)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl Meter {
    /// Builds a meter in `container` using the stock defaults.
    pub fn new(doc: &mut Document, container: ElementId, user: UserOptions) -> Self {
        Self::with_defaults(doc, container, &Options::default(), user)
    }

    /// Builds a meter in `container`, resolving `user` over `defaults`.
    ///
    /// The meter is rendered once before this returns, so the display
    /// already reflects whatever the target holds.
    pub fn with_defaults(
        doc: &mut Document,
        container: ElementId,
        defaults: &Options,
        user: UserOptions,
    ) -> Self {
        let (options, map_options) = resolve(defaults, user);
        let engine = adopt(&options.engine);
        let ui = options.create.create(doc, container);
        let targets = options.target.resolve(doc);

        let pipeline = Rc::new(Pipeline {
            engine,
            map: Rc::clone(&options.map),
            render: Rc::clone(&options.render),
            map_options,
            ui,
            targets,
        });

        let handler: Handler = {
            let pipeline = Rc::clone(&pipeline);
            Rc::new(move |doc: &mut Document| {
                pipeline.run(doc);
            })
        };
        let binding = events::bind(
            doc,
            &pipeline.targets,
            &events::namespace(options.on.as_slice()),
            handler,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "meter created in {} observing {} target(s) on '{}'",
            container,
            pipeline.targets.len(),
            binding.events()
        );

        let meter = Meter {
            container,
            options,
            pipeline,
            binding,
        };
        meter.update(doc);
        meter
    }

    /// Runs the update pipeline once and returns what was rendered.
    pub fn update(&self, doc: &mut Document) -> RenderData {
        self.pipeline.run(doc)
    }

    /// Removes this meter's listeners and lets the destroy hook tear down
    /// its UI. Listeners of other meters, and non-namespaced listeners, on
    /// the same target are left alone.
    pub fn destroy(self, doc: &mut Document) {
        let _removed = events::unbind(doc, &self.binding);
        self.options.destroy.destroy(doc, &self.pipeline.ui);

        #[cfg(feature = "tracing")]
        tracing::debug!("meter in {} destroyed, {} listener(s) removed", self.container, _removed);
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn map_options(&self) -> &MapOptions {
        &self.pipeline.map_options
    }

    pub fn engine(&self) -> &Arc<dyn EntropyEngine> {
        &self.pipeline.engine
    }

    pub fn ui(&self) -> &UiHandle {
        &self.pipeline.ui
    }

    /// Elements the meter reads from and listens on.
    pub fn targets(&self) -> &[ElementId] {
        &self.pipeline.targets
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}
