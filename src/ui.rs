//! Default UI: a track with a coloured bar and a caption.

use crate::classify::classify;
use crate::config::MapOptions;
use crate::dom::{Document, ElementId};
use crate::hooks::{CreateHook, DestroyHook, MapHook, RenderData, RenderHook, UiHandle};

pub const TRACK_CLASS: &str = "entropizer-track";
pub const BAR_CLASS: &str = "entropizer-bar";
pub const TEXT_CLASS: &str = "entropizer-text";

/// Elements built by [`DefaultUi`]'s create hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultUiElements {
    pub track: ElementId,
    pub bar: ElementId,
    pub text: ElementId,
}

/// Stock implementation of all four hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUi;

impl DefaultUi {
    fn div(doc: &mut Document, class: &str, parent: ElementId) -> ElementId {
        let id = doc.create_element("div");
        doc.add_class(id, class);
        doc.append_child(parent, id);
        id
    }
}

impl CreateHook for DefaultUi {
    fn create(&self, doc: &mut Document, container: ElementId) -> UiHandle {
        let track = Self::div(doc, TRACK_CLASS, container);
        let bar = Self::div(doc, BAR_CLASS, track);
        let text = Self::div(doc, TEXT_CLASS, track);
        UiHandle::new(DefaultUiElements { track, bar, text })
    }
}

impl DestroyHook for DefaultUi {
    fn destroy(&self, doc: &mut Document, ui: &UiHandle) {
        if let Some(elements) = ui.downcast_ref::<DefaultUiElements>() {
            doc.remove(elements.track);
        }
    }
}

impl MapHook for DefaultUi {
    /// Classifies `entropy` and merges the bucket's fields over
    /// `entropy` / `percent`. With no matching bucket nothing is merged.
    fn map(&self, entropy: f64, options: &MapOptions) -> RenderData {
        let percent = (entropy / options.maximum).min(1.0) * 100.0;
        let mut data = RenderData::new(entropy, percent);
        if let Some(bucket) = classify(entropy, &options.buckets) {
            data.merge(bucket);
        }
        data
    }
}

impl RenderHook for DefaultUi {
    fn render(&self, doc: &mut Document, data: &RenderData, ui: &UiHandle) {
        let Some(elements) = ui.downcast_ref::<DefaultUiElements>() else {
            return;
        };
        if let Some(color) = data.get_str("color") {
            doc.css(elements.bar, "background-color", color);
        }
        doc.css(elements.bar, "width", &format!("{}%", data.percent()));
        doc.set_html(elements.text, &caption(data));
    }
}

/// `"<strength> (<bits> bits)"`, bits rounded to the nearest integer.
pub fn caption(data: &RenderData) -> String {
    format!(
        "{} ({} bits)",
        data.get_str("strength").unwrap_or_default(),
        data.entropy().round()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Bucket;

    fn default_map(entropy: f64) -> RenderData {
        DefaultUi.map(entropy, &MapOptions::default())
    }

    #[test]
    fn test_create_and_destroy() {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        doc.append_child(doc.body(), container);

        let ui = DefaultUi.create(&mut doc, container);
        let elements = *ui.downcast_ref::<DefaultUiElements>().unwrap();
        assert_eq!(doc.children(container), &[elements.track]);
        assert_eq!(doc.children(elements.track), &[elements.bar, elements.text]);
        assert!(doc.has_class(elements.bar, BAR_CLASS));

        DefaultUi.destroy(&mut doc, &ui);
        assert!(doc.children(container).is_empty());
        assert!(!doc.contains(elements.bar));
        assert!(doc.contains(container));
    }

    #[test]
    fn test_map_default_buckets() {
        let data = default_map(0.0);
        assert_eq!(data.entropy(), 0.0);
        assert_eq!(data.percent(), 0.0);
        assert_eq!(data.get_str("strength"), Some("poor"));
        assert_eq!(data.get_str("color"), Some("#d00"));
        assert_eq!(data.get("min"), None);

        assert_eq!(default_map(62.0).get_str("strength"), Some("good"));
    }

    #[test]
    fn test_map_percent_clamp() {
        let options = MapOptions {
            maximum: 80.0,
            ..MapOptions::default()
        };
        assert!((DefaultUi.map(64.0, &options).percent() - 80.0).abs() < 1e-9);
        assert_eq!(DefaultUi.map(80.0, &options).percent(), 100.0);
        assert_eq!(DefaultUi.map(500.0, &options).percent(), 100.0);
    }

    #[test]
    fn test_map_without_matching_bucket() {
        let options = MapOptions {
            buckets: vec![Bucket::new().min(50.0).with("strength", "strong")],
            ..MapOptions::default()
        };
        let data = DefaultUi.map(10.0, &options);
        assert_eq!(data.fields().len(), 2);
        assert_eq!(data.get_str("strength"), None);
    }

    #[test]
    fn test_render_updates_bar_and_caption() {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        let ui = DefaultUi.create(&mut doc, container);
        let elements = *ui.downcast_ref::<DefaultUiElements>().unwrap();

        DefaultUi.render(&mut doc, &default_map(50.0), &ui);

        assert_eq!(doc.style(elements.bar, "background-color"), Some("#f80"));
        assert_eq!(doc.style(elements.bar, "width"), Some("50%"));
        assert_eq!(doc.html(elements.text), Some("ok (50 bits)"));
    }

    #[test]
    fn test_render_ignores_foreign_handle() {
        let mut doc = Document::new();
        DefaultUi.render(&mut doc, &default_map(1.0), &UiHandle::new("not ours"));
    }

    #[test]
    fn test_caption_rounds_bits() {
        assert_eq!(caption(&default_map(14.101)), "poor (14 bits)");
        assert_eq!(caption(&default_map(18.802)), "poor (19 bits)");
        assert_eq!(caption(&RenderData::new(3.0, 3.0)), " (3 bits)");
    }
}
