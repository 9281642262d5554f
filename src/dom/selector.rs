//! Minimal CSS selector support for locating meter targets.
//!
//! Grammar: whitespace separated compounds (descendant combinator), each
//! made of an optional tag, `#id`, `.class` and `[attr]` / `[attr=value]`
//! parts, with an optional trailing `:first`.

use thiserror::Error;

use super::{Document, ElementId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character {0:?} in selector")]
    Unexpected(char),
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    #[error("unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, doc: &Document, id: ElementId) -> bool {
        let Some(element) = doc.element(id) else {
            return false;
        };
        self.tag.as_deref().is_none_or(|t| t == "*" || t == element.tag())
            && self.id.as_deref().is_none_or(|i| element.attr("id") == Some(i))
            && self.classes.iter().all(|c| element.has_class(c))
            && self.attrs.iter().all(|(name, value)| match value {
                Some(expected) => element.attr(name) == Some(expected.as_str()),
                None => element.attr(name).is_some(),
            })
    }
}

/// Parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
    first: bool,
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let mut parts = Vec::new();
        let mut current = Compound::default();
        let mut first = false;
        let mut chars = raw.trim().chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        parts.push(std::mem::take(&mut current));
                    }
                }
                '#' => current.id = Some(take_ident(&mut chars)),
                '.' => current.classes.push(take_ident(&mut chars)),
                '[' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(ch) => body.push(ch),
                            None => return Err(SelectorError::UnterminatedAttribute),
                        }
                    }
                    let attr = match body.split_once('=') {
                        Some((name, value)) => (
                            name.trim().to_string(),
                            Some(value.trim().trim_matches(['"', '\'']).to_string()),
                        ),
                        None => (body.trim().to_string(), None),
                    };
                    current.attrs.push(attr);
                }
                ':' => {
                    let pseudo = take_ident(&mut chars);
                    if pseudo != "first" {
                        return Err(SelectorError::UnsupportedPseudo(pseudo));
                    }
                    first = true;
                }
                c if is_ident_char(c) || c == '*' => {
                    let mut tag = String::from(c);
                    tag.push_str(&take_ident(&mut chars));
                    current.tag = Some(tag.to_ascii_lowercase());
                }
                other => return Err(SelectorError::Unexpected(other)),
            }
        }
        if !current.is_empty() {
            parts.push(current);
        }
        if parts.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { parts, first })
    }

    /// Whether only the first match in document order is wanted.
    pub fn first_only(&self) -> bool {
        self.first
    }

    pub fn matches(&self, doc: &Document, id: ElementId) -> bool {
        let Some((last, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(doc, id) {
            return false;
        }
        // Walk up the tree, consuming ancestor compounds right to left.
        let mut pending = ancestors.iter().rev().peekable();
        let mut cursor = doc.parent(id);
        while let (Some(part), Some(node)) = (pending.peek(), cursor) {
            if part.matches(doc, node) {
                pending.next();
            }
            cursor = doc.parent(node);
        }
        pending.peek().is_none()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_target() {
        let selector = Selector::parse("input[type=password]:first").unwrap();
        assert!(selector.first_only());
        assert_eq!(selector.parts.len(), 1);
        assert_eq!(selector.parts[0].tag.as_deref(), Some("input"));
        assert_eq!(
            selector.parts[0].attrs,
            vec![("type".to_string(), Some("password".to_string()))]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert_eq!(
            Selector::parse("input[type"),
            Err(SelectorError::UnterminatedAttribute)
        );
        assert!(matches!(
            Selector::parse("input:last"),
            Err(SelectorError::UnsupportedPseudo(_))
        ));
        assert_eq!(Selector::parse("a > b"), Err(SelectorError::Unexpected('>')));
    }

    #[test]
    fn test_descendant_and_id_matching() {
        let mut doc = Document::new();
        let form = doc.create_element("form");
        let input = doc.create_element("input");
        let stray = doc.create_element("input");
        doc.append_child(doc.body(), form);
        doc.append_child(form, input);
        doc.append_child(doc.body(), stray);
        doc.set_attr(form, "id", "signup");
        doc.add_class(input, "secret");

        assert_eq!(doc.query("#signup input"), vec![input]);
        assert_eq!(doc.query("form .secret"), vec![input]);
        assert_eq!(doc.query("input"), vec![input, stray]);
        assert_eq!(doc.query("input[type]"), Vec::<ElementId>::new());
    }

    #[test]
    fn test_quoted_attribute_value() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.append_child(doc.body(), input);
        doc.set_attr(input, "type", "password");
        assert_eq!(doc.query("input[type='password']"), vec![input]);
    }
}
