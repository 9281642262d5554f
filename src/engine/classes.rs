//! Character classes - the alphabets an entropy estimate is built from.

use serde::{Deserialize, Serialize};

const SYMBOLS_COMMON: &str = " ,.?!";
const SYMBOLS_UNCOMMON: &str = "\"£$%^&*()-_=+[]{};:'@#~<>/\\|`¬¦";

/// Built-in character classes, addressed by name in engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PredefinedClass {
    Lowercase,
    Uppercase,
    Numeric,
    Symbols,
    SymbolsCommon,
    SymbolsUncommon,
    Hexadecimal,
}

/// A class as written in configuration: a predefined name or an explicit
/// set of characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassSpec {
    Predefined(PredefinedClass),
    Custom { characters: String },
}

impl From<PredefinedClass> for ClassSpec {
    fn from(class: PredefinedClass) -> Self {
        ClassSpec::Predefined(class)
    }
}

/// Classes used when the configuration names none.
pub fn default_classes() -> Vec<ClassSpec> {
    [
        PredefinedClass::Lowercase,
        PredefinedClass::Uppercase,
        PredefinedClass::Numeric,
        PredefinedClass::SymbolsCommon,
        PredefinedClass::SymbolsUncommon,
    ]
    .into_iter()
    .map(ClassSpec::from)
    .collect()
}

#[derive(Debug, Clone)]
enum Membership {
    Predicate(fn(char) -> bool),
    Characters(Vec<char>),
}

/// A resolved class: how to recognise a member, and how much it adds to
/// the alphabet when present.
#[derive(Debug, Clone)]
pub(crate) struct CharClass {
    membership: Membership,
    size: usize,
}

impl CharClass {
    fn characters(set: &str) -> Self {
        let chars: Vec<char> = set.chars().collect();
        Self {
            size: chars.len(),
            membership: Membership::Characters(chars),
        }
    }

    fn contains(&self, c: char) -> bool {
        match &self.membership {
            Membership::Predicate(test) => test(c),
            Membership::Characters(chars) => chars.contains(&c),
        }
    }

    /// Alphabet size contributed by this class to `password`: its full size
    /// if at least one member occurs, zero otherwise.
    pub(crate) fn contribution(&self, password: &str) -> usize {
        if password.chars().any(|c| self.contains(c)) {
            self.size
        } else {
            0
        }
    }
}

impl From<&ClassSpec> for CharClass {
    fn from(spec: &ClassSpec) -> Self {
        match spec {
            ClassSpec::Custom { characters } => CharClass::characters(characters),
            ClassSpec::Predefined(class) => match class {
                PredefinedClass::Lowercase => CharClass {
                    membership: Membership::Predicate(|c: char| c.is_ascii_lowercase()),
                    size: 26,
                },
                PredefinedClass::Uppercase => CharClass {
                    membership: Membership::Predicate(|c: char| c.is_ascii_uppercase()),
                    size: 26,
                },
                PredefinedClass::Numeric => CharClass {
                    membership: Membership::Predicate(|c: char| c.is_ascii_digit()),
                    size: 10,
                },
                PredefinedClass::Hexadecimal => CharClass {
                    membership: Membership::Predicate(|c: char| c.is_ascii_hexdigit()),
                    size: 16,
                },
                PredefinedClass::Symbols => {
                    CharClass::characters(&format!("{SYMBOLS_COMMON}{SYMBOLS_UNCOMMON}"))
                }
                PredefinedClass::SymbolsCommon => CharClass::characters(SYMBOLS_COMMON),
                PredefinedClass::SymbolsUncommon => CharClass::characters(SYMBOLS_UNCOMMON),
            },
        }
    }
}
