//! Typed model of engine-configurable parameters.
//!
//! Options are declared once by the engine during the handshake via
//! `option` lines and mutated afterwards only through the controller's
//! typed setters, which re-validate each value before a `setoption`
//! command goes out on the wire.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::parser::TokenParser;

/// Value payload of a UCI option, tagged by its declared wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptionValue {
    /// Boolean toggle (`type check`)
    Check(bool),
    /// Integer with inclusive bounds (`type spin`)
    Spin { value: i32, min: i32, max: i32 },
    /// One of a fixed list of values, tracked by index (`type combo`)
    Combo { values: Vec<String>, selected: usize },
    /// No value; sending the option triggers an engine action (`type button`)
    Button,
    /// Free text, may contain spaces (`type string`)
    Text(String),
}

impl OptionValue {
    #[must_use]
    pub const fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Check(_) => OptionKind::Check,
            OptionValue::Spin { .. } => OptionKind::Spin,
            OptionValue::Combo { .. } => OptionKind::Combo,
            OptionValue::Button => OptionKind::Button,
            OptionValue::Text(_) => OptionKind::Text,
        }
    }
}

/// Discriminant of [`OptionValue`], used for typed registry lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Check,
    Spin,
    Combo,
    Button,
    Text,
}

/// A named option declared by the engine during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineOption {
    pub name: String,
    pub value: OptionValue,
}

impl EngineOption {
    /// Parse an `option` declaration from a scanner positioned just past the
    /// `option` keyword.
    ///
    /// Grammar: `name <NAME...> type <TYPE> [default <V>] [min <N>]
    /// [max <N>] [var <V>]*`. The display name is everything between `name`
    /// and the literal `type` token. Declarations with an unknown type yield
    /// `Ok(None)`; a declaration with no `type` token at all is a hard parse
    /// failure.
    pub fn parse(
        parser: &mut TokenParser<'_>,
        line: &str,
    ) -> Result<Option<EngineOption>, EngineError> {
        // the literal `name` keyword
        parser.next_token();

        let name = parser
            .next_until("type")
            .ok_or_else(|| EngineError::InvalidOption {
                line: line.to_string(),
            })?
            .to_string();

        let Some(ty) = parser.next_token() else {
            return Ok(None);
        };

        let value = match ty {
            "check" => {
                let mut value = false;
                if parser.jump_past("default") {
                    value = parser.next_typed::<bool>().unwrap_or(false);
                }
                OptionValue::Check(value)
            }
            "spin" => {
                let mut value = 0;
                if parser.jump_past("default") {
                    value = parser.next_typed().unwrap_or(0);
                }
                // a spin without declared bounds is pinned to its value
                let mut min = value;
                if parser.jump_past("min") {
                    min = parser.next_typed().unwrap_or(value);
                }
                let mut max = value;
                if parser.jump_past("max") {
                    max = parser.next_typed().unwrap_or(value);
                }
                OptionValue::Spin { value, min, max }
            }
            "combo" => {
                let mut default_text = String::new();
                let mut values = Vec::new();
                if parser.jump_past("default") {
                    match parser.next_until("var") {
                        Some(d) => {
                            default_text = d.to_string();
                            values = combo_values(parser);
                        }
                        None => default_text = parser.rest_of_line().to_string(),
                    }
                } else if parser.jump_past("var") {
                    values = combo_values(parser);
                }
                let selected = values
                    .iter()
                    .position(|v| *v == default_text)
                    .unwrap_or(0);
                OptionValue::Combo { values, selected }
            }
            "button" => OptionValue::Button,
            "string" => {
                let mut value = String::new();
                if parser.jump_past("default") {
                    value = parser.rest_of_line().to_string();
                }
                OptionValue::Text(value)
            }
            _ => return Ok(None),
        };

        Ok(Some(EngineOption { name, value }))
    }
}

/// Collect combo values once the first `var` keyword has been consumed.
fn combo_values(parser: &mut TokenParser<'_>) -> Vec<String> {
    let mut values = Vec::new();
    loop {
        match parser.next_until("var") {
            Some(value) => values.push(value.to_string()),
            None => {
                let value = parser.rest_of_line();
                if !value.is_empty() {
                    values.push(value.to_string());
                }
                return values;
            }
        }
    }
}

impl fmt::Display for EngineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.name)?;
        match &self.value {
            OptionValue::Check(v) => write!(f, "(check) value {v}"),
            OptionValue::Spin { value, min, max } => {
                write!(f, "(spin) value {value} min {min} max {max}")
            }
            OptionValue::Combo { values, selected } => {
                let current = values.get(*selected).map_or("", String::as_str);
                write!(f, "(combo) value {current} of [{}]", values.join(", "))
            }
            OptionValue::Button => write!(f, "(button)"),
            OptionValue::Text(v) => write!(f, "(string) value {v:?}"),
        }
    }
}

/// Render the `setoption` command for a named option.
///
/// Buttons carry no value; every other kind sends `value <V>`.
#[must_use]
pub fn setoption_command(name: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("setoption name {name} value {v}\n"),
        None => format!("setoption name {name}\n"),
    }
}

/// Ordered collection of the options declared by the engine.
///
/// Lookup is case-insensitive on the name and filtered by option kind;
/// storage preserves the declared casing and order.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: Vec<EngineOption>,
}

impl OptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        OptionRegistry::default()
    }

    pub fn push(&mut self, option: EngineOption) {
        self.options.push(option);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EngineOption> {
        self.options.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[EngineOption] {
        &self.options
    }

    /// Find an option by name (case-insensitive) and kind.
    #[must_use]
    pub fn find(&self, name: &str, kind: OptionKind) -> Option<&EngineOption> {
        self.options
            .iter()
            .find(|o| o.value.kind() == kind && o.name.eq_ignore_ascii_case(name))
    }

    /// Mutable variant of [`OptionRegistry::find`].
    pub fn find_mut(&mut self, name: &str, kind: OptionKind) -> Option<&mut EngineOption> {
        self.options
            .iter_mut()
            .find(|o| o.value.kind() == kind && o.name.eq_ignore_ascii_case(name))
    }
}
