//! Render models for data-bound option inputs.
//!
//! A field with a list of selectable options is rendered either as a group
//! of checkboxes or toggle switches laid out in columns, or, when it has a
//! single option, as one switch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const SHORT_LABEL: usize = 10;
const MEDIUM_LABEL: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormControlError {
    #[error("Field '{0}' has no options to render")]
    NoOptions(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormOption {
    pub label: String,
    pub value: Value,
}

impl FormOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Requested presentation of the options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlStyle {
    /// Single switch for one option, checkboxes otherwise
    #[default]
    Auto,
    Checkboxes,
    Switches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    SingleSwitch,
    CheckboxGroup,
    SwitchGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedOption {
    pub label: String,
    pub value: Value,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormControl {
    pub label: String,
    pub kind: ControlKind,
    pub columns: usize,
    pub options: Vec<RenderedOption>,
}

impl FormControl {
    /// Builds the render model of an option field.
    ///
    /// `value` is the field's current value: an array of selected option
    /// values, a single selected value, or a boolean for one-option fields.
    pub fn render(
        label: &str,
        options: &[FormOption],
        value: &Value,
        style: ControlStyle,
    ) -> Result<Self, FormControlError> {
        if options.is_empty() {
            return Err(FormControlError::NoOptions(label.to_string()));
        }

        let kind = match (style, options.len()) {
            (ControlStyle::Auto, 1) => ControlKind::SingleSwitch,
            (ControlStyle::Auto | ControlStyle::Checkboxes, _) => ControlKind::CheckboxGroup,
            (ControlStyle::Switches, _) => ControlKind::SwitchGroup,
        };

        let options = options
            .iter()
            .map(|option| RenderedOption {
                label: option.label.clone(),
                value: option.value.clone(),
                checked: is_selected(kind, value, &option.value),
            })
            .collect::<Vec<_>>();

        let columns = match kind {
            ControlKind::SingleSwitch => 1,
            _ => column_count(&options),
        };

        Ok(Self {
            label: label.to_string(),
            kind,
            columns,
            options,
        })
    }

    /// Values of the checked options
    pub fn selected_values(&self) -> Vec<&Value> {
        self.options
            .iter()
            .filter(|option| option.checked)
            .map(|option| &option.value)
            .collect()
    }

    /// Options split into rows of `columns` entries
    pub fn rows(&self) -> Vec<&[RenderedOption]> {
        self.options.chunks(self.columns.max(1)).collect()
    }
}

/// A boolean only acts as an on/off state for a single switch; groups
/// compare values, so boolean option values match like any other.
fn is_selected(kind: ControlKind, current: &Value, option: &Value) -> bool {
    match (kind, current) {
        (_, Value::Array(selected)) => selected.contains(option),
        (_, Value::Null) => false,
        (ControlKind::SingleSwitch, Value::Bool(flag)) if !option.is_boolean() => *flag,
        (_, single) => single == option,
    }
}

/// Shorter labels fit more columns.
fn column_count(options: &[RenderedOption]) -> usize {
    let longest = options
        .iter()
        .map(|option| option.label.chars().count())
        .max()
        .unwrap_or(0);

    let columns = if longest <= SHORT_LABEL {
        3
    } else if longest <= MEDIUM_LABEL {
        2
    } else {
        1
    };

    columns.min(options.len())
}
