use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection settings saved for one named server.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ServerConfig {
    /// Host, port, username and database are all set. Password may legitimately be blank.
    pub fn is_complete(&self) -> bool {
        !self.host.is_empty()
            && !self.port.is_empty()
            && !self.username.is_empty()
            && !self.database.is_empty()
    }
}

/// A value bound to a named statement parameter.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

/// Free-text script parameter filled in through a text input.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Param {
    pub title: String,
    pub name: String,
    #[serde(skip)]
    pub value: Option<String>,
}

/// What the user picked in a select: the label's position, or a label given verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    ByIndex(usize),
    RawLabel(String),
}

/// A resolved selection: the label shown to the user and the value bound to the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub display: String,
    pub value: ParamValue,
}

/// Fixed list of labels offered for one statement parameter.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SelectOption {
    pub title: String,
    pub name: String,
    pub values: Vec<String>,
    /// Bind the mapped value (or the 1-based position) instead of the label.
    #[serde(default)]
    pub use_index: bool,
    #[serde(default)]
    pub value_map: Vec<ParamValue>,
    #[serde(default)]
    pub default_index: Option<usize>,
    #[serde(skip)]
    pub selected: Option<Selection>,
}

impl SelectOption {
    /// Seeds `selected` from `default_index` when it points at a real label.
    pub fn apply_default(&mut self) {
        if self.selected.is_none() {
            if let Some(index) = self.default_index.filter(|i| *i < self.values.len()) {
                self.selected = Some(Selection::ByIndex(index));
            }
        }
    }

    pub fn resolve(&self) -> Option<ResolvedSelection> {
        match self.selected.as_ref()? {
            Selection::ByIndex(index) => {
                let label = self.values.get(*index)?;
                let value = if self.use_index {
                    self.mapped_value(*index)
                } else {
                    ParamValue::Text(label.clone())
                };
                Some(ResolvedSelection {
                    display: label.clone(),
                    value,
                })
            }
            Selection::RawLabel(label) => {
                let value = match self.values.iter().position(|v| v == label) {
                    Some(index) if self.use_index => self.mapped_value(index),
                    _ => ParamValue::Text(label.clone()),
                };
                Some(ResolvedSelection {
                    display: label.clone(),
                    value,
                })
            }
        }
    }

    fn mapped_value(&self, index: usize) -> ParamValue {
        match self.value_map.get(index) {
            Some(value) => value.clone(),
            None => ParamValue::Int(index as i64 + 1),
        }
    }
}

/// An administrative statement bound to one server.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Script {
    pub title: String,
    pub server: String,
    pub statement: String,
    #[serde(default, rename = "param")]
    pub params: Vec<Param>,
    #[serde(default, rename = "select")]
    pub selects: Vec<SelectOption>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerEntry {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl ServerEntry {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Servers and scripts offered by the menu.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Catalog {
    #[serde(default, rename = "server")]
    pub servers: Vec<ServerEntry>,
    #[serde(default, rename = "script")]
    pub scripts: Vec<Script>,
}

impl Catalog {
    /// Declared servers, or the scripts' servers in first-appearance order when none are declared.
    pub fn server_entries(&self) -> Vec<ServerEntry> {
        if !self.servers.is_empty() {
            return self.servers.clone();
        }
        let mut entries: Vec<ServerEntry> = Vec::new();
        for script in &self.scripts {
            if !entries.iter().any(|e| e.name == script.server) {
                entries.push(ServerEntry {
                    name: script.server.clone(),
                    title: None,
                });
            }
        }
        entries
    }
}
