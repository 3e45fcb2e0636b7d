//! Voice catalog: the current set of synthesis voices plus the user's pick.
//!
//! The selection is stored by name and resolved at use time, so it may point
//! at a voice that a later refresh dropped.

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    /// Human-readable name, also what users select by.
    pub name: String,
    pub language_tag: String,
    /// Identifier the synthesis engine accepts. Defaults to the name.
    #[serde(skip)]
    pub engine_id: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, language_tag: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            engine_id: name.clone(),
            name,
            language_tag: language_tag.into(),
        }
    }

    pub fn with_engine_id(mut self, engine_id: impl Into<String>) -> Self {
        self.engine_id = engine_id.into();
        self
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.language_tag)
    }
}

#[derive(Debug, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    selected: Option<String>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole voice list. Picks the first voice if nothing is
    /// selected yet.
    pub fn refresh(&mut self, voices: Vec<Voice>) {
        if self.selected.is_none() {
            if let Some(first) = voices.first() {
                debug!("Defaulting voice selection to {}", first.name);
                self.selected = Some(first.name.clone());
            }
        }
        self.voices = voices;
    }

    /// Set the selected voice name. Membership is checked in `resolve`.
    pub fn select(&mut self, name: impl Into<String>) {
        self.selected = Some(name.into());
    }

    pub fn resolve(&self) -> Option<&Voice> {
        self.selected
            .as_deref()
            .and_then(|name| self.voices.iter().find(|v| v.name == name))
            .or_else(|| self.voices.first())
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
}
