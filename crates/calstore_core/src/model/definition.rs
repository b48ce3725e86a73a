//! Calendar definition model.
//!
//! # Responsibility
//! - Describe one calendar source: adapter class, display name and
//!   adapter parameters.
//! - Carry predefined-only attributes (functional name, default roles).
//!
//! # Invariants
//! - `id == None` means the definition was never stored.
//! - The definition kind is fixed once stored.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Surrogate identifier of a stored calendar definition.
pub type DefinitionId = i64;

/// Attributes only predefined (administrator-managed) definitions carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedAttributes {
    /// Stable functional name used to look the definition up.
    pub fname: String,
    /// Roles whose subscribers get this calendar configured by default.
    pub default_roles: BTreeSet<String>,
}

/// Closed set of definition specializations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DefinitionKind {
    /// Plain calendar source, typically authored by a subscriber.
    Calendar,
    /// Administrator-managed calendar offered to roles.
    Predefined(PredefinedAttributes),
}

/// Persisted description of a calendar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDefinition {
    pub id: Option<DefinitionId>,
    /// Name of the adapter that reads this source.
    pub class_name: String,
    pub name: String,
    /// Adapter parameters, e.g. `url`.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    pub kind: DefinitionKind,
}

impl CalendarDefinition {
    /// Creates a transient plain calendar definition.
    pub fn new(class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            class_name: class_name.into(),
            name: name.into(),
            parameters: BTreeMap::new(),
            kind: DefinitionKind::Calendar,
        }
    }

    /// Creates a transient predefined definition eligible for `default_roles`.
    pub fn predefined<I, S>(
        class_name: impl Into<String>,
        name: impl Into<String>,
        fname: impl Into<String>,
        default_roles: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            class_name: class_name.into(),
            name: name.into(),
            parameters: BTreeMap::new(),
            kind: DefinitionKind::Predefined(PredefinedAttributes {
                fname: fname.into(),
                default_roles: default_roles.into_iter().map(Into::into).collect(),
            }),
        }
    }

    /// Adds or replaces one adapter parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn is_predefined(&self) -> bool {
        matches!(self.kind, DefinitionKind::Predefined(_))
    }

    /// Returns predefined attributes, `None` for plain definitions.
    pub fn predefined_attributes(&self) -> Option<&PredefinedAttributes> {
        match &self.kind {
            DefinitionKind::Predefined(attributes) => Some(attributes),
            DefinitionKind::Calendar => None,
        }
    }

    /// Returns whether `role` is one of this definition's default roles.
    ///
    /// Always `false` for plain definitions.
    pub fn is_default_for_role(&self, role: &str) -> bool {
        self.predefined_attributes()
            .is_some_and(|attributes| attributes.default_roles.contains(role))
    }
}
