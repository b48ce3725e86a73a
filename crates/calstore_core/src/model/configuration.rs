//! Calendar configuration model.
//!
//! # Responsibility
//! - Bind one subscriber to one calendar definition with display flags.
//! - Distinguish predefined and user-defined bindings by a fixed kind.
//!
//! # Invariants
//! - `kind` is fixed at creation and mirrored by a storage discriminator.
//! - `subscribe_id` is opaque and not unique per configuration.

use super::definition::CalendarDefinition;
use super::CalendarValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Surrogate identifier of a stored calendar configuration.
pub type ConfigurationId = i64;

/// Closed set of configuration specializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationKind {
    /// Links a subscriber to a predefined definition.
    Predefined,
    /// Subscriber-authored calendar.
    UserDefined,
}

/// A subscriber's binding to a calendar definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfiguration {
    pub id: Option<ConfigurationId>,
    pub kind: ConfigurationKind,
    pub subscribe_id: String,
    /// Hidden configurations are excluded from the subscriber's calendar list.
    pub displayed: bool,
    pub visible_only: bool,
    /// Per-subscriber display preferences, e.g. `color`.
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
    pub calendar_definition: CalendarDefinition,
}

impl CalendarConfiguration {
    /// Creates a transient predefined configuration for `subscribe_id`.
    pub fn predefined(definition: CalendarDefinition, subscribe_id: impl Into<String>) -> Self {
        Self::with_kind(ConfigurationKind::Predefined, definition, subscribe_id)
    }

    /// Creates a transient user-defined configuration for `subscribe_id`.
    pub fn user_defined(definition: CalendarDefinition, subscribe_id: impl Into<String>) -> Self {
        Self::with_kind(ConfigurationKind::UserDefined, definition, subscribe_id)
    }

    fn with_kind(
        kind: ConfigurationKind,
        definition: CalendarDefinition,
        subscribe_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind,
            subscribe_id: subscribe_id.into(),
            displayed: true,
            visible_only: false,
            preferences: BTreeMap::new(),
            calendar_definition: definition,
        }
    }

    /// Checks structural invariants that storage cannot express.
    pub fn validate(&self) -> Result<(), CalendarValidationError> {
        if self.kind == ConfigurationKind::Predefined && !self.calendar_definition.is_predefined() {
            return Err(CalendarValidationError::PredefinedConfigurationRequiresPredefinedDefinition);
        }
        Ok(())
    }
}
