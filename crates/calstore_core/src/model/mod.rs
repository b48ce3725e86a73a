//! Calendar subscription domain model.
//!
//! # Responsibility
//! - Define calendar definitions (calendar sources) and configurations
//!   (a subscriber's binding to one definition).
//! - Keep the predefined/user-defined split as closed sum types.
//!
//! # Invariants
//! - Every configuration references exactly one definition.
//! - A predefined configuration always references a predefined definition.
//! - Persisted entities are identified by a surrogate numeric id.

pub mod configuration;
pub mod definition;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Structural invariant violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarValidationError {
    /// A predefined configuration points at a non-predefined definition.
    PredefinedConfigurationRequiresPredefinedDefinition,
}

impl Display for CalendarValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PredefinedConfigurationRequiresPredefinedDefinition => write!(
                f,
                "predefined calendar configuration must reference a predefined calendar definition"
            ),
        }
    }
}

impl Error for CalendarValidationError {}
