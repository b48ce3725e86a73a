//! Persistence layer for calendar subscriptions.
//!
//! Stores calendar definitions and per-subscriber configurations in SQLite
//! and answers the subscriber-scoped queries a calendar front end needs.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::configuration::{CalendarConfiguration, ConfigurationId, ConfigurationKind};
pub use model::definition::{
    CalendarDefinition, DefinitionId, DefinitionKind, PredefinedAttributes,
};
pub use model::CalendarValidationError;
pub use repo::calendar_repo::{
    CalendarRepository, ConfigurationQuery, EntityKind, PredefinedDefinitionQuery, RepoError,
    RepoResult, RoleFilter, SqliteCalendarRepository,
};
pub use store::calendar_store::{CalendarStore, DataAccessError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
