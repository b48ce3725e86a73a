//! Calendar subscription store.
//!
//! # Responsibility
//! - Store calendar definitions and configurations (insert or update).
//! - Query a subscriber's configurations and predefined definitions.
//! - Initialize a subscriber's predefined calendars from role defaults.
//!
//! # Invariants
//! - Every mutating call runs in its own transaction and is flushed before
//!   it returns.
//! - Failures surface as `DataAccessError` carrying the repository cause;
//!   nothing is retried.
//! - Ids assigned during a failed write are reverted on the caller's entity.

use crate::model::configuration::{CalendarConfiguration, ConfigurationId, ConfigurationKind};
use crate::model::definition::{CalendarDefinition, DefinitionId};
use crate::repo::calendar_repo::{
    CalendarRepository, ConfigurationQuery, EntityKind, PredefinedDefinitionQuery, RepoError,
    RepoResult, RoleFilter,
};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, DataAccessError>;

/// The single failure kind reported by the calendar store.
#[derive(Debug)]
pub struct DataAccessError {
    operation: &'static str,
    source: RepoError,
}

impl DataAccessError {
    /// Store operation that failed, e.g. `init_calendar`.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Underlying repository failure.
    pub fn repo_error(&self) -> &RepoError {
        &self.source
    }

    pub fn into_repo_error(self) -> RepoError {
        self.source
    }
}

impl Display for DataAccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "data access failure in {}: {}", self.operation, self.source)
    }
}

impl Error for DataAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Persistence facade for calendar definitions and configurations.
pub struct CalendarStore<R: CalendarRepository> {
    repo: R,
}

impl<R: CalendarRepository> CalendarStore<R> {
    /// Creates a store over the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts or updates `definition`, assigning its id on insert.
    pub fn store_calendar_definition(&self, definition: &mut CalendarDefinition) -> StoreResult<()> {
        let previous_id = definition.id;
        let result = self.run_write("store_calendar_definition", |repo| {
            repo.save_definition(definition).map(|_| ())
        });
        if result.is_err() {
            definition.id = previous_id;
        }
        result
    }

    /// Inserts or updates `configuration` of either kind.
    ///
    /// The linked definition is inserted or updated first, in the same
    /// transaction, so edits made through the configuration persist.
    pub fn store_calendar_configuration(
        &self,
        configuration: &mut CalendarConfiguration,
    ) -> StoreResult<()> {
        let previous_ids = (configuration.id, configuration.calendar_definition.id);
        let result = self.run_write("store_calendar_configuration", |repo| {
            repo.save_definition(&mut configuration.calendar_definition)?;
            repo.save_configuration(configuration).map(|_| ())
        });
        if result.is_err() {
            (configuration.id, configuration.calendar_definition.id) = previous_ids;
        }
        result
    }

    /// Returns the subscriber's displayed configurations, ordered by
    /// definition name.
    pub fn get_calendar_configurations(
        &self,
        subscribe_id: &str,
    ) -> StoreResult<Vec<CalendarConfiguration>> {
        debug!("event=calendar_configurations_fetch module=store subscribe_id={subscribe_id}");
        let query = ConfigurationQuery {
            displayed_only: true,
            ..ConfigurationQuery::for_subscriber(subscribe_id)
        };
        self.run("get_calendar_configurations", |repo| {
            repo.find_configurations(&query)
        })
    }

    /// Returns the subscriber's user-defined configurations.
    ///
    /// `visible_only` additionally keeps only rows flagged visible-only.
    pub fn get_user_defined_calendar_configurations(
        &self,
        subscribe_id: &str,
        visible_only: bool,
    ) -> StoreResult<Vec<CalendarConfiguration>> {
        self.run("get_user_defined_calendar_configurations", |repo| {
            repo.find_configurations(&kind_query(
                subscribe_id,
                ConfigurationKind::UserDefined,
                visible_only,
            ))
        })
    }

    /// Returns the subscriber's predefined configurations.
    pub fn get_predefined_calendar_configurations(
        &self,
        subscribe_id: &str,
        visible_only: bool,
    ) -> StoreResult<Vec<CalendarConfiguration>> {
        self.run("get_predefined_calendar_configurations", |repo| {
            repo.find_configurations(&kind_query(
                subscribe_id,
                ConfigurationKind::Predefined,
                visible_only,
            ))
        })
    }

    /// Returns predefined definitions outside `role`'s defaults that the
    /// subscriber has not configured.
    pub fn get_hidden_predefined_calendar_definitions(
        &self,
        subscribe_id: &str,
        role: &str,
    ) -> StoreResult<Vec<CalendarDefinition>> {
        let query = PredefinedDefinitionQuery {
            role: Some(RoleFilter::NotDefaultFor(role.to_string())),
            unconfigured_for: Some(subscribe_id.to_string()),
            fname: None,
        };
        self.run("get_hidden_predefined_calendar_definitions", |repo| {
            repo.find_predefined_definitions(&query)
        })
    }

    /// Lists every predefined definition ordered by name.
    pub fn get_predefined_calendar_definitions(&self) -> StoreResult<Vec<CalendarDefinition>> {
        self.run("get_predefined_calendar_definitions", |repo| {
            repo.find_predefined_definitions(&PredefinedDefinitionQuery::default())
        })
    }

    /// Looks a predefined definition up by its functional name.
    pub fn get_predefined_calendar_definition_by_fname(
        &self,
        fname: &str,
    ) -> StoreResult<Option<CalendarDefinition>> {
        let query = PredefinedDefinitionQuery {
            fname: Some(fname.to_string()),
            ..PredefinedDefinitionQuery::default()
        };
        self.run("get_predefined_calendar_definition_by_fname", |repo| {
            Ok(repo.find_predefined_definitions(&query)?.into_iter().next())
        })
    }

    /// Creates a predefined configuration for every definition defaulted to
    /// `role` that the subscriber has not configured yet.
    ///
    /// # Contract
    /// - All rows are created in one transaction, or none.
    /// - Repeated calls for the same subscriber and role create nothing new.
    pub fn init_calendar(&self, subscribe_id: &str, role: &str) -> StoreResult<()> {
        let query = PredefinedDefinitionQuery {
            role: Some(RoleFilter::DefaultFor(role.to_string())),
            unconfigured_for: Some(subscribe_id.to_string()),
            fname: None,
        };
        let created = self.run_write("init_calendar", |repo| {
            let definitions = repo.find_predefined_definitions(&query)?;
            let created = definitions.len();
            for definition in definitions {
                let mut configuration = CalendarConfiguration::predefined(definition, subscribe_id);
                repo.save_configuration(&mut configuration)?;
            }
            Ok(created)
        })?;

        info!(
            "event=calendar_init module=store status=ok subscribe_id={subscribe_id} role={role} created={created}"
        );
        Ok(())
    }

    /// Looks a definition up by id. Returns `None` when absent.
    pub fn get_calendar_definition(
        &self,
        id: DefinitionId,
    ) -> StoreResult<Option<CalendarDefinition>> {
        self.run("get_calendar_definition", |repo| repo.get_definition(id))
    }

    /// Looks a configuration up by id. Returns `None` when absent.
    pub fn get_calendar_configuration(
        &self,
        id: ConfigurationId,
    ) -> StoreResult<Option<CalendarConfiguration>> {
        self.run("get_calendar_configuration", |repo| repo.get_configuration(id))
    }

    /// Deletes a stored configuration. Its definition is kept.
    pub fn delete_calendar_configuration(
        &self,
        configuration: &CalendarConfiguration,
    ) -> StoreResult<()> {
        self.run_write("delete_calendar_configuration", |repo| {
            let id = configuration
                .id
                .ok_or(RepoError::Transient(EntityKind::Configuration))?;
            repo.delete_configuration(id)
        })
    }

    fn run<T, F>(&self, operation: &'static str, work: F) -> StoreResult<T>
    where
        F: FnOnce(&R) -> RepoResult<T>,
    {
        work(&self.repo).map_err(|source| {
            warn!("event=store_op module=store status=error op={operation} error={source}");
            DataAccessError { operation, source }
        })
    }

    fn run_write<T, F>(&self, operation: &'static str, work: F) -> StoreResult<T>
    where
        F: FnOnce(&R) -> RepoResult<T>,
    {
        self.run(operation, |repo| {
            repo.transaction(|repo| {
                let value = work(repo)?;
                repo.flush()?;
                Ok(value)
            })
        })
    }
}

fn kind_query(subscribe_id: &str, kind: ConfigurationKind, visible_only: bool) -> ConfigurationQuery {
    ConfigurationQuery {
        kind: Some(kind),
        visible_only,
        ..ConfigurationQuery::for_subscriber(subscribe_id)
    }
}
