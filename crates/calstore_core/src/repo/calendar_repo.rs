//! Calendar repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert-or-update, query, lookup and delete APIs over the
//!   calendar definition/configuration tables.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - Specialization is stored in a discriminator column and never changes
//!   once a row exists.
//! - List queries are deterministic: definition `name ASC, id ASC`.
//! - Multi-statement writes run inside one transaction; when the caller
//!   already holds one, writes join it.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::configuration::{CalendarConfiguration, ConfigurationId, ConfigurationKind};
use crate::model::definition::{
    CalendarDefinition, DefinitionId, DefinitionKind, PredefinedAttributes,
};
use crate::model::CalendarValidationError;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFINITION_SELECT_SQL: &str = "SELECT
    d.id AS id,
    d.definition_type AS definition_type,
    d.class_name AS class_name,
    d.name AS name,
    d.fname AS fname
FROM calendar_definitions d";

const CONFIGURATION_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.configuration_type AS configuration_type,
    c.definition_id AS definition_id,
    c.subscribe_id AS subscribe_id,
    c.displayed AS displayed,
    c.visible_only AS visible_only
FROM calendar_configurations c
INNER JOIN calendar_definitions d ON d.id = c.definition_id";

const DEFINITION_PARAMETERS_SQL: &str = "SELECT name, value
FROM calendar_definition_parameters
WHERE definition_id = ?1
ORDER BY name ASC;";

const CONFIGURATION_PREFERENCES_SQL: &str = "SELECT name, value
FROM calendar_configuration_preferences
WHERE configuration_id = ?1
ORDER BY name ASC;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity families persisted by the calendar repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Definition,
    Configuration,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definition => write!(f, "calendar definition"),
            Self::Configuration => write!(f, "calendar configuration"),
        }
    }
}

/// Errors from calendar repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Entity violates a structural invariant.
    Validation(CalendarValidationError),
    /// Update or delete targeted a row that does not exist.
    NotFound { entity: EntityKind, id: i64 },
    /// Operation requires an entity that was never stored.
    Transient(EntityKind),
    /// Update tried to change the stored specialization of a row.
    KindChanged { entity: EntityKind, id: i64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Transient(entity) => write!(f, "{entity} has not been stored yet"),
            Self::KindChanged { entity, id } => {
                write!(f, "{entity} {id} cannot change its stored type")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "calendar repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "calendar repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "calendar repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted calendar data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Transient(_) => None,
            Self::KindChanged { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<CalendarValidationError> for RepoError {
    fn from(value: CalendarValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter options for configuration list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationQuery {
    pub subscribe_id: String,
    /// Restricts results to one specialization.
    pub kind: Option<ConfigurationKind>,
    /// Keeps only configurations with `displayed = true`.
    pub displayed_only: bool,
    /// Keeps only configurations with `visible_only = true`.
    pub visible_only: bool,
}

impl ConfigurationQuery {
    /// Matches every configuration of `subscribe_id`.
    pub fn for_subscriber(subscribe_id: impl Into<String>) -> Self {
        Self {
            subscribe_id: subscribe_id.into(),
            kind: None,
            displayed_only: false,
            visible_only: false,
        }
    }
}

/// Role eligibility filter for predefined definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleFilter {
    /// Role is in the definition's default roles.
    DefaultFor(String),
    /// Role is not in the definition's default roles.
    NotDefaultFor(String),
}

/// Filter options for predefined definition queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredefinedDefinitionQuery {
    pub role: Option<RoleFilter>,
    /// Keeps only definitions this subscriber has no configuration for.
    pub unconfigured_for: Option<String>,
    /// Exact functional name match.
    pub fname: Option<String>,
}

/// Unit-of-work interface the calendar store runs against.
pub trait CalendarRepository {
    /// Inserts a transient definition or updates a stored one.
    ///
    /// Assigns the generated id back into `definition` on insert.
    fn save_definition(&self, definition: &mut CalendarDefinition) -> RepoResult<DefinitionId>;
    /// Inserts a transient configuration or updates a stored one.
    ///
    /// The linked definition must already be stored.
    fn save_configuration(
        &self,
        configuration: &mut CalendarConfiguration,
    ) -> RepoResult<ConfigurationId>;
    fn find_configurations(
        &self,
        query: &ConfigurationQuery,
    ) -> RepoResult<Vec<CalendarConfiguration>>;
    fn find_predefined_definitions(
        &self,
        query: &PredefinedDefinitionQuery,
    ) -> RepoResult<Vec<CalendarDefinition>>;
    fn get_definition(&self, id: DefinitionId) -> RepoResult<Option<CalendarDefinition>>;
    fn get_configuration(&self, id: ConfigurationId) -> RepoResult<Option<CalendarConfiguration>>;
    /// Deletes one configuration row. Its definition is kept.
    fn delete_configuration(&self, id: ConfigurationId) -> RepoResult<()>;
    /// Pushes pending writes down to durable storage.
    fn flush(&self) -> RepoResult<()>;
    /// Runs `work` in one transactional scope.
    ///
    /// Commits when `work` succeeds and rolls back on every error path.
    fn transaction<T, F>(&self, work: F) -> RepoResult<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> RepoResult<T>;
}

/// SQLite-backed calendar repository.
pub struct SqliteCalendarRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCalendarRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_calendar_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CalendarRepository for SqliteCalendarRepository<'_> {
    fn save_definition(&self, definition: &mut CalendarDefinition) -> RepoResult<DefinitionId> {
        let id = with_write_scope(self.conn, |conn| {
            let id = match definition.id {
                None => insert_definition(conn, definition)?,
                Some(id) => {
                    update_definition(conn, id, definition)?;
                    id
                }
            };
            replace_string_map(
                conn,
                "DELETE FROM calendar_definition_parameters WHERE definition_id = ?1;",
                "INSERT INTO calendar_definition_parameters (definition_id, name, value)
                 VALUES (?1, ?2, ?3);",
                id,
                &definition.parameters,
            )?;
            replace_default_roles(conn, id, definition.predefined_attributes())?;
            Ok(id)
        })?;

        definition.id = Some(id);
        Ok(id)
    }

    fn save_configuration(
        &self,
        configuration: &mut CalendarConfiguration,
    ) -> RepoResult<ConfigurationId> {
        configuration.validate()?;
        let definition_id = configuration
            .calendar_definition
            .id
            .ok_or(RepoError::Transient(EntityKind::Definition))?;

        let id = with_write_scope(self.conn, |conn| {
            ensure_stored_definition_fits(conn, configuration.kind, definition_id)?;
            let id = match configuration.id {
                None => {
                    conn.execute(
                        "INSERT INTO calendar_configurations (
                            configuration_type,
                            definition_id,
                            subscribe_id,
                            displayed,
                            visible_only
                        ) VALUES (?1, ?2, ?3, ?4, ?5);",
                        params![
                            configuration_kind_to_db(configuration.kind),
                            definition_id,
                            configuration.subscribe_id.as_str(),
                            bool_to_int(configuration.displayed),
                            bool_to_int(configuration.visible_only),
                        ],
                    )?;
                    conn.last_insert_rowid()
                }
                Some(id) => {
                    let changed = conn.execute(
                        "UPDATE calendar_configurations
                         SET
                            definition_id = ?3,
                            subscribe_id = ?4,
                            displayed = ?5,
                            visible_only = ?6
                         WHERE id = ?1
                           AND configuration_type = ?2;",
                        params![
                            id,
                            configuration_kind_to_db(configuration.kind),
                            definition_id,
                            configuration.subscribe_id.as_str(),
                            bool_to_int(configuration.displayed),
                            bool_to_int(configuration.visible_only),
                        ],
                    )?;
                    if changed == 0 {
                        return Err(missing_or_kind_changed(
                            conn,
                            "calendar_configurations",
                            EntityKind::Configuration,
                            id,
                        ));
                    }
                    id
                }
            };
            replace_string_map(
                conn,
                "DELETE FROM calendar_configuration_preferences WHERE configuration_id = ?1;",
                "INSERT INTO calendar_configuration_preferences (configuration_id, name, value)
                 VALUES (?1, ?2, ?3);",
                id,
                &configuration.preferences,
            )?;
            Ok(id)
        })?;

        configuration.id = Some(id);
        Ok(id)
    }

    fn find_configurations(
        &self,
        query: &ConfigurationQuery,
    ) -> RepoResult<Vec<CalendarConfiguration>> {
        let mut sql = format!("{CONFIGURATION_SELECT_SQL} WHERE c.subscribe_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.subscribe_id.clone())];

        if let Some(kind) = query.kind {
            sql.push_str(" AND c.configuration_type = ?");
            bind_values.push(Value::Text(configuration_kind_to_db(kind).to_string()));
        }
        if query.displayed_only {
            sql.push_str(" AND c.displayed = 1");
        }
        if query.visible_only {
            sql.push_str(" AND c.visible_only = 1");
        }
        sql.push_str(" ORDER BY d.name ASC, c.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut definitions = HashMap::new();
        let mut configurations = Vec::new();
        while let Some(row) = rows.next()? {
            configurations.push(read_configuration(self.conn, row, &mut definitions)?);
        }

        Ok(configurations)
    }

    fn find_predefined_definitions(
        &self,
        query: &PredefinedDefinitionQuery,
    ) -> RepoResult<Vec<CalendarDefinition>> {
        let mut sql = format!("{DEFINITION_SELECT_SQL} WHERE d.definition_type = 'predefined'");
        let mut bind_values: Vec<Value> = Vec::new();

        match &query.role {
            Some(RoleFilter::DefaultFor(role)) => {
                sql.push_str(
                    " AND EXISTS (
                        SELECT 1
                        FROM predefined_default_roles r
                        WHERE r.definition_id = d.id
                          AND r.role = ?
                    )",
                );
                bind_values.push(Value::Text(role.clone()));
            }
            Some(RoleFilter::NotDefaultFor(role)) => {
                sql.push_str(
                    " AND NOT EXISTS (
                        SELECT 1
                        FROM predefined_default_roles r
                        WHERE r.definition_id = d.id
                          AND r.role = ?
                    )",
                );
                bind_values.push(Value::Text(role.clone()));
            }
            None => {}
        }

        if let Some(subscribe_id) = &query.unconfigured_for {
            sql.push_str(
                " AND NOT EXISTS (
                    SELECT 1
                    FROM calendar_configurations c
                    WHERE c.definition_id = d.id
                      AND c.subscribe_id = ?
                )",
            );
            bind_values.push(Value::Text(subscribe_id.clone()));
        }

        if let Some(fname) = &query.fname {
            sql.push_str(" AND d.fname = ?");
            bind_values.push(Value::Text(fname.clone()));
        }

        sql.push_str(" ORDER BY d.name ASC, d.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut definitions = Vec::new();
        while let Some(row) = rows.next()? {
            definitions.push(read_definition(self.conn, row)?);
        }

        Ok(definitions)
    }

    fn get_definition(&self, id: DefinitionId) -> RepoResult<Option<CalendarDefinition>> {
        load_definition(self.conn, id)
    }

    fn get_configuration(&self, id: ConfigurationId) -> RepoResult<Option<CalendarConfiguration>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONFIGURATION_SELECT_SQL} WHERE c.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut definitions = HashMap::new();
            return Ok(Some(read_configuration(self.conn, row, &mut definitions)?));
        }

        Ok(None)
    }

    fn delete_configuration(&self, id: ConfigurationId) -> RepoResult<()> {
        with_write_scope(self.conn, |conn| {
            let changed = conn.execute("DELETE FROM calendar_configurations WHERE id = ?1;", [id])?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: EntityKind::Configuration,
                    id,
                });
            }
            Ok(())
        })
    }

    fn flush(&self) -> RepoResult<()> {
        self.conn.cache_flush()?;
        Ok(())
    }

    fn transaction<T, F>(&self, work: F) -> RepoResult<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> RepoResult<T>,
    {
        if !self.conn.is_autocommit() {
            return work(self);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = work(self)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Runs `work` in a fresh transaction, or inside the caller's open one.
fn with_write_scope<T, F>(conn: &Connection, work: F) -> RepoResult<T>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    if !conn.is_autocommit() {
        return work(conn);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

fn insert_definition(conn: &Connection, definition: &CalendarDefinition) -> RepoResult<DefinitionId> {
    conn.execute(
        "INSERT INTO calendar_definitions (
            definition_type,
            class_name,
            name,
            fname
        ) VALUES (?1, ?2, ?3, ?4);",
        params![
            definition_kind_to_db(&definition.kind),
            definition.class_name.as_str(),
            definition.name.as_str(),
            definition
                .predefined_attributes()
                .map(|attributes| attributes.fname.as_str()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_definition(
    conn: &Connection,
    id: DefinitionId,
    definition: &CalendarDefinition,
) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE calendar_definitions
         SET
            class_name = ?3,
            name = ?4,
            fname = ?5
         WHERE id = ?1
           AND definition_type = ?2;",
        params![
            id,
            definition_kind_to_db(&definition.kind),
            definition.class_name.as_str(),
            definition.name.as_str(),
            definition
                .predefined_attributes()
                .map(|attributes| attributes.fname.as_str()),
        ],
    )?;

    if changed == 0 {
        return Err(missing_or_kind_changed(
            conn,
            "calendar_definitions",
            EntityKind::Definition,
            id,
        ));
    }

    Ok(())
}

fn replace_default_roles(
    conn: &Connection,
    id: DefinitionId,
    attributes: Option<&PredefinedAttributes>,
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM predefined_default_roles WHERE definition_id = ?1;",
        [id],
    )?;

    let Some(attributes) = attributes else {
        return Ok(());
    };

    let mut stmt = conn.prepare(
        "INSERT INTO predefined_default_roles (definition_id, role) VALUES (?1, ?2);",
    )?;
    for role in &attributes.default_roles {
        stmt.execute(params![id, role.as_str()])?;
    }

    Ok(())
}

fn replace_string_map(
    conn: &Connection,
    delete_sql: &str,
    insert_sql: &str,
    owner_id: i64,
    values: &BTreeMap<String, String>,
) -> RepoResult<()> {
    conn.execute(delete_sql, [owner_id])?;
    if values.is_empty() {
        return Ok(());
    }

    let mut stmt = conn.prepare(insert_sql)?;
    for (name, value) in values {
        stmt.execute(params![owner_id, name.as_str(), value.as_str()])?;
    }

    Ok(())
}

fn load_definition(conn: &Connection, id: DefinitionId) -> RepoResult<Option<CalendarDefinition>> {
    let mut stmt = conn.prepare(&format!("{DEFINITION_SELECT_SQL} WHERE d.id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(read_definition(conn, row)?));
    }

    Ok(None)
}

fn read_definition(conn: &Connection, row: &Row<'_>) -> RepoResult<CalendarDefinition> {
    let id: DefinitionId = row.get("id")?;
    let type_text: String = row.get("definition_type")?;
    let kind = match type_text.as_str() {
        "calendar" => DefinitionKind::Calendar,
        "predefined" => {
            let fname = row.get::<_, Option<String>>("fname")?.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "predefined definition {id} has no value in calendar_definitions.fname"
                ))
            })?;
            DefinitionKind::Predefined(PredefinedAttributes {
                fname,
                default_roles: load_default_roles(conn, id)?,
            })
        }
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid definition type `{other}` in calendar_definitions.definition_type"
            )));
        }
    };

    Ok(CalendarDefinition {
        id: Some(id),
        class_name: row.get("class_name")?,
        name: row.get("name")?,
        parameters: load_string_map(conn, DEFINITION_PARAMETERS_SQL, id)?,
        kind,
    })
}

fn read_configuration(
    conn: &Connection,
    row: &Row<'_>,
    definitions: &mut HashMap<DefinitionId, CalendarDefinition>,
) -> RepoResult<CalendarConfiguration> {
    let id: ConfigurationId = row.get("id")?;
    let type_text: String = row.get("configuration_type")?;
    let kind = parse_configuration_kind(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid configuration type `{type_text}` in calendar_configurations.configuration_type"
        ))
    })?;

    let definition_id: DefinitionId = row.get("definition_id")?;
    let calendar_definition = match definitions.get(&definition_id) {
        Some(definition) => definition.clone(),
        None => {
            let definition = load_definition(conn, definition_id)?.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "configuration {id} references missing definition {definition_id}"
                ))
            })?;
            definitions.insert(definition_id, definition.clone());
            definition
        }
    };

    let configuration = CalendarConfiguration {
        id: Some(id),
        kind,
        subscribe_id: row.get("subscribe_id")?,
        displayed: parse_flag(row, "displayed")?,
        visible_only: parse_flag(row, "visible_only")?,
        preferences: load_string_map(conn, CONFIGURATION_PREFERENCES_SQL, id)?,
        calendar_definition,
    };
    configuration.validate()?;
    Ok(configuration)
}

fn load_default_roles(conn: &Connection, id: DefinitionId) -> RepoResult<BTreeSet<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT role FROM predefined_default_roles WHERE definition_id = ?1 ORDER BY role ASC;",
    )?;
    let roles = stmt
        .query_map([id], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(roles)
}

fn load_string_map(
    conn: &Connection,
    sql: &str,
    owner_id: i64,
) -> RepoResult<BTreeMap<String, String>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let entries = stmt
        .query_map([owner_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(entries)
}

// The in-memory definition may disagree with the stored row it points at.
fn ensure_stored_definition_fits(
    conn: &Connection,
    kind: ConfigurationKind,
    definition_id: DefinitionId,
) -> RepoResult<()> {
    let stored_type: Option<String> = conn
        .query_row(
            "SELECT definition_type FROM calendar_definitions WHERE id = ?1;",
            [definition_id],
            |row| row.get(0),
        )
        .optional()?;
    match stored_type.as_deref() {
        None => Err(RepoError::NotFound {
            entity: EntityKind::Definition,
            id: definition_id,
        }),
        Some("predefined") => Ok(()),
        Some(_) if kind == ConfigurationKind::Predefined => Err(RepoError::Validation(
            CalendarValidationError::PredefinedConfigurationRequiresPredefinedDefinition,
        )),
        Some(_) => Ok(()),
    }
}

fn missing_or_kind_changed(
    conn: &Connection,
    table: &'static str,
    entity: EntityKind,
    id: i64,
) -> RepoError {
    let exists = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get::<_, i64>(0),
    );
    match exists {
        Ok(1) => RepoError::KindChanged { entity, id },
        Ok(_) => RepoError::NotFound { entity, id },
        Err(err) => err.into(),
    }
}

fn parse_flag(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in calendar_configurations.{column}"
        ))),
    }
}

fn definition_kind_to_db(kind: &DefinitionKind) -> &'static str {
    match kind {
        DefinitionKind::Calendar => "calendar",
        DefinitionKind::Predefined(_) => "predefined",
    }
}

fn configuration_kind_to_db(kind: ConfigurationKind) -> &'static str {
    match kind {
        ConfigurationKind::Predefined => "predefined",
        ConfigurationKind::UserDefined => "user_defined",
    }
}

fn parse_configuration_kind(value: &str) -> Option<ConfigurationKind> {
    match value {
        "predefined" => Some(ConfigurationKind::Predefined),
        "user_defined" => Some(ConfigurationKind::UserDefined),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_calendar_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
        (
            "calendar_definitions",
            &["id", "definition_type", "class_name", "name", "fname"],
        ),
        (
            "calendar_definition_parameters",
            &["definition_id", "name", "value"],
        ),
        ("predefined_default_roles", &["definition_id", "role"]),
        (
            "calendar_configurations",
            &[
                "id",
                "configuration_type",
                "definition_id",
                "subscribe_id",
                "displayed",
                "visible_only",
            ],
        ),
        (
            "calendar_configuration_preferences",
            &["configuration_id", "name", "value"],
        ),
    ];

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
