use calstore_core::db::open_db_in_memory;
use calstore_core::{
    CalendarConfiguration, CalendarDefinition, CalendarStore, ConfigurationKind, EntityKind,
    RepoError, SqliteCalendarRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;

type Store<'conn> = CalendarStore<SqliteCalendarRepository<'conn>>;

fn store(conn: &Connection) -> Store<'_> {
    CalendarStore::new(SqliteCalendarRepository::try_new(conn).unwrap())
}

fn predefined(store: &Store<'_>, name: &str, roles: &[&str]) -> CalendarDefinition {
    let mut definition = CalendarDefinition::predefined(
        "ical",
        name,
        name.to_lowercase(),
        roles.iter().copied(),
    )
    .with_parameter("url", format!("https://calendars.example.edu/{name}.ics"));
    store.store_calendar_definition(&mut definition).unwrap();
    definition
}

fn user_defined(store: &Store<'_>, subscriber: &str, name: &str) -> CalendarConfiguration {
    let mut configuration =
        CalendarConfiguration::user_defined(CalendarDefinition::new("ical", name), subscriber);
    store.store_calendar_configuration(&mut configuration).unwrap();
    configuration
}

fn count_configurations(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM calendar_configurations;", [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn stored_definition_is_returned_by_id() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let definition = predefined(&store, "Academic", &["student"]);
    let id = definition.id.unwrap();

    assert_eq!(store.get_calendar_definition(id).unwrap(), Some(definition));
    assert_eq!(store.get_calendar_definition(id + 1).unwrap(), None);
}

#[test]
fn storing_configuration_cascades_to_transient_definition() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let configuration = user_defined(&store, "sub1", "Team");

    let definition_id = configuration.calendar_definition.id.unwrap();
    let loaded = store
        .get_calendar_configuration(configuration.id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(loaded, configuration);
    assert_eq!(
        store.get_calendar_definition(definition_id).unwrap().unwrap().name,
        "Team"
    );
}

#[test]
fn storing_an_existing_configuration_updates_it() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let mut configuration = user_defined(&store, "sub1", "Team");
    let id = configuration.id;
    configuration.visible_only = true;
    configuration
        .preferences
        .insert("color".to_string(), "green".to_string());
    configuration.calendar_definition.name = "Team Rota".to_string();
    configuration
        .calendar_definition
        .parameters
        .insert("url".to_string(), "https://example.org/team.ics".to_string());
    let definition_id = configuration.calendar_definition.id;
    store.store_calendar_configuration(&mut configuration).unwrap();

    assert_eq!(configuration.id, id);
    assert_eq!(configuration.calendar_definition.id, definition_id);
    assert_eq!(count_configurations(&conn), 1);
    let loaded = store.get_calendar_configuration(id.unwrap()).unwrap().unwrap();
    assert!(loaded.visible_only);
    assert_eq!(loaded.preferences.get("color").map(String::as_str), Some("green"));
    assert_eq!(loaded.calendar_definition.name, "Team Rota");
    assert_eq!(
        loaded.calendar_definition.parameters.get("url").map(String::as_str),
        Some("https://example.org/team.ics")
    );
    assert_eq!(loaded, configuration);
}

#[test]
fn predefined_configuration_over_stored_plain_definition_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let mine = user_defined(&store, "sub1", "Mine");
    let mut disguised = CalendarDefinition::predefined("ical", "Mine", "mine", ["student"]);
    disguised.id = mine.calendar_definition.id;
    let mut configuration = CalendarConfiguration::predefined(disguised, "sub1");

    let err = store
        .store_calendar_configuration(&mut configuration)
        .unwrap_err();
    assert_eq!(err.operation(), "store_calendar_configuration");
    assert_eq!(configuration.id, None);
    assert_eq!(count_configurations(&conn), 1);
    assert_eq!(store.get_calendar_configurations("sub1").unwrap(), vec![mine]);
}

#[test]
fn calendar_configurations_include_displayed_rows_only() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let shown = user_defined(&store, "sub1", "Shown");
    let mut hidden = user_defined(&store, "sub1", "Hidden");
    hidden.displayed = false;
    store.store_calendar_configuration(&mut hidden).unwrap();
    user_defined(&store, "sub2", "Someone else");

    let configurations = store.get_calendar_configurations("sub1").unwrap();
    assert_eq!(configurations, vec![shown]);
    assert!(store.get_calendar_configurations("nobody").unwrap().is_empty());
}

#[test]
fn list_queries_are_ordered_by_definition_name() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    for name in ["Charlie", "Alpha", "Bravo"] {
        user_defined(&store, "sub1", name);
    }
    let mixed = predefined(&store, "Alpine", &["student"]);
    store.init_calendar("sub1", "student").unwrap();

    let names = |configurations: Vec<CalendarConfiguration>| {
        configurations
            .into_iter()
            .map(|configuration| configuration.calendar_definition.name)
            .collect::<Vec<_>>()
    };
    assert_eq!(
        names(store.get_calendar_configurations("sub1").unwrap()),
        vec!["Alpha", "Alpine", "Bravo", "Charlie"]
    );
    assert_eq!(
        names(
            store
                .get_user_defined_calendar_configurations("sub1", false)
                .unwrap()
        ),
        vec!["Alpha", "Bravo", "Charlie"]
    );
    assert_eq!(
        names(
            store
                .get_predefined_calendar_configurations("sub1", false)
                .unwrap()
        ),
        vec![mixed.name]
    );
}

#[test]
fn kind_queries_return_only_their_variant() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    predefined(&store, "Campus", &["staff"]);
    store.init_calendar("sub1", "staff").unwrap();
    user_defined(&store, "sub1", "Mine");

    let user_defined = store
        .get_user_defined_calendar_configurations("sub1", false)
        .unwrap();
    assert!(user_defined
        .iter()
        .all(|configuration| configuration.kind == ConfigurationKind::UserDefined));
    assert_eq!(user_defined.len(), 1);

    let predefined = store
        .get_predefined_calendar_configurations("sub1", false)
        .unwrap();
    assert!(predefined
        .iter()
        .all(|configuration| configuration.kind == ConfigurationKind::Predefined));
    assert_eq!(predefined.len(), 1);
}

#[test]
fn visible_only_filter_returns_a_subset() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    user_defined(&store, "sub1", "Plain");
    let mut visible = user_defined(&store, "sub1", "Visible");
    visible.visible_only = true;
    store.store_calendar_configuration(&mut visible).unwrap();

    let all: HashSet<_> = store
        .get_user_defined_calendar_configurations("sub1", false)
        .unwrap()
        .into_iter()
        .map(|configuration| configuration.id)
        .collect();
    let visible_only: HashSet<_> = store
        .get_user_defined_calendar_configurations("sub1", true)
        .unwrap()
        .into_iter()
        .map(|configuration| configuration.id)
        .collect();

    assert!(visible_only.is_subset(&all));
    assert_eq!(visible_only, HashSet::from([visible.id]));
    assert_eq!(all.len(), 2);
}

#[test]
fn init_calendar_creates_one_configuration_and_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let definition = predefined(&store, "Student Life", &["student"]);

    store.init_calendar("sub1", "student").unwrap();
    let created = store
        .get_predefined_calendar_configurations("sub1", false)
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].calendar_definition, definition);
    assert_eq!(created[0].subscribe_id, "sub1");
    assert!(created[0].displayed);

    store.init_calendar("sub1", "student").unwrap();
    assert_eq!(count_configurations(&conn), 1);
}

#[test]
fn init_calendar_ignores_other_roles_and_existing_configurations() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let staff_only = predefined(&store, "Payroll", &["staff"]);
    let shared = predefined(&store, "Events", &["staff", "student"]);
    let mut existing = CalendarConfiguration::predefined(shared, "sub1");
    existing.displayed = false;
    store.store_calendar_configuration(&mut existing).unwrap();

    store.init_calendar("sub1", "student").unwrap();
    assert_eq!(count_configurations(&conn), 1);

    store.init_calendar("sub1", "staff").unwrap();
    let configured: Vec<_> = store
        .get_predefined_calendar_configurations("sub1", false)
        .unwrap()
        .into_iter()
        .map(|configuration| configuration.calendar_definition.id)
        .collect();
    assert_eq!(configured, vec![existing.calendar_definition.id, staff_only.id]);
}

#[test]
fn hidden_definitions_exclude_role_defaults_and_configured_calendars() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    predefined(&store, "Student Life", &["student"]);
    let athletics = predefined(&store, "Athletics", &["staff"]);
    let library = predefined(&store, "Library", &[]);
    store.init_calendar("sub1", "student").unwrap();

    let hidden = store
        .get_hidden_predefined_calendar_definitions("sub1", "student")
        .unwrap();
    assert_eq!(hidden, vec![athletics.clone(), library.clone()]);

    let mut subscribed = CalendarConfiguration::predefined(athletics, "sub1");
    store.store_calendar_configuration(&mut subscribed).unwrap();
    let hidden = store
        .get_hidden_predefined_calendar_definitions("sub1", "student")
        .unwrap();
    assert_eq!(hidden, vec![library]);
}

#[test]
fn predefined_definitions_can_be_listed_and_found_by_fname() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let zeta = predefined(&store, "Zeta", &["student"]);
    let beta = predefined(&store, "Beta", &[]);
    user_defined(&store, "sub1", "Alpha");

    assert_eq!(
        store.get_predefined_calendar_definitions().unwrap(),
        vec![beta, zeta.clone()]
    );
    assert_eq!(
        store
            .get_predefined_calendar_definition_by_fname("zeta")
            .unwrap(),
        Some(zeta)
    );
    assert!(store
        .get_predefined_calendar_definition_by_fname("missing")
        .unwrap()
        .is_none());
}

#[test]
fn deleted_configuration_is_never_returned() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let configuration = user_defined(&store, "sub1", "Temporary");
    let id = configuration.id.unwrap();
    store.delete_calendar_configuration(&configuration).unwrap();

    assert!(store.get_calendar_configuration(id).unwrap().is_none());
    assert!(store.get_calendar_configurations("sub1").unwrap().is_empty());
    assert!(store
        .get_calendar_definition(configuration.calendar_definition.id.unwrap())
        .unwrap()
        .is_some());
}

#[test]
fn repository_failures_surface_as_data_access_errors() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let configuration = user_defined(&store, "sub1", "Once");
    store.delete_calendar_configuration(&configuration).unwrap();
    let err = store
        .delete_calendar_configuration(&configuration)
        .unwrap_err();

    assert_eq!(err.operation(), "delete_calendar_configuration");
    assert!(matches!(
        err.repo_error(),
        RepoError::NotFound {
            entity: EntityKind::Configuration,
            ..
        }
    ));
    assert!(err.source().is_some());
    assert!(err.to_string().starts_with("data access failure"));

    let transient =
        CalendarConfiguration::user_defined(CalendarDefinition::new("ical", "Never"), "sub1");
    let err = store.delete_calendar_configuration(&transient).unwrap_err();
    assert!(matches!(
        err.into_repo_error(),
        RepoError::Transient(EntityKind::Configuration)
    ));
}

#[test]
fn failed_store_rolls_back_and_restores_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = store(&conn);

    let mut configuration =
        CalendarConfiguration::user_defined(CalendarDefinition::new("ical", "Stale"), "sub1");
    configuration.id = Some(999);

    let err = store
        .store_calendar_configuration(&mut configuration)
        .unwrap_err();
    assert_eq!(err.operation(), "store_calendar_configuration");
    assert_eq!(configuration.id, Some(999));
    assert_eq!(configuration.calendar_definition.id, None);

    let definitions: i64 = conn
        .query_row("SELECT COUNT(*) FROM calendar_definitions;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(definitions, 0);
}
