//! Administrative command line for the calendar store.
//!
//! # Responsibility
//! - Seed predefined calendar definitions and initialize subscribers.
//! - Inspect a subscriber's configurations as JSON.

use anyhow::{anyhow, bail, Context, Result};
use calstore_core::{
    CalendarDefinition, CalendarRepository, CalendarStore, SqliteCalendarRepository, StoreConfig,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "calstore", version)]
#[command(about = "Manage calendar definitions and subscriber configurations")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "CALSTORE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path, overrides the config file
    #[arg(long, global = true, env = "CALSTORE_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a predefined calendar definition
    Define {
        /// Display name
        #[arg(long)]
        name: String,
        /// Functional name used for lookups
        #[arg(long)]
        fname: String,
        /// Adapter reading the calendar source
        #[arg(long, default_value = "ical")]
        class_name: String,
        /// Role the calendar is configured for by default (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Adapter parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        parameters: Vec<(String, String)>,
    },
    /// Configure a subscriber's default predefined calendars for a role
    Init {
        #[arg(long)]
        subscriber: String,
        #[arg(long)]
        role: String,
    },
    /// List a subscriber's configurations
    List {
        #[arg(long)]
        subscriber: String,
        /// Restrict to one configuration kind; without it only displayed
        /// configurations are listed
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Keep only visible-only configurations (requires --kind)
        #[arg(long, requires = "kind")]
        visible_only: bool,
    },
    /// List predefined calendars outside a role's defaults the subscriber has not configured
    Hidden {
        #[arg(long)]
        subscriber: String,
        #[arg(long)]
        role: String,
    },
    /// List every predefined definition
    Predefined,
    /// Show one definition
    ShowDefinition { id: i64 },
    /// Show one configuration
    ShowConfiguration { id: i64 },
    /// Delete one configuration
    DeleteConfiguration { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Predefined,
    UserDefined,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    config
        .init_logging()
        .map_err(|err| anyhow!("failed to start logging: {err}"))?;

    let conn = config.open_database().with_context(|| {
        format!(
            "failed to open database `{}`",
            config.database_path.display()
        )
    })?;
    let store = CalendarStore::new(SqliteCalendarRepository::try_new(&conn)?);
    let output = execute(&store, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute<R: CalendarRepository>(store: &CalendarStore<R>, command: Commands) -> Result<Value> {
    match command {
        Commands::Define {
            name,
            fname,
            class_name,
            roles,
            parameters,
        } => {
            let existing_id = store
                .get_predefined_calendar_definition_by_fname(&fname)?
                .and_then(|definition| definition.id);
            let mut definition = CalendarDefinition::predefined(class_name, name, &fname, roles);
            definition.id = existing_id;
            definition.parameters = parameters.into_iter().collect();
            store.store_calendar_definition(&mut definition)?;
            info!(
                "event=cli_define module=cli status=ok fname={fname} replaced={}",
                existing_id.is_some()
            );
            to_json(&definition)
        }
        Commands::Init { subscriber, role } => {
            store.init_calendar(&subscriber, &role)?;
            to_json(&store.get_predefined_calendar_configurations(&subscriber, false)?)
        }
        Commands::List {
            subscriber,
            kind,
            visible_only,
        } => {
            let configurations = match kind {
                None => store.get_calendar_configurations(&subscriber)?,
                Some(KindArg::Predefined) => {
                    store.get_predefined_calendar_configurations(&subscriber, visible_only)?
                }
                Some(KindArg::UserDefined) => {
                    store.get_user_defined_calendar_configurations(&subscriber, visible_only)?
                }
            };
            to_json(&configurations)
        }
        Commands::Hidden { subscriber, role } => {
            to_json(&store.get_hidden_predefined_calendar_definitions(&subscriber, &role)?)
        }
        Commands::Predefined => to_json(&store.get_predefined_calendar_definitions()?),
        Commands::ShowDefinition { id } => match store.get_calendar_definition(id)? {
            Some(definition) => to_json(&definition),
            None => bail!("calendar definition {id} not found"),
        },
        Commands::ShowConfiguration { id } => match store.get_calendar_configuration(id)? {
            Some(configuration) => to_json(&configuration),
            None => bail!("calendar configuration {id} not found"),
        },
        Commands::DeleteConfiguration { id } => {
            let configuration = store
                .get_calendar_configuration(id)?
                .with_context(|| format!("calendar configuration {id} not found"))?;
            store.delete_calendar_configuration(&configuration)?;
            to_json(&configuration)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => match &cli.database {
            Some(database) => StoreConfig::new(database),
            None => bail!("either --config or --database is required"),
        },
    };
    if let Some(database) = &cli.database {
        config.database_path = database.clone();
    }
    Ok(config)
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
