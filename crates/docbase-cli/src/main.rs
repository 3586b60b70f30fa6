//! docbase CLI - list, insert, delete and print MongoDB documents
//!
//! Usage:
//!   docbase collections                       List collections in the database
//!   docbase databases                         List databases on the server
//!   docbase list [--filter JSON] [--sort JSON] [--limit N]
//!   docbase insert '{"username": "smith"}'    Insert one document
//!   docbase insert DOC DOC ...                Insert many documents
//!   docbase insert-user smith jones           Insert users by name
//!   docbase delete --filter '{"username": "smith"}'
//!   docbase delete --all                      Empty the collection
//!   docbase count [--filter JSON]
//!   docbase ping
//!   docbase script connect|insert-users|delete-users
//!
//! Connection: --uri, or --host/--port (default localhost:27017),
//! database from -d, else the URI's path, else `tutorial`; collection `users`.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use docbase_mongodb::{CollectionRef, Connection, OutputFormat};
use std::path::PathBuf;
use tracing::debug;

use commands::{DeleteTarget, ListOptions, Script};
use config::{FileConfig, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(name = "docbase")]
#[command(about = "List, insert, delete and print MongoDB documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Connection string (overrides --host/--port)
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Server host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Database name (default: the URI's database, else tutorial)
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Collection name (default: users)
    #[arg(short, long, global = true)]
    collection: Option<String>,

    /// Config file (default: ./docbase.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Document output format (pretty, json, debug)
    #[arg(long, global = true, default_value = "pretty", value_parser = parse_output_format)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            uri: self.uri.clone(),
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            collection: self.collection.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List collection names in the database
    Collections,

    /// List database names on the server
    Databases,

    /// Print documents in the collection
    List {
        /// Filter document as JSON
        #[arg(short, long)]
        filter: Option<String>,

        /// Sort document as JSON, e.g. '{"username": 1}'
        #[arg(long)]
        sort: Option<String>,

        /// Number of documents to skip
        #[arg(long)]
        skip: Option<u64>,

        /// Maximum number of documents to print
        #[arg(short = 'n', long)]
        limit: Option<i64>,
    },

    /// Insert documents given as JSON objects
    Insert {
        /// One or more JSON documents
        #[arg(required = true)]
        documents: Vec<String>,

        /// Use a batch insert even for a single document
        #[arg(long)]
        many: bool,
    },

    /// Insert users by username (always into the `users` collection)
    InsertUser {
        #[arg(required = true)]
        usernames: Vec<String>,
    },

    /// Delete the first document matching a filter, or every document
    #[command(group(ArgGroup::new("target").required(true).args(["filter", "all"])))]
    Delete {
        /// Filter document as JSON
        #[arg(short, long)]
        filter: Option<String>,

        /// Delete every match of --filter instead of the first
        #[arg(long, requires = "filter")]
        many: bool,

        /// Delete every document in the collection
        #[arg(long)]
        all: bool,
    },

    /// Count documents matching a filter
    Count {
        /// Filter document as JSON
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Check that the server answers
    Ping,

    /// Run one of the tutorial scripts
    Script {
        #[arg(value_enum)]
        name: Script,
    },
}

fn parse_output_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

fn delete_target(filter: Option<String>, many: bool, all: bool) -> Result<DeleteTarget> {
    match (filter, many, all) {
        (_, _, true) => Ok(DeleteTarget::All),
        (Some(filter), true, false) => Ok(DeleteTarget::Many(filter)),
        (Some(filter), false, false) => Ok(DeleteTarget::One(filter)),
        (None, _, false) => anyhow::bail!("delete needs --filter or --all"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(&cli.log_level)?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let file = match FileConfig::discover(cli.config.as_deref(), &cwd)? {
        Some((path, file)) => {
            debug!(path = %path.display(), "loaded config file");
            file
        }
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file, |key| std::env::var(key).ok(), &cli.overrides())?;

    let conn = Connection::with_default_database(
        &settings.uri,
        settings.database.as_deref(),
        config::DEFAULT_DATABASE,
        settings.pool.clone(),
    )
    .await
    .context("Failed to create MongoDB client")?;

    let result = run(&conn, &settings, cli.command, cli.format).await;
    conn.close().await;
    result
}

async fn run(
    conn: &Connection,
    settings: &Settings,
    command: Commands,
    format: OutputFormat,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let collection = CollectionRef::new(conn, &settings.collection);

    match command {
        Commands::Collections => commands::list_collections(conn, &mut out).await,
        Commands::Databases => commands::list_databases(conn, &mut out).await,
        Commands::List {
            filter,
            sort,
            skip,
            limit,
        } => {
            let options = ListOptions {
                filter,
                sort,
                skip,
                limit,
            };
            commands::list_documents(conn, &settings.collection, options, format, &mut out).await
        }
        Commands::Insert { documents, many } => {
            commands::insert_documents(&collection, &documents, many, &mut out).await
        }
        Commands::InsertUser { usernames } => {
            commands::insert_users(conn, &settings.collection, &usernames, &mut out).await
        }
        Commands::Delete { filter, many, all } => {
            let target = delete_target(filter, many, all)?;
            commands::delete_documents(&collection, target, &mut out).await
        }
        Commands::Count { filter } => {
            commands::count_documents(&collection, filter.as_deref(), &mut out).await
        }
        Commands::Ping => commands::ping(conn, &mut out).await,
        Commands::Script { name } => commands::run_script(conn, name, format, &mut out).await,
    }
}

/// Initialize logging based on log level; output goes to stderr
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "docbase", "collections", "--host", "db", "--port", "27018", "-d", "shop",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.host.as_deref(), Some("db"));
        assert_eq!(overrides.port, Some(27018));
        assert_eq!(overrides.database.as_deref(), Some("shop"));
        assert!(matches!(cli.command, Commands::Collections));
        assert_eq!(cli.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_parse_format() {
        let cli = Cli::try_parse_from(["docbase", "--format", "json", "list"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(Cli::try_parse_from(["docbase", "--format", "xml", "list"]).is_err());
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::try_parse_from([
            "docbase", "list", "--filter", r#"{"username":"smith"}"#, "-n", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::List { filter, limit, sort, skip } => {
                assert_eq!(filter.as_deref(), Some(r#"{"username":"smith"}"#));
                assert_eq!(limit, Some(3));
                assert!(sort.is_none());
                assert!(skip.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_many() {
        let cli = Cli::try_parse_from(["docbase", "insert", "{}", "{}", "--many"]).unwrap();
        match cli.command {
            Commands::Insert { documents, many } => {
                assert_eq!(documents.len(), 2);
                assert!(many);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["docbase", "insert"]).is_err());
    }

    #[test]
    fn test_parse_delete_requires_target() {
        assert!(Cli::try_parse_from(["docbase", "delete"]).is_err());
        assert!(Cli::try_parse_from(["docbase", "delete", "--many"]).is_err());
        assert!(Cli::try_parse_from(["docbase", "delete", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["docbase", "delete", "-f", "{}", "--all"]).is_err());
    }

    #[test]
    fn test_parse_script_names() {
        for (arg, expected) in [
            ("connect", Script::Connect),
            ("insert-users", Script::InsertUsers),
            ("delete-users", Script::DeleteUsers),
        ] {
            let cli = Cli::try_parse_from(["docbase", "script", arg]).unwrap();
            assert!(matches!(cli.command, Commands::Script { name } if name == expected));
        }
        assert!(Cli::try_parse_from(["docbase", "script", "drop-everything"]).is_err());
    }

    #[test]
    fn test_delete_target() {
        assert_eq!(delete_target(None, false, true).unwrap(), DeleteTarget::All);
        assert_eq!(
            delete_target(Some("{}".to_string()), true, false).unwrap(),
            DeleteTarget::Many("{}".to_string())
        );
        assert_eq!(
            delete_target(Some("{}".to_string()), false, false).unwrap(),
            DeleteTarget::One("{}".to_string())
        );
        assert!(delete_target(None, false, false).is_err());
    }
}
