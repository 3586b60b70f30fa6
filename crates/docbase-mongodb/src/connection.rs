//! MongoDB connection management with pool configuration and health checking

use bson::{doc, Document as BsonDocument};
use docbase_common::{DocbaseError, Result};
use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database,
};
use std::time::Duration;
use tracing::{debug, info};

/// Host the tutorial scripts connect to
pub const DEFAULT_HOST: &str = "localhost";

/// Default MongoDB port
pub const DEFAULT_PORT: u16 = 27017;

/// Build a `mongodb://host:port` URI, bracketing IPv6 literals
pub fn uri_from_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("mongodb://[{}]:{}", host, port)
    } else {
        format!("mongodb://{}:{}", host, port)
    }
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool (default: 0)
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool (default: 10)
    pub max_pool_size: Option<u32>,
    /// Maximum time a connection can remain idle before being closed (default: none)
    pub max_idle_time: Option<Duration>,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: 30s)
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            // One command per process, nothing to keep warm
            min_pool_size: Some(0),
            max_pool_size: Some(10),
            max_idle_time: None,
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            app_name: Some("docbase".to_string()),
        }
    }
}

impl PoolConfig {
    fn apply(self, client_options: &mut ClientOptions) {
        if let Some(min) = self.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = self.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(idle) = self.max_idle_time {
            client_options.max_idle_time = Some(idle);
        }
        if let Some(connect) = self.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = self.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = self.app_name {
            client_options.app_name = Some(app);
        }
    }
}

/// Pick the database to use: explicit name, then the URI's default, then `fallback`
fn resolve_database_name(
    explicit: Option<&str>,
    uri_default: Option<&str>,
    fallback: Option<&str>,
) -> Result<String> {
    [explicit, uri_default, fallback]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DocbaseError::Connection(
                "No database name given and none specified in connection string".to_string(),
            )
        })
}

/// MongoDB connection handle: the driver client plus the selected database
pub struct Connection {
    client: Client,
    database: Database,
    database_name: String,
}

impl Connection {
    /// Create a new MongoDB connection with default pool settings
    pub async fn new(connection_string: &str, database_name: &str) -> Result<Self> {
        Self::with_config(connection_string, database_name, PoolConfig::default()).await
    }

    /// Connect to `host:port`, the way the tutorial scripts address the server
    pub async fn from_host_port(host: &str, port: u16, database_name: &str) -> Result<Self> {
        Self::new(&uri_from_host_port(host, port), database_name).await
    }

    /// Create a new MongoDB connection with custom pool configuration
    ///
    /// An empty `database_name` falls back to the default database of the URI.
    /// The driver connects lazily, so this does not contact the server.
    pub async fn with_config(
        connection_string: &str,
        database_name: &str,
        config: PoolConfig,
    ) -> Result<Self> {
        Self::connect(connection_string, Some(database_name), None, config).await
    }

    /// Like [`Connection::with_config`], but when neither `database_name` nor
    /// the URI names a database, `fallback` is used instead of failing
    pub async fn with_default_database(
        connection_string: &str,
        database_name: Option<&str>,
        fallback: &str,
        config: PoolConfig,
    ) -> Result<Self> {
        Self::connect(connection_string, database_name, Some(fallback), config).await
    }

    async fn connect(
        connection_string: &str,
        database_name: Option<&str>,
        fallback: Option<&str>,
        config: PoolConfig,
    ) -> Result<Self> {
        let mut client_options = ClientOptions::parse(connection_string).await?;
        config.apply(&mut client_options);

        // Set stable API version for compatibility
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);

        let database_name = resolve_database_name(
            database_name,
            client_options.default_database.as_deref(),
            fallback,
        )?;

        let client = Client::with_options(client_options)?;
        let database = client.database(&database_name);

        info!(database = %database_name, "MongoDB client created");

        Ok(Self {
            client,
            database,
            database_name,
        })
    }

    /// Get a reference to the database
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the database name
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Get a reference to the client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a collection by name (returns untyped BsonDocument collection)
    pub fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection(name)
    }

    /// Get a typed collection
    pub fn typed_collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    /// Reference another database on the same client
    pub fn use_database(&self, name: &str) -> Database {
        self.client.database(name)
    }

    /// Check if the connection is healthy by pinging the server
    pub async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DocbaseError::Connection(format!("Ping failed: {}", e)))?;
        debug!(database = %self.database_name, "ping ok");
        Ok(())
    }

    /// List all collection names in the current database, sorted
    pub async fn list_collection_names(&self) -> Result<Vec<String>> {
        let mut names = self.database.list_collection_names().await?;
        names.sort();
        debug!(count = names.len(), "listed collections");
        Ok(names)
    }

    /// List all database names on the server
    pub async fn list_database_names(&self) -> Result<Vec<String>> {
        let names = self.client.list_database_names().await?;
        Ok(names)
    }

    /// Release the client and its pooled sockets
    pub async fn close(self) {
        debug!(database = %self.database_name, "closing MongoDB client");
        self.client.shutdown().await;
    }
}
