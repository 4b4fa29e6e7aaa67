//! Database backends
//!
//! The backend is chosen once per command. A dry run never leaves the
//! process; a live run needs a `mysql://` URL and a build with the `mysql`
//! feature. Asking for a backend this build does not have is an error, not
//! a silent fallback to a dry run.

use schemata_core::{Connection, EngineError, EngineResult};
use schemata_planner::MemoryConnection;
use tracing::info;

/// Where operations are sent
pub enum Backend {
    /// In-memory catalog; statements are recorded, nothing is sent
    DryRun(MemoryConnection),
    /// Live MySQL connection
    #[cfg(feature = "mysql")]
    MySql(mysql::MySqlBackend),
}

impl Backend {
    /// Pick the backend for a command
    pub fn resolve(database_url: Option<&str>, dry_run: bool) -> EngineResult<Self> {
        if dry_run {
            info!("Dry run, no statement is sent to a database");
            return Ok(Backend::DryRun(MemoryConnection::new()));
        }

        let Some(url) = database_url else {
            return Err(EngineError::Connection(
                "No database URL; pass --database-url, set DATABASE_URL, or use --dry-run"
                    .to_string(),
            ));
        };

        let scheme = url.split_once("://").map(|(s, _)| s).unwrap_or(url);
        match scheme {
            "mysql" => Self::connect_mysql(url),
            other => Err(EngineError::BackendUnavailable(other.to_string())),
        }
    }

    #[cfg(feature = "mysql")]
    fn connect_mysql(url: &str) -> EngineResult<Self> {
        Ok(Backend::MySql(mysql::MySqlBackend::connect(url)?))
    }

    #[cfg(not(feature = "mysql"))]
    fn connect_mysql(_url: &str) -> EngineResult<Self> {
        Err(EngineError::BackendUnavailable("mysql".to_string()))
    }

    /// Check if statements only go to the in-memory catalog
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Backend::DryRun(_))
    }

    /// The connection to run statements on
    pub fn connection(&mut self) -> &mut dyn Connection {
        match self {
            Backend::DryRun(conn) => conn,
            #[cfg(feature = "mysql")]
            Backend::MySql(conn) => conn,
        }
    }
}

#[cfg(feature = "mysql")]
pub mod mysql {
    //! Live MySQL through sqlx on a current-thread runtime

    use schemata_core::{Connection, EngineError, EngineResult, ExecResult, MySqlDialect, Quoter};
    use sqlx::mysql::MySqlConnection;
    use sqlx::{Connection as _, Row};
    use tokio::runtime::Runtime;
    use tracing::debug;

    pub struct MySqlBackend {
        runtime: Runtime,
        conn: MySqlConnection,
    }

    impl MySqlBackend {
        /// Open a connection
        pub fn connect(url: &str) -> EngineResult<Self> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| EngineError::Connection(e.to_string()))?;
            let conn = runtime
                .block_on(MySqlConnection::connect(url))
                .map_err(|e| EngineError::Connection(e.to_string()))?;
            debug!("Connected to MySQL");
            Ok(Self { runtime, conn })
        }
    }

    impl Quoter for MySqlBackend {
        fn quote_identifier(&self, ident: &str) -> String {
            MySqlDialect.quote_identifier(ident)
        }

        fn quote(&self, value: &str) -> String {
            MySqlDialect.quote(value)
        }
    }

    impl Connection for MySqlBackend {
        fn execute(&mut self, sql: &str) -> EngineResult<ExecResult> {
            let result = self
                .runtime
                .block_on(sqlx::raw_sql(sql).execute(&mut self.conn))
                .map_err(|e| EngineError::execution(sql, e.to_string()))?;

            let exec = ExecResult::new(result.rows_affected());
            Ok(match result.last_insert_id() {
                0 => exec,
                id => exec.with_insert_id(id),
            })
        }

        fn query_column(&mut self, sql: &str) -> EngineResult<Vec<String>> {
            let rows = self
                .runtime
                .block_on(sqlx::raw_sql(sql).fetch_all(&mut self.conn))
                .map_err(|e| EngineError::execution(sql, e.to_string()))?;

            rows.iter()
                .map(|row| {
                    row.try_get::<String, _>(0)
                        .or_else(|_| {
                            row.try_get::<Vec<u8>, _>(0)
                                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                        })
                        .map_err(|e| EngineError::execution(sql, e.to_string()))
                })
                .collect()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
