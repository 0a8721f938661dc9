pub trait DbConnectConfig: serde::de::DeserializeOwned {
    fn uri(&self) -> &str;

    fn read_replica_uri(&self) -> Option<&str> { None }
}

/// Configure database connection pool data
pub trait DbOptionsConfig {
    fn max_conn(&self) -> Option<u32> { None }
    fn min_conn(&self) -> Option<u32> { None }
    fn sql_logger(&self) -> bool { false }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PostgresDbConfig {
    pub uri: String,
    pub max_conn: Option<u32>,
    pub min_conn: Option<u32>,
    #[serde(default = "logger_default")]
    pub logger: bool,
    /// Reporting queries go to the replica when one is configured.
    #[serde(default)]
    pub read_replica_uri: Option<String>,
}

impl DbConnectConfig for PostgresDbConfig {
    fn uri(&self) -> &str { &self.uri }

    fn read_replica_uri(&self) -> Option<&str> {
        self.read_replica_uri.as_deref()
    }
}

impl DbOptionsConfig for PostgresDbConfig {
    fn max_conn(&self) -> Option<u32> { self.max_conn }

    fn min_conn(&self) -> Option<u32> { self.min_conn }

    fn sql_logger(&self) -> bool { self.logger }
}

fn logger_default() -> bool { false }
