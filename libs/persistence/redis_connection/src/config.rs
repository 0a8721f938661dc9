pub trait DbConnectConfig: serde::de::DeserializeOwned {
    #[allow(unused)]
    fn password(&self) -> Option<&str> { None }
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn db(&self) -> u8;
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RedisDbConfig {
    #[serde(default = "host_default")]
    pub host: String,
    #[serde(default = "port_default")]
    pub port: u16,
    #[serde(default = "db_default")]
    pub db: u8,
}

/// Settings for the in-process moka backend.
///
/// Entries expire after their own TTL; `max_ttl_secs` caps it so a
/// misconfigured family can never pin an entry forever.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub capacity: u64,
    #[serde(default = "default_memory_max_ttl_secs")]
    pub max_ttl_secs: u64,
}

impl DbConnectConfig for RedisDbConfig {
    fn password(&self) -> Option<&str> { None }

    fn host(&self) -> &str { &self.host }

    fn port(&self) -> u16 { self.port }

    fn db(&self) -> u8 { self.db }
}

impl Default for RedisDbConfig {
    fn default() -> Self {
        Self {
            host: host_default(),
            port: port_default(),
            db: db_default(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_memory_capacity(),
            max_ttl_secs: default_memory_max_ttl_secs(),
        }
    }
}

fn host_default() -> String { "127.0.0.1".into() }
fn port_default() -> u16 { 6379 }
fn db_default() -> u8 { 0 }
fn default_memory_capacity() -> u64 { 10_000 }
fn default_memory_max_ttl_secs() -> u64 { 3600 }

impl MemoryConfig {
    pub fn max_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.max_ttl_secs)
    }
}
