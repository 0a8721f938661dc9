//! Fakes and fixtures shared by the workspace's tests.

pub mod cache;
pub mod event_store;

use std::sync::Once;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
pub use cache::TestCache;
pub use event_store::{
    FailingEventStore, InMemoryEventStore, SlowEventStore, StoredEvent,
};

static TRACING: Once = Once::new();

/// Installs a test writer subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// UTC instant from calendar parts.
pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s)
        .single()
        .expect("valid UTC timestamp")
}

/// Same wall clock reading at `offset_hours` east of UTC.
pub fn local(
    offset_hours: i32, y: i32, m: u32, d: u32, h: u32, min: u32,
) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(offset_hours * 3600)
        .expect("valid offset")
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("valid local timestamp")
}

/// Postgres URL for integration tests; those tests skip when unset.
pub fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}
