pub mod composer;
pub mod config;
pub mod platform;

pub use composer::{InsightsComposer, WEEKLY_PERFORMANCE_DAYS};
pub use config::CacheTtlConfig;
pub use platform::{PlatformInsights, RATING_SCALE};
