use std::time::Duration;

use serde::Deserialize;

/// Cache lifetime per metric family, in seconds. Zero disables caching
/// for that family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheTtlConfig {
    #[serde(default = "default_overview")]
    pub overview: u64,
    #[serde(default = "default_trend")]
    pub revenue_trend: u64,
    #[serde(default = "default_trend")]
    pub order_trend: u64,
    #[serde(default = "default_breakdown")]
    pub category_mix: u64,
    #[serde(default = "default_breakdown")]
    pub city_distribution: u64,
    #[serde(default = "default_trend")]
    pub hourly_activity: u64,
    #[serde(default = "default_trend")]
    pub weekly_performance: u64,
    #[serde(default = "default_platform")]
    pub platform_overview: u64,
    #[serde(default = "default_platform")]
    pub platform_revenue_trend: u64,
    #[serde(default = "default_platform")]
    pub provider_ranking: u64,
    #[serde(default = "default_platform")]
    pub rating_distribution: u64,
}

fn default_overview() -> u64 { 300 }

fn default_trend() -> u64 { 600 }

fn default_breakdown() -> u64 { 900 }

fn default_platform() -> u64 { 1800 }

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            overview: default_overview(),
            revenue_trend: default_trend(),
            order_trend: default_trend(),
            category_mix: default_breakdown(),
            city_distribution: default_breakdown(),
            hourly_activity: default_trend(),
            weekly_performance: default_trend(),
            platform_overview: default_platform(),
            platform_revenue_trend: default_platform(),
            provider_ranking: default_platform(),
            rating_distribution: default_platform(),
        }
    }
}

impl CacheTtlConfig {
    /// Every family uncached.
    pub fn disabled() -> Self {
        Self {
            overview: 0,
            revenue_trend: 0,
            order_trend: 0,
            category_mix: 0,
            city_distribution: 0,
            hourly_activity: 0,
            weekly_performance: 0,
            platform_overview: 0,
            platform_revenue_trend: 0,
            provider_ranking: 0,
            rating_distribution: 0,
        }
    }

    /// Looks up a family by its environment name, e.g. `CITY_DISTRIBUTION`.
    pub fn family_mut(&mut self, family: &str) -> Option<&mut u64> {
        let slot = match family.to_ascii_lowercase().as_str() {
            "overview" => &mut self.overview,
            "revenue_trend" => &mut self.revenue_trend,
            "order_trend" => &mut self.order_trend,
            "category_mix" => &mut self.category_mix,
            "city_distribution" => &mut self.city_distribution,
            "hourly_activity" => &mut self.hourly_activity,
            "weekly_performance" => &mut self.weekly_performance,
            "platform_overview" => &mut self.platform_overview,
            "platform_revenue_trend" => &mut self.platform_revenue_trend,
            "provider_ranking" => &mut self.provider_ranking,
            "rating_distribution" => &mut self.rating_distribution,
            _ => return None,
        };
        Some(slot)
    }

    pub fn families() -> [&'static str; 11] {
        [
            "overview",
            "revenue_trend",
            "order_trend",
            "category_mix",
            "city_distribution",
            "hourly_activity",
            "weekly_performance",
            "platform_overview",
            "platform_revenue_trend",
            "provider_ranking",
            "rating_distribution",
        ]
    }
}

pub(crate) fn secs(ttl: u64) -> Duration { Duration::from_secs(ttl) }
