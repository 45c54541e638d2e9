//! Connector power classification and site-level aggregation.
//!
//! | Power (kW)      | Tier  |
//! |-----------------|-------|
//! | `p < 7`         | Slow  |
//! | `7 <= p <= 22`  | Fast  |
//! | `p > 22`        | Rapid |
//!
//! Connectors without a usable power reading count towards
//! `connector_count` but never towards tiers or min/max power.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::charger::Connector;

const FAST_MIN_KW: f64 = 7.0;
const FAST_MAX_KW: f64 = 22.0;

/// Charging capability tier. Ordering follows capability: `Unknown` is the
/// lowest so `max()` over a tier list yields the site tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChargingTier {
    Unknown,
    Slow,
    Fast,
    Rapid,
}

impl ChargingTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Slow => "Slow",
            Self::Fast => "Fast",
            Self::Rapid => "Rapid",
        }
    }
}

impl fmt::Display for ChargingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a single known power reading.
#[must_use]
pub fn tier(power_kw: f64) -> ChargingTier {
    if power_kw < FAST_MIN_KW {
        ChargingTier::Slow
    } else if power_kw <= FAST_MAX_KW {
        ChargingTier::Fast
    } else {
        ChargingTier::Rapid
    }
}

/// Derived site-level fields. Only constructible through [`summarize`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingSummary {
    connector_count: usize,
    min_power_kw: Option<f64>,
    max_power_kw: Option<f64>,
    tier_max: ChargingTier,
    rapid_available: bool,
    fast_available: bool,
    slow_available: bool,
}

impl ChargingSummary {
    #[must_use]
    pub fn connector_count(&self) -> usize {
        self.connector_count
    }

    #[must_use]
    pub fn min_power_kw(&self) -> Option<f64> {
        self.min_power_kw
    }

    #[must_use]
    pub fn max_power_kw(&self) -> Option<f64> {
        self.max_power_kw
    }

    #[must_use]
    pub fn tier_max(&self) -> ChargingTier {
        self.tier_max
    }

    #[must_use]
    pub fn rapid_available(&self) -> bool {
        self.rapid_available
    }

    #[must_use]
    pub fn fast_available(&self) -> bool {
        self.fast_available
    }

    #[must_use]
    pub fn slow_available(&self) -> bool {
        self.slow_available
    }
}

/// Roll a connector list up into site-level fields.
///
/// Availability flags are independent: a site with one Slow and one Rapid
/// connector reports both `slow_available` and `rapid_available`.
#[must_use]
pub fn summarize(connectors: &[Connector]) -> ChargingSummary {
    let powers: Vec<f64> = connectors.iter().filter_map(Connector::known_power_kw).collect();
    let tiers: Vec<ChargingTier> = powers.iter().copied().map(tier).collect();

    let min_power_kw = powers.iter().copied().reduce(f64::min);
    let max_power_kw = powers.iter().copied().reduce(f64::max);

    ChargingSummary {
        connector_count: connectors.len(),
        min_power_kw,
        max_power_kw,
        tier_max: tiers.iter().copied().max().unwrap_or(ChargingTier::Unknown),
        rapid_available: tiers.contains(&ChargingTier::Rapid),
        fast_available: tiers.contains(&ChargingTier::Fast),
        slow_available: tiers.contains(&ChargingTier::Slow),
    }
}
