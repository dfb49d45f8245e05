//! Subscription tiers and bucket capacities.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Subscription level that parameterizes bucket capacities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            _ => None,
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound on a bucket's weighted occupancy, in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Unlimited,
    Limited(u32),
}

impl Capacity {
    /// Capacity in half-units, `None` when unlimited.
    pub fn as_halves(self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Limited(limit) => Some(limit.saturating_mul(2)),
        }
    }
}

impl Display for Capacity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Limited(limit) => write!(f, "{limit}"),
        }
    }
}

/// Supplies the subscription tier in effect for the current call.
pub trait TierSource {
    fn current_tier(&self) -> Tier;
}

impl TierSource for Tier {
    fn current_tier(&self) -> Tier {
        *self
    }
}

impl<F> TierSource for F
where
    F: Fn() -> Tier,
{
    fn current_tier(&self) -> Tier {
        self()
    }
}
