//! Weighted bucket quota checks.
//!
//! # Responsibility
//! - Compute weighted occupancy (items 1, groups 0.5) per bucket.
//! - Decide whether an add or move-in fits the tier-dependent capacity.
//!
//! # Invariants
//! - Checks are advisory and side-effect free.
//! - Arithmetic is exact: weights are counted in half-units.

use crate::model::bucket::Bucket;
use crate::model::task::Task;
use crate::model::tier::{Capacity, Tier};
use crate::service::error::OrganizerError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Add;

const ITEM_HALVES: u32 = 2;
const GROUP_HALVES: u32 = 1;

/// Weighted occupancy measured in half-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occupancy {
    halves: u32,
}

impl Occupancy {
    pub const ZERO: Occupancy = Occupancy { halves: 0 };
    pub const ITEM: Occupancy = Occupancy {
        halves: ITEM_HALVES,
    };
    pub const GROUP: Occupancy = Occupancy {
        halves: GROUP_HALVES,
    };

    pub fn from_halves(halves: u32) -> Self {
        Self { halves }
    }

    pub fn halves(self) -> u32 {
        self.halves
    }

    /// Cost of adding one task of the given shape.
    pub fn for_shape(is_group: bool) -> Self {
        if is_group {
            Self::GROUP
        } else {
            Self::ITEM
        }
    }

    /// Weight of one existing task.
    pub fn of_task(task: &Task) -> Self {
        Self::for_shape(task.is_group())
    }

    /// Sum of weights over `tasks`.
    pub fn of_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks
            .into_iter()
            .map(Self::of_task)
            .fold(Self::ZERO, |total, weight| total + weight)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.halves) / 2.0
    }
}

impl Add for Occupancy {
    type Output = Occupancy;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            halves: self.halves.saturating_add(rhs.halves),
        }
    }
}

impl Display for Occupancy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let whole = self.halves / 2;
        if self.halves % 2 == 0 {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.5")
        }
    }
}

/// Per-bucket whole-unit limits for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketLimits {
    pub today: u32,
    pub tomorrow: u32,
    pub later: u32,
}

impl BucketLimits {
    pub fn get(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::Today => self.today,
            Bucket::Tomorrow => self.tomorrow,
            Bucket::Later => self.later,
        }
    }
}

impl Default for BucketLimits {
    fn default() -> Self {
        Self {
            today: 10,
            tomorrow: 7,
            later: 5,
        }
    }
}

/// Tier-dependent capacity table. `None` means unlimited for that tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaTable {
    pub free: Option<BucketLimits>,
    pub pro: Option<BucketLimits>,
}

impl Default for QuotaTable {
    fn default() -> Self {
        Self {
            free: Some(BucketLimits::default()),
            pro: None,
        }
    }
}

impl QuotaTable {
    /// Capacity of `bucket` under `tier`.
    pub fn capacity(&self, bucket: Bucket, tier: Tier) -> Capacity {
        let limits = match tier {
            Tier::Free => self.free,
            Tier::Pro => self.pro,
        };
        match limits {
            Some(limits) => Capacity::Limited(limits.get(bucket)),
            None => Capacity::Unlimited,
        }
    }
}

/// Advisory quota checks against one capacity table.
#[derive(Debug, Clone, Default)]
pub struct QuotaEnforcer {
    table: QuotaTable,
}

impl QuotaEnforcer {
    pub fn new(table: QuotaTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &QuotaTable {
        &self.table
    }

    pub fn capacity(&self, bucket: Bucket, tier: Tier) -> Capacity {
        self.table.capacity(bucket, tier)
    }

    /// Returns whether one more task of the given shape fits in `bucket`.
    ///
    /// `current` must be the bucket's present contents.
    pub fn can_add(&self, bucket: Bucket, current: &[Task], is_group: bool, tier: Tier) -> bool {
        self.fits(bucket, current, Occupancy::for_shape(is_group), tier)
    }

    /// Returns whether `cost` more occupancy fits in `bucket`.
    pub fn fits(&self, bucket: Bucket, current: &[Task], cost: Occupancy, tier: Tier) -> bool {
        match self.capacity(bucket, tier).as_halves() {
            None => true,
            Some(limit) => (Occupancy::of_tasks(current) + cost).halves() <= limit,
        }
    }

    /// Like [`QuotaEnforcer::fits`], but returns `QuotaExceeded` on rejection.
    pub fn ensure_fits(
        &self,
        bucket: Bucket,
        current: &[Task],
        cost: Occupancy,
        tier: Tier,
    ) -> Result<(), OrganizerError> {
        if self.fits(bucket, current, cost, tier) {
            return Ok(());
        }
        let limit = match self.capacity(bucket, tier) {
            Capacity::Limited(limit) => limit,
            Capacity::Unlimited => u32::MAX,
        };
        Err(OrganizerError::QuotaExceeded {
            bucket,
            limit,
            occupancy: Occupancy::of_tasks(current),
            requested: cost,
        })
    }
}
