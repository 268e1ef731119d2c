//! Loyalty tiers.
//!
//! A tier is a rank unlocked by reaching a point balance. Every account
//! starts at `Seed`; the tier is recomputed from the balance whenever the
//! balance is written.

use serde::{Deserialize, Serialize};

/// Loyalty program rank, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum LoyaltyTier {
    #[default]
    Seed,
    Sprout,
    Sapling,
    Grove,
    Forest,
}

impl LoyaltyTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Seed,
        Self::Sprout,
        Self::Sapling,
        Self::Grove,
        Self::Forest,
    ];

    /// Minimum point balance for this tier.
    #[must_use]
    pub const fn threshold(self) -> i64 {
        match self {
            Self::Seed => 0,
            Self::Sprout => 250,
            Self::Sapling => 750,
            Self::Grove => 1500,
            Self::Forest => 3000,
        }
    }

    /// Display name, also the value stored in the `tier` column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Seed => "Seed",
            Self::Sprout => "Sprout",
            Self::Sapling => "Sapling",
            Self::Grove => "Grove",
            Self::Forest => "Forest",
        }
    }

    /// Short perk description shown on the loyalty page.
    #[must_use]
    pub const fn perk(self) -> &'static str {
        match self {
            Self::Seed => "Earn 1 point per dollar",
            Self::Sprout => "Free plant-milk upgrades",
            Self::Sapling => "Birthday drink on us",
            Self::Grove => "10% off shop products",
            Self::Forest => "Members-only tasting events",
        }
    }

    /// Highest tier whose threshold `points` reaches. Negative balances are `Seed`.
    #[must_use]
    pub fn for_points(points: i64) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|tier| points >= tier.threshold())
            .unwrap_or(Self::Seed)
    }

    /// The next tier up, or `None` at the top.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Seed => Some(Self::Sprout),
            Self::Sprout => Some(Self::Sapling),
            Self::Sapling => Some(Self::Grove),
            Self::Grove => Some(Self::Forest),
            Self::Forest => None,
        }
    }

    /// Points still needed to reach the next tier from `points`.
    #[must_use]
    pub fn points_to_next(points: i64) -> Option<i64> {
        Self::for_points(points)
            .next()
            .map(|next| (next.threshold() - points).max(0))
    }

    /// Progress through the current tier band as a whole percentage (0-100).
    #[must_use]
    pub fn progress_percent(points: i64) -> u8 {
        let current = Self::for_points(points);
        let Some(next) = current.next() else {
            return 100;
        };
        let band = next.threshold() - current.threshold();
        let into = (points - current.threshold()).clamp(0, band);
        u8::try_from(into * 100 / band).unwrap_or(100)
    }
}

impl std::fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for LoyaltyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown loyalty tier: {s}"))
    }
}
