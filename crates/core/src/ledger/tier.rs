//! Token-balance tiers.
//!
//! Pure logic over four ascending thresholds. Balances below the first
//! threshold sit in [`Tier::Base`]; the top tier has no upper bound.

use serde::Serialize;

/// A token-balance bracket used for progression display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    #[serde(rename = "BASE")]
    Base,
    #[serde(rename = "TIER_1")]
    Tier1,
    #[serde(rename = "TIER_2")]
    Tier2,
    #[serde(rename = "TIER_3")]
    Tier3,
    #[serde(rename = "TIER_4")]
    Tier4,
}

/// Minimum balance of each ranked tier, ascending.
pub const TIER_THRESHOLDS: [(Tier, u64); 4] = [
    (Tier::Tier1, 1_000),
    (Tier::Tier2, 5_000),
    (Tier::Tier3, 10_000),
    (Tier::Tier4, 25_000),
];

impl Tier {
    /// Classify a balance.
    pub fn for_balance(balance: u64) -> Self {
        TIER_THRESHOLDS
            .iter()
            .rev()
            .find(|(_, min)| balance >= *min)
            .map(|(tier, _)| *tier)
            .unwrap_or(Tier::Base)
    }

    /// Smallest balance that belongs to this tier.
    pub fn min_balance(self) -> u64 {
        TIER_THRESHOLDS
            .iter()
            .find(|(tier, _)| *tier == self)
            .map(|(_, min)| *min)
            .unwrap_or(0)
    }

    /// The tier above this one, or `None` at the top.
    pub fn next(self) -> Option<Self> {
        match self {
            Tier::Base => Some(Tier::Tier1),
            Tier::Tier1 => Some(Tier::Tier2),
            Tier::Tier2 => Some(Tier::Tier3),
            Tier::Tier3 => Some(Tier::Tier4),
            Tier::Tier4 => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Base => "BASE",
            Tier::Tier1 => "TIER_1",
            Tier::Tier2 => "TIER_2",
            Tier::Tier3 => "TIER_3",
            Tier::Tier4 => "TIER_4",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance from a balance to the next tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierProgress {
    pub current: Tier,
    pub next: Tier,
    /// Tokens still needed to reach `next`.
    pub needed: u64,
    /// Share of the current tier's span already covered, `0..=99`.
    pub percentage: u8,
}

/// Progress toward the next tier, or `None` in the top tier.
pub fn progress_to_next_tier(balance: u64) -> Option<TierProgress> {
    let current = Tier::for_balance(balance);
    let next = current.next()?;

    let floor = current.min_balance();
    let ceiling = next.min_balance();
    let span = ceiling - floor;
    let covered = balance - floor;

    Some(TierProgress {
        current,
        next,
        needed: ceiling - balance,
        percentage: ((covered * 100) / span) as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(Tier::for_balance(0), Tier::Base);
        assert_eq!(Tier::for_balance(999), Tier::Base);
        assert_eq!(Tier::for_balance(1_000), Tier::Tier1);
        assert_eq!(Tier::for_balance(4_999), Tier::Tier1);
        assert_eq!(Tier::for_balance(5_000), Tier::Tier2);
        assert_eq!(Tier::for_balance(10_000), Tier::Tier3);
        assert_eq!(Tier::for_balance(25_000), Tier::Tier4);
    }

    #[test]
    fn top_tier_is_unbounded() {
        assert_eq!(Tier::for_balance(u64::MAX), Tier::Tier4);
        assert_eq!(progress_to_next_tier(1_000_000), None);
        assert_eq!(progress_to_next_tier(25_000), None);
    }

    #[test]
    fn progress_at_tier_floor() {
        let p = progress_to_next_tier(5_000).unwrap();
        assert_eq!(p.current, Tier::Tier2);
        assert_eq!(p.next, Tier::Tier3);
        assert_eq!(p.percentage, 0);
        assert_eq!(p.needed, 5_000);
    }

    #[test]
    fn progress_midway() {
        let p = progress_to_next_tier(500).unwrap();
        assert_eq!(p.next, Tier::Tier1);
        assert_eq!(p.percentage, 50);
        assert_eq!(p.needed, 500);

        let p = progress_to_next_tier(24_999).unwrap();
        assert_eq!(p.next, Tier::Tier4);
        assert_eq!(p.needed, 1);
        assert_eq!(p.percentage, 99);
    }

    #[test]
    fn tier_serializes_with_screaming_names() {
        assert_eq!(serde_json::to_string(&Tier::Tier2).unwrap(), "\"TIER_2\"");
        assert_eq!(Tier::Tier2.to_string(), "TIER_2");
    }
}
