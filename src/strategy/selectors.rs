use crate::domain::HoldingEntry;

use super::FundSelector;

/// Canonical selector: picks the holding with the highest weight, breaking
/// ties by lower rank (rank 1 beats rank 5).
#[derive(Default)]
pub struct HighestWeightSelector;

impl FundSelector for HighestWeightSelector {
    fn select(&self, candidates: &[HoldingEntry]) -> Option<HoldingEntry> {
        candidates
            .iter()
            .max_by(|a, b| {
                a.weight
                    .partial_cmp(&b.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.rank.cmp(&a.rank))
            })
            .cloned()
    }

    fn name(&self) -> &str {
        "highest_weight"
    }
}

/// Named extension point. The original specifies this selector by name
/// only, with no defined ranking logic; registered so `ChainConfig` can
/// reference it, but it never returns a candidate.
#[derive(Default)]
pub struct BestLiquiditySelector;

impl FundSelector for BestLiquiditySelector {
    fn select(&self, _candidates: &[HoldingEntry]) -> Option<HoldingEntry> {
        None
    }

    fn name(&self) -> &str {
        "best_liquidity"
    }
}

/// Named extension point, same status as `BestLiquiditySelector`.
#[derive(Default)]
pub struct LowestPremiumSelector;

impl FundSelector for LowestPremiumSelector {
    fn select(&self, _candidates: &[HoldingEntry]) -> Option<HoldingEntry> {
        None
    }

    fn name(&self) -> &str {
        "lowest_premium"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EtfCategory;

    fn entry(etf_code: &str, weight: f64, rank: i32) -> HoldingEntry {
        HoldingEntry::new(etf_code, "name", weight, EtfCategory::BroadIndex, rank, true, 0.3).unwrap()
    }

    #[test]
    fn picks_highest_weight() {
        let selector = HighestWeightSelector;
        let candidates = vec![entry("a", 0.1, 3), entry("b", 0.3, 1), entry("c", 0.2, 2)];
        let picked = selector.select(&candidates).unwrap();
        assert_eq!(picked.etf_code, "b");
    }

    #[test]
    fn ties_broken_by_lower_rank() {
        let selector = HighestWeightSelector;
        let candidates = vec![entry("a", 0.2, 5), entry("b", 0.2, 1)];
        let picked = selector.select(&candidates).unwrap();
        assert_eq!(picked.etf_code, "b");
    }

    #[test]
    fn empty_candidates_yield_none() {
        let selector = HighestWeightSelector;
        assert!(selector.select(&[]).is_none());
    }

    #[test]
    fn named_stub_selectors_always_return_none() {
        let candidates = vec![entry("a", 0.5, 1)];
        assert!(BestLiquiditySelector.select(&candidates).is_none());
        assert!(LowestPremiumSelector.select(&candidates).is_none());
    }
}
