/// A named bundle of filter thresholds and an evaluator choice, so a
/// deployment can pick "conservative"/"balanced"/"aggressive" without
/// hand-assembling a `ChainConfig`.
#[derive(Debug, Clone)]
pub struct StrategyTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub min_weight: f64,
    pub min_etf_volume: f64,
    pub min_order_amount: f64,
    pub evaluator: &'static str,
}

pub const CONSERVATIVE: StrategyTemplate = StrategyTemplate {
    id: "conservative",
    name: "Conservative",
    description: "Stricter filtering, fewer but higher-quality signals",
    min_weight: 0.08,
    min_etf_volume: 80_000_000.0,
    min_order_amount: 1_500_000_000.0,
    evaluator: "conservative",
};

pub const BALANCED: StrategyTemplate = StrategyTemplate {
    id: "balanced",
    name: "Balanced",
    description: "Recommended setting, balances signal count and quality",
    min_weight: 0.05,
    min_etf_volume: 50_000_000.0,
    min_order_amount: 1_000_000_000.0,
    evaluator: "default",
};

pub const AGGRESSIVE: StrategyTemplate = StrategyTemplate {
    id: "aggressive",
    name: "Aggressive",
    description: "More signals, may include lower-quality opportunities",
    min_weight: 0.03,
    min_etf_volume: 30_000_000.0,
    min_order_amount: 500_000_000.0,
    evaluator: "aggressive",
};

pub fn get_template(id: &str) -> Option<StrategyTemplate> {
    match id {
        "conservative" => Some(CONSERVATIVE),
        "balanced" => Some(BALANCED),
        "aggressive" => Some(AGGRESSIVE),
        _ => None,
    }
}

pub fn all_templates() -> Vec<StrategyTemplate> {
    vec![CONSERVATIVE, BALANCED, AGGRESSIVE]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_template_resolves_known_ids() {
        assert_eq!(get_template("balanced").unwrap().evaluator, "default");
        assert!(get_template("unknown").is_none());
    }

    #[test]
    fn all_templates_returns_three_presets() {
        assert_eq!(all_templates().len(), 3);
    }
}
