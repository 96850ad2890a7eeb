use serde::Serialize;

use super::format::round_half_up;

/// Budgeted per covered adult when no location is known.
pub const DEFAULT_ANNUAL_HEALTHCARE_PER_PERSON: f64 = 12_000.0;

/// Single-person federal poverty level; subsidies phase out at 400% of it.
const POVERTY_LEVEL_SINGLE: f64 = 14_580.0;
const SUBSIDY_INCOME_MULTIPLE: f64 = 4.0;
const MAX_SUBSIDY_SHARE: f64 = 0.8;
const TOBACCO_SURCHARGE: f64 = 1.5;
const REFERENCE_AGE: f64 = 50.0;
const MAX_OUT_OF_POCKET: f64 = 9_100.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum MetalTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl MetalTier {
    pub const ALL: [MetalTier; 4] = [
        MetalTier::Bronze,
        MetalTier::Silver,
        MetalTier::Gold,
        MetalTier::Platinum,
    ];

    /// Monthly premium at the reference age and the per-year slope around it.
    fn base_premium(self) -> (f64, f64) {
        match self {
            MetalTier::Bronze => (350.0, 15.0),
            MetalTier::Silver => (450.0, 20.0),
            MetalTier::Gold => (550.0, 25.0),
            MetalTier::Platinum => (700.0, 30.0),
        }
    }

    fn deductible(self) -> f64 {
        match self {
            MetalTier::Bronze => 7_000.0,
            MetalTier::Silver => 5_000.0,
            MetalTier::Gold => 2_000.0,
            MetalTier::Platinum => 0.0,
        }
    }
}

fn state_multiplier(state: &str) -> f64 {
    match state.trim().to_ascii_uppercase().as_str() {
        "CA" => 1.10,
        "NY" => 1.15,
        "TX" => 0.90,
        "FL" => 0.95,
        "IL" => 1.05,
        "OH" => 0.90,
        "GA" => 0.85,
        "NC" => 0.90,
        "MI" => 0.95,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierQuote {
    pub tier: MetalTier,
    pub monthly_premium: f64,
    pub annual_premium: f64,
    pub deductible: f64,
    pub max_out_of_pocket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcareEstimate {
    pub quotes: Vec<TierQuote>,
    pub subsidy_eligible: bool,
    /// Percent, one decimal place.
    pub subsidy_percentage: f64,
    pub recommended_tier: MetalTier,
    /// Recommended tier's annual premium plus its deductible.
    pub estimated_annual_cost: f64,
}

impl HealthcareEstimate {
    pub fn quote(&self, tier: MetalTier) -> Option<&TierQuote> {
        self.quotes.iter().find(|q| q.tier == tier)
    }
}

/// Offline marketplace premium estimate for one adult.
///
/// Premiums scale linearly with age around 50. Incomes up to 400% of the
/// poverty level get a subsidy on Silver of up to 80%, shrinking linearly to
/// nothing at the threshold; those households are steered to Silver, everyone
/// else to Bronze. Tobacco use and a handful of state factors scale every tier.
pub fn estimate_healthcare(age: u32, income: f64, state: &str, tobacco_use: bool) -> HealthcareEstimate {
    let threshold = POVERTY_LEVEL_SINGLE * SUBSIDY_INCOME_MULTIPLE;
    let subsidy_eligible = income <= threshold;
    let subsidy_share = if subsidy_eligible {
        ((threshold - income) / threshold).max(0.0)
    } else {
        0.0
    };
    let location = state_multiplier(state);

    let quotes: Vec<TierQuote> = MetalTier::ALL
        .iter()
        .map(|&tier| {
            let (base, slope) = tier.base_premium();
            let mut monthly = (base + (age as f64 - REFERENCE_AGE) * slope).max(0.0);
            if tier == MetalTier::Silver {
                monthly *= 1.0 - subsidy_share * MAX_SUBSIDY_SHARE;
            }
            if tobacco_use {
                monthly *= TOBACCO_SURCHARGE;
            }
            monthly *= location;
            TierQuote {
                tier,
                monthly_premium: monthly,
                annual_premium: monthly * 12.0,
                deductible: tier.deductible(),
                max_out_of_pocket: MAX_OUT_OF_POCKET,
            }
        })
        .collect();

    let recommended_tier = if subsidy_eligible {
        MetalTier::Silver
    } else {
        MetalTier::Bronze
    };
    let estimated_annual_cost = quotes
        .iter()
        .find(|q| q.tier == recommended_tier)
        .map_or(0.0, |q| q.annual_premium + q.deductible);

    HealthcareEstimate {
        quotes,
        subsidy_eligible,
        subsidy_percentage: round_half_up(subsidy_share * 1_000.0) / 10.0,
        recommended_tier,
        estimated_annual_cost,
    }
}
