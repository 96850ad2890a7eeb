use serde::Serialize;

/// Number of post-retirement years in every forecast.
pub const FORECAST_YEARS: u32 = 30;

/// Upper bound on any age or year count the engine will step through.
pub const MAX_AGE: u32 = 120;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MarketProfile {
    Conservative,
    Moderate,
    Aggressive,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarketAssumptions {
    pub mean_return: f64,
    pub volatility: f64,
}

impl MarketProfile {
    pub fn assumptions(self) -> MarketAssumptions {
        match self {
            MarketProfile::Conservative => MarketAssumptions {
                mean_return: 0.05,
                volatility: 0.12,
            },
            MarketProfile::Moderate => MarketAssumptions {
                mean_return: 0.07,
                volatility: 0.15,
            },
            MarketProfile::Aggressive => MarketAssumptions {
                mean_return: 0.09,
                volatility: 0.18,
            },
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CalculationMethod {
    Deterministic,
    Stochastic,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CoupleStatus {
    Married,
    Partnered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonInputs {
    pub birth_year: i32,
    pub annual_income: f64,
    pub years_worked: u32,
    pub retirement_age: u32,
    pub claim_age: u32,
}

/// Spouse without an earnings record of their own; draws a spousal benefit.
#[derive(Debug, Clone, PartialEq)]
pub struct NonWorkingSpouse {
    pub birth_year: i32,
    pub retirement_age: u32,
    pub claim_age: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Household {
    Single,
    BothWorking {
        status: CoupleStatus,
        spouse: PersonInputs,
    },
    OneWorking {
        status: CoupleStatus,
        spouse: NonWorkingSpouse,
    },
}

impl Household {
    pub fn spouse_claim_age(&self) -> Option<u32> {
        match self {
            Household::Single => None,
            Household::BothWorking { spouse, .. } => Some(spouse.claim_age),
            Household::OneWorking { spouse, .. } => Some(spouse.claim_age),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetCategory {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdInputs {
    pub primary: PersonInputs,
    pub household: Household,
    pub liquid_assets: f64,
    pub annual_contribution: f64,
    pub real_estate_cashflow: f64,
    pub market_profile: MarketProfile,
    pub calculation_method: CalculationMethod,
    pub budget: Vec<BudgetCategory>,
    /// Calendar year the primary's current age is measured in.
    pub as_of_year: i32,
    /// Makes the stochastic method reproducible when set.
    pub seed: Option<u64>,
}

impl HouseholdInputs {
    pub fn annual_budget(&self) -> f64 {
        self.budget.iter().map(|c| c.amount).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPoint {
    pub year_index: u32,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastYear {
    pub age: u32,
    pub starting_balance: f64,
    pub investment_gains: f64,
    pub real_estate_cashflow: f64,
    pub social_security: f64,
    pub spending: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSummary {
    pub portfolio_at_retirement: f64,
    pub safe_annual_withdrawal: f64,
    pub total_annual_income: f64,
    pub annual_budget: f64,
    pub surplus_deficit: f64,
    pub safe_sustainable_spending: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSecurityDetails {
    pub primary_at_fra: f64,
    pub primary_claimed: f64,
    pub spouse_at_fra: f64,
    pub spouse_claimed: f64,
    pub total_at_fra: f64,
    pub total_claimed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalancePoint {
    pub year: u32,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationPoint {
    pub age: i32,
    pub calendar_year: i32,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSlice {
    pub category: String,
    pub amount: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub portfolio_balance: Vec<BalancePoint>,
    pub accumulation: Vec<AccumulationPoint>,
    pub budget_breakdown: Vec<BudgetSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub current_age: i32,
    pub years_to_retirement: u32,
    pub forecast: Vec<ForecastYear>,
    pub summary: ForecastSummary,
    pub social_security: SocialSecurityDetails,
    pub charts: ChartSeries,
}
