mod engine;
mod error;
mod format;
mod growth;
mod healthcare;
mod social_security;
mod types;
mod withdrawal;

pub use engine::{current_age, run_forecast, run_forecast_with_source, years_to_retirement};
pub use error::{InputError, ensure_finite};
pub use format::format_currency;
pub use growth::{
    Rng, UniformSource, final_balance, project, project_deterministic, project_stochastic,
};
pub use healthcare::{
    DEFAULT_ANNUAL_HEALTHCARE_PER_PERSON, HealthcareEstimate, MetalTier, TierQuote,
    estimate_healthcare,
};
pub use social_security::{
    FULL_RETIREMENT_AGE, claim_age_multiplier, estimate_benefit, estimate_spousal_benefit,
};
pub use types::{
    AccumulationPoint, BalancePoint, BudgetCategory, BudgetSlice, CalculationMethod, ChartSeries,
    CoupleStatus, FORECAST_YEARS, ForecastResult, ForecastSummary, ForecastYear, GrowthPoint,
    Household, HouseholdInputs, MAX_AGE, MarketAssumptions, MarketProfile, NonWorkingSpouse,
    PersonInputs, SocialSecurityDetails,
};
pub use withdrawal::{SAFE_WITHDRAWAL_RATE, safe_withdrawal, sustainable_spending};
