use super::error::{InputError, ensure_finite};
use super::format::round_half_up;
use super::growth::{Rng, UniformSource, final_balance, project};
use super::social_security::{HouseholdBenefits, benefit_details, household_benefits};
use super::types::{
    AccumulationPoint, BalancePoint, BudgetCategory, BudgetSlice, ChartSeries, FORECAST_YEARS,
    ForecastResult, ForecastSummary, ForecastYear, GrowthPoint, Household, HouseholdInputs, MAX_AGE,
};
use super::withdrawal::{safe_withdrawal, sustainable_spending};

pub fn current_age(birth_year: i32, as_of_year: i32) -> i32 {
    as_of_year.saturating_sub(birth_year)
}

pub fn years_to_retirement(current_age: i32, retirement_age: u32) -> u32 {
    (retirement_age as i64 - current_age as i64).clamp(0, u32::MAX as i64) as u32
}

/// Inputs the post-retirement ledger runs on; constant across all 30 years.
#[derive(Debug, Clone, Copy)]
struct LedgerParams {
    retirement_age: u32,
    mean_return: f64,
    real_estate_cashflow: f64,
    benefits: HouseholdBenefits,
    primary_claim_age: u32,
    spouse_claim_age: Option<u32>,
    annual_spending: f64,
}

impl LedgerParams {
    fn social_security_at(&self, age: u32) -> f64 {
        let mut total = 0.0;
        if age >= self.primary_claim_age {
            total += self.benefits.primary;
        }
        if self.spouse_claim_age.is_some_and(|claim_age| age >= claim_age) {
            total += self.benefits.spouse;
        }
        total
    }
}

/// Runs one forecast, drawing stochastic returns from a generator seeded by
/// `inputs.seed` or from entropy.
pub fn run_forecast(inputs: &HouseholdInputs) -> Result<ForecastResult, InputError> {
    let mut rng = match inputs.seed {
        Some(seed) => Rng::new(seed),
        None => Rng::from_entropy(),
    };
    run_forecast_with_source(inputs, &mut rng)
}

pub fn run_forecast_with_source(
    inputs: &HouseholdInputs,
    source: &mut dyn UniformSource,
) -> Result<ForecastResult, InputError> {
    validate_finite(inputs)?;

    let primary = &inputs.primary;
    let age_now = current_age(primary.birth_year, inputs.as_of_year);
    let growth_years = years_to_retirement(age_now, primary.retirement_age);
    validate_horizon(primary.retirement_age, growth_years)?;
    log::debug!(
        "forecast start: method={:?} profile={:?} years_to_retirement={growth_years}",
        inputs.calculation_method,
        inputs.market_profile
    );

    let growth = project(
        inputs.calculation_method,
        inputs.liquid_assets,
        inputs.annual_contribution,
        growth_years,
        inputs.market_profile,
        source,
    );
    let portfolio_at_retirement = final_balance(&growth, inputs.liquid_assets);

    let benefits = household_benefits(primary, &inputs.household);
    let annual_budget = inputs.annual_budget();
    let safe_annual_withdrawal = safe_withdrawal(portfolio_at_retirement);
    let total_annual_income =
        safe_annual_withdrawal + inputs.real_estate_cashflow + benefits.total();

    let params = LedgerParams {
        retirement_age: primary.retirement_age,
        mean_return: inputs.market_profile.assumptions().mean_return,
        real_estate_cashflow: inputs.real_estate_cashflow,
        benefits,
        primary_claim_age: primary.claim_age,
        spouse_claim_age: inputs.household.spouse_claim_age(),
        annual_spending: annual_budget,
    };
    let forecast = build_ledger(portfolio_at_retirement, &params);

    let summary = ForecastSummary {
        portfolio_at_retirement: round_half_up(portfolio_at_retirement),
        safe_annual_withdrawal: round_half_up(safe_annual_withdrawal),
        total_annual_income: round_half_up(total_annual_income),
        annual_budget: round_half_up(annual_budget),
        surplus_deficit: round_half_up(total_annual_income - annual_budget),
        safe_sustainable_spending: round_half_up(sustainable_spending(
            portfolio_at_retirement,
            inputs.real_estate_cashflow,
            benefits.total(),
            annual_budget,
        )),
    };

    let charts = ChartSeries {
        portfolio_balance: balance_series(&forecast),
        accumulation: accumulation_series(&growth, age_now, inputs.as_of_year),
        budget_breakdown: budget_breakdown(&inputs.budget),
    };

    log::debug!(
        "forecast done: portfolio_at_retirement={} final_balance={}",
        summary.portfolio_at_retirement,
        forecast.last().map_or(0.0, |y| y.ending_balance)
    );

    Ok(ForecastResult {
        current_age: age_now,
        years_to_retirement: growth_years,
        forecast,
        summary,
        social_security: benefit_details(primary, &inputs.household),
        charts,
    })
}

fn validate_finite(inputs: &HouseholdInputs) -> Result<(), InputError> {
    ensure_finite("annualIncome", inputs.primary.annual_income)?;
    if let Household::BothWorking { spouse, .. } = &inputs.household {
        ensure_finite("spouse.annualIncome", spouse.annual_income)?;
    }
    ensure_finite("liquidAssets", inputs.liquid_assets)?;
    ensure_finite("annualContribution", inputs.annual_contribution)?;
    ensure_finite("realEstateCashflow", inputs.real_estate_cashflow)?;
    for category in &inputs.budget {
        ensure_finite(&format!("budget.{}", category.name), category.amount)?;
    }
    Ok(())
}

/// Growth runs one step per year and the ledger counts ages up from
/// retirement, so both are capped at a human lifetime.
fn validate_horizon(retirement_age: u32, growth_years: u32) -> Result<(), InputError> {
    if retirement_age > MAX_AGE {
        return Err(InputError::out_of_range(
            "retirementAge",
            format!("must be at most {MAX_AGE}"),
        ));
    }
    if growth_years > MAX_AGE {
        return Err(InputError::out_of_range(
            "birthYear",
            format!("leaves more than {MAX_AGE} years to retirement"),
        ));
    }
    Ok(())
}

/// Fixed 30-year ledger. Balances are carried unrounded; each stored row is
/// rounded field by field. Depletion shows up as negative balances.
fn build_ledger(starting_balance: f64, params: &LedgerParams) -> Vec<ForecastYear> {
    let mut rows = Vec::with_capacity(FORECAST_YEARS as usize);
    let mut balance = starting_balance;

    for year in 0..FORECAST_YEARS {
        let age = params.retirement_age + year;
        let investment_gains = balance * params.mean_return;
        let social_security = params.social_security_at(age);
        let ending_balance = balance + investment_gains + params.real_estate_cashflow
            + social_security
            - params.annual_spending;

        rows.push(ForecastYear {
            age,
            starting_balance: round_half_up(balance),
            investment_gains: round_half_up(investment_gains),
            real_estate_cashflow: round_half_up(params.real_estate_cashflow),
            social_security: round_half_up(social_security),
            spending: round_half_up(params.annual_spending),
            ending_balance: round_half_up(ending_balance),
        });
        balance = ending_balance;
    }

    rows
}

fn balance_series(forecast: &[ForecastYear]) -> Vec<BalancePoint> {
    forecast
        .iter()
        .map(|row| BalancePoint {
            year: row.age,
            balance: row.ending_balance,
        })
        .collect()
}

fn accumulation_series(growth: &[GrowthPoint], age_now: i32, as_of_year: i32) -> Vec<AccumulationPoint> {
    growth
        .iter()
        .map(|point| AccumulationPoint {
            age: age_now.saturating_add(point.year_index as i32),
            calendar_year: as_of_year.saturating_add(point.year_index as i32),
            balance: round_half_up(point.balance),
        })
        .collect()
}

fn budget_breakdown(budget: &[BudgetCategory]) -> Vec<BudgetSlice> {
    let total: f64 = budget.iter().map(|c| c.amount).sum();
    budget
        .iter()
        .filter(|c| c.amount > 0.0)
        .map(|c| BudgetSlice {
            category: c.name.clone(),
            amount: c.amount,
            share: if total > 0.0 { c.amount / total } else { 0.0 },
        })
        .collect()
}
