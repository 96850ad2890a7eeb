use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Datelike;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;

use crate::core::{
    BudgetCategory, CalculationMethod, CoupleStatus, DEFAULT_ANNUAL_HEALTHCARE_PER_PERSON,
    ForecastResult, HealthcareEstimate, Household, HouseholdInputs, InputError, MAX_AGE,
    MarketProfile, NonWorkingSpouse, PersonInputs, ensure_finite, estimate_healthcare,
    format_currency, run_forecast,
};

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2200;
const MIN_CLAIM_AGE: u32 = 62;
const MAX_CLAIM_AGE: u32 = 70;
const MAX_YEARS_WORKED: u32 = 50;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMaritalStatus {
    Single,
    Married,
    Partnered,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliSpouseWorking {
    Both,
    One,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMarketProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl From<CliMarketProfile> for MarketProfile {
    fn from(value: CliMarketProfile) -> Self {
        match value {
            CliMarketProfile::Conservative => MarketProfile::Conservative,
            CliMarketProfile::Moderate => MarketProfile::Moderate,
            CliMarketProfile::Aggressive => MarketProfile::Aggressive,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCalculationMethod {
    Deterministic,
    #[value(alias = "monteCarlo", alias = "monte-carlo")]
    Stochastic,
}

impl From<CliCalculationMethod> for CalculationMethod {
    fn from(value: CliCalculationMethod) -> Self {
        match value {
            CliCalculationMethod::Deterministic => CalculationMethod::Deterministic,
            CliCalculationMethod::Stochastic => CalculationMethod::Stochastic,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "retire forecast",
    about = "Project a household's portfolio to retirement and forecast 30 years of drawdown"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = CliMaritalStatus::Single)]
    marital_status: CliMaritalStatus,
    #[arg(long)]
    birth_year: i32,
    #[arg(long)]
    retirement_age: u32,
    #[arg(long, help = "Investable assets today")]
    liquid_assets: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_hyphen_values = true,
        help = "Net annual rental income in retirement; may be negative"
    )]
    real_estate_cashflow: f64,
    #[arg(long)]
    annual_income: f64,
    #[arg(long, help = "Years with Social Security covered earnings (0-50)")]
    years_worked: u32,
    #[arg(long, default_value_t = 0.0, help = "Savings added at the end of each working year")]
    annual_contribution: f64,
    #[arg(long, value_enum, default_value_t = CliMarketProfile::Moderate)]
    market_profile: CliMarketProfile,
    #[arg(long, value_enum, default_value_t = CliCalculationMethod::Deterministic)]
    calculation_method: CliCalculationMethod,
    #[arg(long, default_value_t = 67, help = "Age benefits are claimed (62-70)")]
    social_security_claim_age: u32,

    #[arg(long)]
    spouse_birth_year: Option<i32>,
    #[arg(long)]
    spouse_retirement_age: Option<u32>,
    #[arg(long, value_enum, default_value_t = CliSpouseWorking::Both)]
    spouse_working: CliSpouseWorking,
    #[arg(long)]
    spouse_annual_income: Option<f64>,
    #[arg(long)]
    spouse_years_worked: Option<u32>,
    #[arg(long, default_value_t = 67)]
    spouse_claim_age: u32,

    #[arg(long, default_value_t = 0.0)]
    housing: f64,
    #[arg(long, help = "Annual healthcare spend; estimated when omitted")]
    healthcare: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    food_living: f64,
    #[arg(long, default_value_t = 0.0)]
    travel_leisure: f64,
    #[arg(long, default_value_t = 0.0)]
    other_discretionary: f64,

    #[arg(long, help = "Two-letter state code used for the healthcare estimate")]
    state: Option<String>,
    #[arg(long)]
    zip_code: Option<String>,
    #[arg(long)]
    tobacco_use: bool,

    #[arg(long, help = "Calendar year ages are measured in; defaults to this year")]
    as_of_year: Option<i32>,
    #[arg(long, help = "Seed for reproducible stochastic runs")]
    seed: Option<u64>,
}

/// A form field as submitted: either a JSON number or the raw input string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FormValue {
    Number(f64),
    Text(String),
}

/// Checkbox state: a JSON bool or the form's `"true"`/`"false"` string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FormFlag {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SpousePayload {
    birth_year: Option<FormValue>,
    retirement_age: Option<FormValue>,
    both_working: Option<String>,
    annual_income: Option<FormValue>,
    years_worked: Option<FormValue>,
    social_security_claim_age: Option<FormValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BudgetPayload {
    housing: Option<FormValue>,
    healthcare: Option<FormValue>,
    food_living: Option<FormValue>,
    travel_leisure: Option<FormValue>,
    other_discretionary: Option<FormValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ForecastPayload {
    marital_status: Option<String>,
    birth_year: Option<FormValue>,
    retirement_age: Option<FormValue>,
    liquid_assets: Option<FormValue>,
    real_estate_cashflow: Option<FormValue>,
    annual_income: Option<FormValue>,
    years_worked: Option<FormValue>,
    annual_contribution: Option<FormValue>,
    market_profile: Option<String>,
    calculation_method: Option<String>,
    social_security_claim_age: Option<FormValue>,
    spouse: SpousePayload,
    budget: BudgetPayload,
    state: Option<String>,
    zip_code: Option<String>,
    tobacco_use: Option<FormFlag>,
    as_of_year: Option<FormValue>,
    seed: Option<FormValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HealthcarePayload {
    age: Option<FormValue>,
    income: Option<FormValue>,
    state: Option<String>,
    zip_code: Option<String>,
    tobacco_use: Option<FormFlag>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplaySummary {
    portfolio_at_retirement: String,
    safe_annual_withdrawal: String,
    total_annual_income: String,
    annual_budget: String,
    surplus_deficit: String,
    safe_sustainable_spending: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastResponse {
    #[serde(flatten)]
    result: ForecastResult,
    display: DisplaySummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthcareResponse {
    #[serde(flatten)]
    estimate: HealthcareEstimate,
    display_annual_cost: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

fn required<'a>(value: &'a Option<FormValue>, field: &str) -> Result<&'a FormValue, InputError> {
    match value {
        None => Err(InputError::Missing {
            field: field.to_string(),
        }),
        Some(FormValue::Text(s)) if s.trim().is_empty() => Err(InputError::Missing {
            field: field.to_string(),
        }),
        Some(v) => Ok(v),
    }
}

fn required_text<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, InputError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(InputError::Missing {
            field: field.to_string(),
        }),
    }
}

fn provided_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Present and non-blank, or `None`.
fn provided(value: &Option<FormValue>) -> Option<&FormValue> {
    match value {
        Some(FormValue::Text(s)) if s.trim().is_empty() => None,
        other => other.as_ref(),
    }
}

fn parse_number(field: &str, value: &FormValue) -> Result<f64, InputError> {
    let number = match value {
        FormValue::Number(n) => *n,
        FormValue::Text(s) => s.trim().parse::<f64>().map_err(|_| InputError::NotANumber {
            field: field.to_string(),
            value: s.clone(),
        })?,
    };
    ensure_finite(field, number)
}

fn parse_whole<T: TryFrom<i64>>(field: &str, value: &FormValue) -> Result<T, InputError> {
    let not_whole = || InputError::NotANumber {
        field: field.to_string(),
        value: match value {
            FormValue::Number(n) => n.to_string(),
            FormValue::Text(s) => s.clone(),
        },
    };
    let whole = match value {
        FormValue::Number(n) if n.is_finite() && n.fract() == 0.0 => *n as i64,
        FormValue::Number(_) => return Err(not_whole()),
        FormValue::Text(s) => s.trim().parse::<i64>().map_err(|_| not_whole())?,
    };
    T::try_from(whole).map_err(|_| InputError::out_of_range(field, "is out of range"))
}

fn parse_flag(field: &str, value: &FormFlag) -> Result<bool, InputError> {
    match value {
        FormFlag::Bool(b) => Ok(*b),
        FormFlag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" | "" => Ok(false),
            _ => Err(InputError::UnknownOption {
                field: field.to_string(),
                value: s.clone(),
            }),
        },
    }
}

fn parse_choice<E: ValueEnum>(field: &str, value: &str) -> Result<E, InputError> {
    E::from_str(value.trim(), true).map_err(|_| InputError::UnknownOption {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        marital_status: CliMaritalStatus::Single,
        birth_year: 0,
        retirement_age: 0,
        liquid_assets: 0.0,
        real_estate_cashflow: 0.0,
        annual_income: 0.0,
        years_worked: 0,
        annual_contribution: 0.0,
        market_profile: CliMarketProfile::Moderate,
        calculation_method: CliCalculationMethod::Deterministic,
        social_security_claim_age: 67,
        spouse_birth_year: None,
        spouse_retirement_age: None,
        spouse_working: CliSpouseWorking::Both,
        spouse_annual_income: None,
        spouse_years_worked: None,
        spouse_claim_age: 67,
        housing: 0.0,
        healthcare: None,
        food_living: 0.0,
        travel_leisure: 0.0,
        other_discretionary: 0.0,
        state: None,
        zip_code: None,
        tobacco_use: false,
        as_of_year: None,
        seed: None,
    }
}

fn cli_from_payload(payload: ForecastPayload) -> Result<Cli, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = &payload.marital_status {
        cli.marital_status = parse_choice("maritalStatus", v)?;
    }
    cli.birth_year = parse_whole("birthYear", required(&payload.birth_year, "birthYear")?)?;
    cli.retirement_age = parse_whole(
        "retirementAge",
        required(&payload.retirement_age, "retirementAge")?,
    )?;
    cli.liquid_assets = parse_number(
        "liquidAssets",
        required(&payload.liquid_assets, "liquidAssets")?,
    )?;
    cli.annual_income = parse_number(
        "annualIncome",
        required(&payload.annual_income, "annualIncome")?,
    )?;
    cli.years_worked = parse_whole("yearsWorked", required(&payload.years_worked, "yearsWorked")?)?;

    if let Some(v) = provided(&payload.real_estate_cashflow) {
        cli.real_estate_cashflow = parse_number("realEstateCashflow", v)?;
    }
    if let Some(v) = provided(&payload.annual_contribution) {
        cli.annual_contribution = parse_number("annualContribution", v)?;
    }
    if let Some(v) = &payload.market_profile {
        cli.market_profile = parse_choice("marketProfile", v)?;
    }
    if let Some(v) = &payload.calculation_method {
        cli.calculation_method = parse_choice("calculationMethod", v)?;
    }
    if let Some(v) = provided(&payload.social_security_claim_age) {
        cli.social_security_claim_age = parse_whole("socialSecurityClaimAge", v)?;
    }

    let spouse = &payload.spouse;
    if let Some(v) = provided(&spouse.birth_year) {
        cli.spouse_birth_year = Some(parse_whole("spouse.birthYear", v)?);
    }
    if let Some(v) = provided(&spouse.retirement_age) {
        cli.spouse_retirement_age = Some(parse_whole("spouse.retirementAge", v)?);
    }
    if let Some(v) = &spouse.both_working {
        cli.spouse_working = parse_choice("spouse.bothWorking", v)?;
    }
    if let Some(v) = provided(&spouse.annual_income) {
        cli.spouse_annual_income = Some(parse_number("spouse.annualIncome", v)?);
    }
    if let Some(v) = provided(&spouse.years_worked) {
        cli.spouse_years_worked = Some(parse_whole("spouse.yearsWorked", v)?);
    }
    if let Some(v) = provided(&spouse.social_security_claim_age) {
        cli.spouse_claim_age = parse_whole("spouse.socialSecurityClaimAge", v)?;
    }

    let budget = &payload.budget;
    if let Some(v) = provided(&budget.healthcare) {
        cli.healthcare = Some(parse_number("budget.healthcare", v)?);
    }
    for (field, value, slot) in [
        ("budget.housing", &budget.housing, &mut cli.housing),
        ("budget.foodLiving", &budget.food_living, &mut cli.food_living),
        (
            "budget.travelLeisure",
            &budget.travel_leisure,
            &mut cli.travel_leisure,
        ),
        (
            "budget.otherDiscretionary",
            &budget.other_discretionary,
            &mut cli.other_discretionary,
        ),
    ] {
        if let Some(v) = provided(value) {
            *slot = parse_number(field, v)?;
        }
    }

    cli.state = provided_text(&payload.state);
    cli.zip_code = provided_text(&payload.zip_code);
    if let Some(v) = &payload.tobacco_use {
        cli.tobacco_use = parse_flag("tobaccoUse", v)?;
    }

    if let Some(v) = provided(&payload.as_of_year) {
        cli.as_of_year = Some(parse_whole("asOfYear", v)?);
    }
    if let Some(v) = provided(&payload.seed) {
        cli.seed = Some(parse_whole::<u64>("seed", v)?);
    }

    Ok(cli)
}

fn check_as_of_year(year: i32) -> Result<i32, InputError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(InputError::out_of_range(
            "asOfYear",
            format!("must be between {MIN_YEAR} and {MAX_YEAR}"),
        ))
    }
}

fn check_birth_year(field: &str, year: i32, as_of_year: i32) -> Result<i32, InputError> {
    if (MIN_YEAR..=as_of_year).contains(&year) {
        Ok(year)
    } else {
        Err(InputError::out_of_range(
            field,
            format!("must be between {MIN_YEAR} and {as_of_year}"),
        ))
    }
}

fn check_age(field: &str, age: u32) -> Result<u32, InputError> {
    if age <= MAX_AGE {
        Ok(age)
    } else {
        Err(InputError::out_of_range(field, format!("must be at most {MAX_AGE}")))
    }
}

fn check_claim_age(field: &str, age: u32) -> Result<u32, InputError> {
    if (MIN_CLAIM_AGE..=MAX_CLAIM_AGE).contains(&age) {
        Ok(age)
    } else {
        Err(InputError::out_of_range(
            field,
            format!("must be between {MIN_CLAIM_AGE} and {MAX_CLAIM_AGE}"),
        ))
    }
}

fn check_years_worked(field: &str, years: u32) -> Result<u32, InputError> {
    if years <= MAX_YEARS_WORKED {
        Ok(years)
    } else {
        Err(InputError::out_of_range(
            field,
            format!("must be between 0 and {MAX_YEARS_WORKED}"),
        ))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<f64, InputError> {
    let value = ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(InputError::out_of_range(field, "must be >= 0"));
    }
    Ok(value)
}

fn build_household(cli: &Cli, as_of_year: i32) -> Result<Household, InputError> {
    let status = match cli.marital_status {
        CliMaritalStatus::Single => return Ok(Household::Single),
        CliMaritalStatus::Married => CoupleStatus::Married,
        CliMaritalStatus::Partnered => CoupleStatus::Partnered,
    };

    let missing = |field: &str| InputError::Missing {
        field: field.to_string(),
    };
    let birth_year = cli.spouse_birth_year.ok_or_else(|| missing("spouse.birthYear"))?;
    let birth_year = check_birth_year("spouse.birthYear", birth_year, as_of_year)?;
    let retirement_age = cli
        .spouse_retirement_age
        .ok_or_else(|| missing("spouse.retirementAge"))?;
    let retirement_age = check_age("spouse.retirementAge", retirement_age)?;
    let claim_age = check_claim_age("spouse.socialSecurityClaimAge", cli.spouse_claim_age)?;

    match cli.spouse_working {
        CliSpouseWorking::Both => {
            let annual_income = cli
                .spouse_annual_income
                .ok_or_else(|| missing("spouse.annualIncome"))?;
            let years_worked = cli
                .spouse_years_worked
                .ok_or_else(|| missing("spouse.yearsWorked"))?;
            Ok(Household::BothWorking {
                status,
                spouse: PersonInputs {
                    birth_year,
                    annual_income: check_non_negative("spouse.annualIncome", annual_income)?,
                    years_worked: check_years_worked("spouse.yearsWorked", years_worked)?,
                    retirement_age,
                    claim_age,
                },
            })
        }
        CliSpouseWorking::One => Ok(Household::OneWorking {
            status,
            spouse: NonWorkingSpouse {
                birth_year,
                retirement_age,
                claim_age,
            },
        }),
    }
}

/// Spouse's age in the year the primary retires.
fn spouse_age_at_retirement(cli: &Cli, spouse_birth_year: i32) -> u32 {
    let gap = cli.birth_year as i64 - spouse_birth_year as i64;
    (cli.retirement_age as i64 - gap).clamp(0, MAX_AGE as i64) as u32
}

/// Healthcare budget for a blank form field: a marketplace estimate per adult
/// at the primary's retirement when a location is given, otherwise a flat
/// amount per adult.
fn estimated_healthcare_budget(cli: &Cli, household: &Household) -> f64 {
    let (Some(state), Some(_zip)) = (cli.state.as_deref(), cli.zip_code.as_deref()) else {
        let adults = match household {
            Household::Single => 1.0,
            _ => 2.0,
        };
        return DEFAULT_ANNUAL_HEALTHCARE_PER_PERSON * adults;
    };

    let cost = |age: u32, income: f64| {
        estimate_healthcare(age, income, state, cli.tobacco_use).estimated_annual_cost
    };
    let primary = cost(cli.retirement_age, cli.annual_income);
    let spouse = match household {
        Household::Single => 0.0,
        Household::BothWorking { spouse, .. } => {
            cost(spouse_age_at_retirement(cli, spouse.birth_year), spouse.annual_income)
        }
        Household::OneWorking { spouse, .. } => {
            cost(spouse_age_at_retirement(cli, spouse.birth_year), cli.annual_income)
        }
    };
    primary + spouse
}

fn build_inputs(cli: Cli) -> Result<HouseholdInputs, InputError> {
    let as_of_year = check_as_of_year(
        cli.as_of_year
            .unwrap_or_else(|| chrono::Local::now().year()),
    )?;
    let birth_year = check_birth_year("birthYear", cli.birth_year, as_of_year)?;
    let retirement_age = check_age("retirementAge", cli.retirement_age)?;
    let household = build_household(&cli, as_of_year)?;

    let healthcare = match cli.healthcare {
        Some(amount) => check_non_negative("budget.healthcare", amount)?,
        None => {
            let estimate = estimated_healthcare_budget(&cli, &household);
            log::debug!("healthcare left blank; using estimate {estimate}");
            estimate
        }
    };

    let budget = vec![
        ("housing", check_non_negative("budget.housing", cli.housing)?),
        ("healthcare", healthcare),
        ("foodLiving", check_non_negative("budget.foodLiving", cli.food_living)?),
        (
            "travelLeisure",
            check_non_negative("budget.travelLeisure", cli.travel_leisure)?,
        ),
        (
            "otherDiscretionary",
            check_non_negative("budget.otherDiscretionary", cli.other_discretionary)?,
        ),
    ];
    let budget: Vec<BudgetCategory> = budget
        .into_iter()
        .map(|(name, amount)| BudgetCategory {
            name: name.to_string(),
            amount,
        })
        .collect();
    if budget.iter().map(|c| c.amount).sum::<f64>() <= 0.0 {
        return Err(InputError::out_of_range("budget", "total must be > 0"));
    }

    ensure_finite("realEstateCashflow", cli.real_estate_cashflow)?;

    Ok(HouseholdInputs {
        primary: PersonInputs {
            birth_year,
            annual_income: check_non_negative("annualIncome", cli.annual_income)?,
            years_worked: check_years_worked("yearsWorked", cli.years_worked)?,
            retirement_age,
            claim_age: check_claim_age("socialSecurityClaimAge", cli.social_security_claim_age)?,
        },
        household,
        liquid_assets: check_non_negative("liquidAssets", cli.liquid_assets)?,
        annual_contribution: check_non_negative("annualContribution", cli.annual_contribution)?,
        real_estate_cashflow: cli.real_estate_cashflow,
        market_profile: cli.market_profile.into(),
        calculation_method: cli.calculation_method.into(),
        budget,
        as_of_year,
        seed: cli.seed,
    })
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<HouseholdInputs, String> {
    let payload = serde_json::from_str::<ForecastPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload).map_err(|e| e.to_string())
}

fn inputs_from_payload(payload: ForecastPayload) -> Result<HouseholdInputs, InputError> {
    build_inputs(cli_from_payload(payload)?)
}

fn healthcare_from_payload(payload: HealthcarePayload) -> Result<HealthcareEstimate, InputError> {
    let age = check_age("age", parse_whole("age", required(&payload.age, "age")?)?)?;
    let income = check_non_negative(
        "income",
        parse_number("income", required(&payload.income, "income")?)?,
    )?;
    let state = required_text(&payload.state, "state")?;
    required_text(&payload.zip_code, "zipCode")?;
    let tobacco_use = match &payload.tobacco_use {
        Some(v) => parse_flag("tobaccoUse", v)?,
        None => false,
    };
    Ok(estimate_healthcare(age, income, state, tobacco_use))
}

fn build_response(result: ForecastResult) -> ForecastResponse {
    let s = result.summary;
    let display = DisplaySummary {
        portfolio_at_retirement: format_currency(s.portfolio_at_retirement),
        safe_annual_withdrawal: format_currency(s.safe_annual_withdrawal),
        total_annual_income: format_currency(s.total_annual_income),
        annual_budget: format_currency(s.annual_budget),
        surplus_deficit: format_currency(s.surplus_deficit),
        safe_sustainable_spending: format_currency(s.safe_sustainable_spending),
    };
    ForecastResponse { result, display }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionError {
    Busy,
    Discarded,
}

/// One form's run state. A reset bumps the generation so any run started
/// before it completes into the void.
#[derive(Debug, Default)]
struct Session {
    generation: u64,
    in_flight: bool,
    latest: Option<ForecastResponse>,
}

impl Session {
    fn begin(&mut self) -> Result<RunTicket, SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        self.in_flight = true;
        Ok(RunTicket {
            generation: self.generation,
        })
    }

    fn complete(&mut self, ticket: RunTicket, response: ForecastResponse) -> Result<(), SessionError> {
        if ticket.generation != self.generation {
            return Err(SessionError::Discarded);
        }
        self.in_flight = false;
        self.latest = Some(response);
        Ok(())
    }

    fn abandon(&mut self, ticket: RunTicket) {
        if ticket.generation == self.generation {
            self.in_flight = false;
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = false;
        self.latest = None;
    }
}

#[derive(Clone, Default)]
struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/forecast",
            get(latest_forecast_handler).post(forecast_post_handler),
        )
        .route("/api/reset", post(reset_handler))
        .route("/api/healthcare-estimate", post(healthcare_estimate_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::default());

    let listener = TcpListener::bind(addr).await?;
    log::info!("retirement forecast API listening on http://{addr}");
    log::info!("local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, StatusResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn latest_forecast_handler(State(state): State<AppState>) -> Response {
    match state.with_session(|s| s.latest.clone()) {
        Some(response) => json_response(StatusCode::OK, response),
        None => error_response(StatusCode::NOT_FOUND, "No forecast has been calculated"),
    }
}

async fn reset_handler(State(state): State<AppState>) -> Response {
    state.with_session(Session::reset);
    json_response(StatusCode::OK, StatusResponse { status: "reset" })
}

async fn healthcare_estimate_handler(Json(payload): Json<HealthcarePayload>) -> Response {
    match healthcare_from_payload(payload) {
        Ok(estimate) => {
            let display_annual_cost = format_currency(estimate.estimated_annual_cost);
            json_response(
                StatusCode::OK,
                HealthcareResponse {
                    estimate,
                    display_annual_cost,
                },
            )
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn forecast_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<ForecastPayload>,
) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(e) => {
            log::warn!("rejected forecast request: {e}");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let ticket = match state.with_session(Session::begin) {
        Ok(ticket) => ticket,
        Err(_) => {
            return error_response(StatusCode::CONFLICT, "A calculation is already in progress");
        }
    };

    let outcome = tokio::task::spawn_blocking(move || run_forecast(&inputs)).await;
    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            state.with_session(|s| s.abandon(ticket));
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
        Err(e) => {
            state.with_session(|s| s.abandon(ticket));
            log::error!("forecast worker failed: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Calculation failed");
        }
    };

    let response = build_response(result);
    match state.with_session(|s| s.complete(ticket, response.clone())) {
        Ok(()) => json_response(StatusCode::OK, response),
        Err(_) => {
            log::warn!("discarded forecast started before reset");
            error_response(StatusCode::CONFLICT, "Form was reset; result discarded")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn render_report(result: &ForecastResult) -> String {
    let s = &result.summary;
    let mut out = String::new();
    out.push_str(&format!(
        "Current age {}, {} years to retirement\n\n",
        result.current_age, result.years_to_retirement
    ));
    for (label, value) in [
        ("Portfolio at Retirement", s.portfolio_at_retirement),
        ("Safe Annual Withdrawal", s.safe_annual_withdrawal),
        ("Total Annual Income", s.total_annual_income),
        ("Annual Budget", s.annual_budget),
        ("Surplus/Deficit", s.surplus_deficit),
        ("Safe Sustainable Spending", s.safe_sustainable_spending),
    ] {
        out.push_str(&format!("{label:<26} {:>14}\n", format_currency(value)));
    }

    out.push_str(&format!(
        "\n{:>4} {:>14} {:>12} {:>12} {:>12} {:>12} {:>14}\n",
        "Age", "Start", "Gains", "RealEstate", "SocialSec", "Spending", "End"
    ));
    for row in &result.forecast {
        out.push_str(&format!(
            "{:>4} {:>14} {:>12} {:>12} {:>12} {:>12} {:>14}\n",
            row.age,
            format_currency(row.starting_balance),
            format_currency(row.investment_gains),
            format_currency(row.real_estate_cashflow),
            format_currency(row.social_security),
            format_currency(row.spending),
            format_currency(row.ending_balance),
        ));
    }
    out
}

/// Parses `forecast` flags, runs once and returns the printable report.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let inputs = build_inputs(cli).map_err(|e| e.to_string())?;
    let result = run_forecast(&inputs).map_err(|e| e.to_string())?;
    Ok(render_report(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FORECAST_YEARS, run_forecast_with_source, Rng};

    const FORM_JSON: &str = r#"{
        "maritalStatus": "single",
        "birthYear": "1960",
        "retirementAge": "67",
        "liquidAssets": "500000",
        "realEstateCashflow": "",
        "annualIncome": "80000",
        "yearsWorked": "35",
        "annualContribution": "",
        "marketProfile": "Moderate",
        "calculationMethod": "deterministic",
        "socialSecurityClaimAge": "67",
        "spouse": {
            "birthYear": "",
            "retirementAge": "",
            "bothWorking": "both",
            "annualIncome": "",
            "yearsWorked": "",
            "socialSecurityClaimAge": "67"
        },
        "budget": {
            "housing": "18000",
            "healthcare": "8000",
            "foodLiving": "9000",
            "travelLeisure": "5000",
            "otherDiscretionary": ""
        },
        "asOfYear": 2027
    }"#;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn form_with(edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut value: serde_json::Value = serde_json::from_str(FORM_JSON).unwrap();
        edit(&mut value);
        value.to_string()
    }

    fn sample_cli() -> Cli {
        let mut cli = default_cli_for_api();
        cli.birth_year = 1970;
        cli.retirement_age = 65;
        cli.liquid_assets = 250_000.0;
        cli.annual_income = 90_000.0;
        cli.years_worked = 30;
        cli.housing = 30_000.0;
        cli.as_of_year = Some(2025);
        cli
    }

    #[test]
    fn form_state_strings_parse_into_inputs() {
        let inputs = inputs_from_json(FORM_JSON).unwrap();
        assert_eq!(inputs.primary.birth_year, 1960);
        assert_eq!(inputs.primary.claim_age, 67);
        assert_eq!(inputs.household, Household::Single);
        assert_eq!(inputs.real_estate_cashflow, 0.0);
        assert_eq!(inputs.annual_contribution, 0.0);
        assert_eq!(inputs.market_profile, MarketProfile::Moderate);
        assert_eq!(inputs.calculation_method, CalculationMethod::Deterministic);
        assert_eq!(inputs.annual_budget(), 40_000.0);
        assert_eq!(inputs.budget.len(), 5);
        assert_eq!(inputs.as_of_year, 2027);
    }

    #[test]
    fn numeric_json_values_are_accepted() {
        let json = form_with(|v| {
            v["liquidAssets"] = serde_json::json!(123456.5);
            v["yearsWorked"] = serde_json::json!(20);
        });
        let inputs = inputs_from_json(&json).unwrap();
        assert_eq!(inputs.liquid_assets, 123_456.5);
        assert_eq!(inputs.primary.years_worked, 20);
    }

    #[test]
    fn blank_required_field_is_reported_missing() {
        let json = form_with(|v| v["annualIncome"] = serde_json::json!(""));
        assert_eq!(inputs_from_json(&json).unwrap_err(), "annualIncome is required");

        let json = form_with(|v| {
            v.as_object_mut().unwrap().remove("birthYear");
        });
        assert_eq!(inputs_from_json(&json).unwrap_err(), "birthYear is required");
    }

    #[test]
    fn non_numeric_text_is_rejected_with_field_name() {
        let json = form_with(|v| v["liquidAssets"] = serde_json::json!("lots"));
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "liquidAssets must be a number, got \"lots\""
        );

        let json = form_with(|v| v["budget"]["housing"] = serde_json::json!("12k"));
        assert!(inputs_from_json(&json).unwrap_err().starts_with("budget.housing"));
    }

    #[test]
    fn nan_text_is_rejected_as_non_finite() {
        let json = form_with(|v| v["annualIncome"] = serde_json::json!("NaN"));
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "annualIncome must be a finite number"
        );
    }

    #[test]
    fn fractional_age_is_not_a_whole_number() {
        let json = form_with(|v| v["retirementAge"] = serde_json::json!(66.5));
        assert!(inputs_from_json(&json).unwrap_err().starts_with("retirementAge must be a number"));
    }

    #[test]
    fn zero_budget_is_rejected_at_the_boundary() {
        let json = form_with(|v| {
            v["budget"] = serde_json::json!({ "housing": "0", "healthcare": "0" });
        });
        assert_eq!(inputs_from_json(&json).unwrap_err(), "budget total must be > 0");
    }

    #[test]
    fn claim_age_outside_window_is_rejected() {
        let json = form_with(|v| v["socialSecurityClaimAge"] = serde_json::json!("61"));
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "socialSecurityClaimAge must be between 62 and 70"
        );
    }

    #[test]
    fn negative_assets_rejected_but_negative_real_estate_allowed() {
        let json = form_with(|v| v["liquidAssets"] = serde_json::json!("-1"));
        assert_eq!(inputs_from_json(&json).unwrap_err(), "liquidAssets must be >= 0");

        let json = form_with(|v| v["realEstateCashflow"] = serde_json::json!("-2400"));
        assert_eq!(inputs_from_json(&json).unwrap().real_estate_cashflow, -2_400.0);
    }

    #[test]
    fn unknown_market_profile_is_rejected() {
        let json = form_with(|v| v["marketProfile"] = serde_json::json!("Reckless"));
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "marketProfile has unknown option \"Reckless\""
        );
    }

    #[test]
    fn monte_carlo_form_value_selects_stochastic_method() {
        let json = form_with(|v| {
            v["calculationMethod"] = serde_json::json!("monteCarlo");
            v["seed"] = serde_json::json!(11);
        });
        let inputs = inputs_from_json(&json).unwrap();
        assert_eq!(inputs.calculation_method, CalculationMethod::Stochastic);
        assert_eq!(inputs.seed, Some(11));
    }

    #[test]
    fn married_one_working_builds_spousal_household() {
        let json = form_with(|v| {
            v["maritalStatus"] = serde_json::json!("married");
            v["spouse"]["birthYear"] = serde_json::json!("1963");
            v["spouse"]["retirementAge"] = serde_json::json!("64");
            v["spouse"]["bothWorking"] = serde_json::json!("one");
            v["spouse"]["socialSecurityClaimAge"] = serde_json::json!("62");
        });
        let inputs = inputs_from_json(&json).unwrap();
        assert_eq!(
            inputs.household,
            Household::OneWorking {
                status: CoupleStatus::Married,
                spouse: NonWorkingSpouse {
                    birth_year: 1963,
                    retirement_age: 64,
                    claim_age: 62,
                },
            }
        );
    }

    #[test]
    fn both_working_requires_spouse_earnings() {
        let json = form_with(|v| {
            v["maritalStatus"] = serde_json::json!("partnered");
            v["spouse"]["birthYear"] = serde_json::json!("1963");
            v["spouse"]["retirementAge"] = serde_json::json!("64");
        });
        assert_eq!(inputs_from_json(&json).unwrap_err(), "spouse.annualIncome is required");

        let json = form_with(|v| {
            v["maritalStatus"] = serde_json::json!("partnered");
            v["spouse"]["birthYear"] = serde_json::json!("1963");
            v["spouse"]["retirementAge"] = serde_json::json!("64");
            v["spouse"]["annualIncome"] = serde_json::json!("55000");
            v["spouse"]["yearsWorked"] = serde_json::json!("30");
        });
        let inputs = inputs_from_json(&json).unwrap();
        let Household::BothWorking { status, spouse } = inputs.household else {
            panic!("expected both-working household");
        };
        assert_eq!(status, CoupleStatus::Partnered);
        assert_eq!(spouse.annual_income, 55_000.0);
        assert_eq!(spouse.years_worked, 30);
    }

    #[test]
    fn build_inputs_rejects_excess_years_worked() {
        let mut cli = sample_cli();
        cli.years_worked = 51;
        assert_eq!(
            build_inputs(cli).unwrap_err().to_string(),
            "yearsWorked must be between 0 and 50"
        );
    }

    #[test]
    fn build_inputs_defaults_as_of_year_to_today() {
        let mut cli = sample_cli();
        cli.as_of_year = None;
        let inputs = build_inputs(cli).unwrap();
        assert!(inputs.as_of_year >= 2024);
    }

    #[test]
    fn huge_retirement_age_is_rejected_before_the_engine_runs() {
        let json = form_with(|v| v["retirementAge"] = serde_json::json!("4294967295"));
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "retirementAge must be at most 120"
        );
    }

    #[test]
    fn birth_year_must_fall_between_1900_and_as_of_year() {
        for year in ["-2147483648", "1899", "2028"] {
            let json = form_with(|v| v["birthYear"] = serde_json::json!(year));
            assert_eq!(
                inputs_from_json(&json).unwrap_err(),
                "birthYear must be between 1900 and 2027"
            );
        }
    }

    #[test]
    fn as_of_year_is_range_checked() {
        let json = form_with(|v| v["asOfYear"] = serde_json::json!(i32::MAX));
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "asOfYear must be between 1900 and 2200"
        );
    }

    #[test]
    fn spouse_years_and_ages_are_range_checked() {
        let couple = |v: &mut serde_json::Value| {
            v["maritalStatus"] = serde_json::json!("married");
            v["spouse"]["birthYear"] = serde_json::json!("1963");
            v["spouse"]["retirementAge"] = serde_json::json!("64");
            v["spouse"]["bothWorking"] = serde_json::json!("one");
        };

        let json = form_with(|v| {
            couple(v);
            v["spouse"]["birthYear"] = serde_json::json!("1700");
        });
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "spouse.birthYear must be between 1900 and 2027"
        );

        let json = form_with(|v| {
            couple(v);
            v["spouse"]["retirementAge"] = serde_json::json!("500");
        });
        assert_eq!(
            inputs_from_json(&json).unwrap_err(),
            "spouse.retirementAge must be at most 120"
        );
    }

    fn healthcare_budget(inputs: &HouseholdInputs) -> f64 {
        inputs
            .budget
            .iter()
            .find(|c| c.name == "healthcare")
            .map(|c| c.amount)
            .unwrap()
    }

    #[test]
    fn blank_healthcare_without_location_uses_flat_amount_per_adult() {
        let json = form_with(|v| v["budget"]["healthcare"] = serde_json::json!(""));
        assert_eq!(healthcare_budget(&inputs_from_json(&json).unwrap()), 12_000.0);

        let json = form_with(|v| {
            v["budget"]["healthcare"] = serde_json::json!("");
            v["maritalStatus"] = serde_json::json!("partnered");
            v["spouse"]["birthYear"] = serde_json::json!("1963");
            v["spouse"]["retirementAge"] = serde_json::json!("64");
            v["spouse"]["bothWorking"] = serde_json::json!("one");
        });
        assert_eq!(healthcare_budget(&inputs_from_json(&json).unwrap()), 24_000.0);
    }

    #[test]
    fn blank_healthcare_with_location_uses_marketplace_estimate() {
        // Bronze at 67: 350 + 17*15 = 605, TX 0.9 -> 544.5/month + 7000 deductible
        let json = form_with(|v| {
            v["budget"]["healthcare"] = serde_json::json!("");
            v["state"] = serde_json::json!("TX");
            v["zipCode"] = serde_json::json!("75001");
        });
        assert_approx(healthcare_budget(&inputs_from_json(&json).unwrap()), 13_534.0);

        let json = form_with(|v| {
            v["budget"]["healthcare"] = serde_json::json!("");
            v["state"] = serde_json::json!("TX");
            v["zipCode"] = serde_json::json!("75001");
            v["tobaccoUse"] = serde_json::json!("true");
        });
        // 605 * 1.5 * 0.9 = 816.75/month
        assert_approx(healthcare_budget(&inputs_from_json(&json).unwrap()), 16_801.0);
    }

    #[test]
    fn spouse_estimate_uses_their_age_when_primary_retires() {
        // spouse born 1963 is 64 when the 1960 primary retires at 67:
        // 350 + 14*15 = 560 * 0.9 = 504/month + 7000
        let json = form_with(|v| {
            v["budget"]["healthcare"] = serde_json::json!("");
            v["state"] = serde_json::json!("TX");
            v["zipCode"] = serde_json::json!("75001");
            v["maritalStatus"] = serde_json::json!("married");
            v["spouse"]["birthYear"] = serde_json::json!("1963");
            v["spouse"]["retirementAge"] = serde_json::json!("64");
            v["spouse"]["bothWorking"] = serde_json::json!("one");
        });
        assert_approx(
            healthcare_budget(&inputs_from_json(&json).unwrap()),
            13_534.0 + 13_048.0,
        );
    }

    #[test]
    fn explicit_zero_healthcare_is_kept() {
        let json = form_with(|v| {
            v["budget"]["healthcare"] = serde_json::json!("0");
            v["state"] = serde_json::json!("TX");
            v["zipCode"] = serde_json::json!("75001");
        });
        assert_eq!(healthcare_budget(&inputs_from_json(&json).unwrap()), 0.0);
    }

    fn healthcare_from_json(json: &str) -> Result<HealthcareEstimate, String> {
        let payload = serde_json::from_str::<HealthcarePayload>(json).map_err(|e| e.to_string())?;
        healthcare_from_payload(payload).map_err(|e| e.to_string())
    }

    #[test]
    fn healthcare_estimate_requires_location() {
        let err = healthcare_from_json(r#"{"age": "65", "income": "80000", "state": "TX"}"#)
            .unwrap_err();
        assert_eq!(err, "zipCode is required");

        let err = healthcare_from_json(
            r#"{"age": 200, "income": 80000, "state": "TX", "zipCode": "75001"}"#,
        )
        .unwrap_err();
        assert_eq!(err, "age must be at most 120");
    }

    #[test]
    fn healthcare_estimate_serializes_quotes_and_display_cost() {
        let estimate = healthcare_from_json(
            r#"{"age": "65", "income": "80000", "state": "TX", "zipCode": "75001", "tobaccoUse": false}"#,
        )
        .unwrap();
        assert_approx(estimate.estimated_annual_cost, 13_210.0);

        let display_annual_cost = format_currency(estimate.estimated_annual_cost);
        let json = serde_json::to_value(HealthcareResponse {
            estimate,
            display_annual_cost,
        })
        .unwrap();
        assert_eq!(json["recommendedTier"], "Bronze");
        assert_eq!(json["subsidyEligible"], false);
        assert_eq!(json["quotes"].as_array().unwrap().len(), 4);
        assert_eq!(json["quotes"][0]["deductible"], 7_000.0);
        assert_eq!(json["displayAnnualCost"], "$13,210");
    }

    #[test]
    fn unknown_tobacco_flag_is_rejected() {
        let err = healthcare_from_json(
            r#"{"age": "65", "income": "80000", "state": "TX", "zipCode": "75001", "tobaccoUse": "sometimes"}"#,
        )
        .unwrap_err();
        assert_eq!(err, "tobaccoUse has unknown option \"sometimes\"");
    }

    #[test]
    fn response_serialization_contains_expected_fields() {
        let inputs = inputs_from_json(FORM_JSON).unwrap();
        let result = run_forecast_with_source(&inputs, &mut Rng::new(1)).unwrap();
        let json = serde_json::to_value(build_response(result)).unwrap();

        for key in [
            "currentAge",
            "yearsToRetirement",
            "forecast",
            "summary",
            "socialSecurity",
            "charts",
            "display",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["forecast"].as_array().unwrap().len(), FORECAST_YEARS as usize);
        assert_eq!(json["forecast"][0]["endingBalance"], 523_800.0);
        assert_eq!(json["summary"]["surplusDeficit"], 8_800.0);
        assert_eq!(json["charts"]["portfolioBalance"][0]["year"], 67);
        assert_eq!(json["charts"]["budgetBreakdown"].as_array().unwrap().len(), 4);
        assert_eq!(json["display"]["portfolioAtRetirement"], "$500,000");
        assert_eq!(json["socialSecurity"]["primaryAtFra"], 28_800.0);
    }

    fn sample_response() -> ForecastResponse {
        let inputs = build_inputs(sample_cli()).unwrap();
        build_response(run_forecast(&inputs).unwrap())
    }

    #[test]
    fn session_allows_one_run_in_flight() {
        let mut session = Session::default();
        let ticket = session.begin().unwrap();
        assert_eq!(session.begin(), Err(SessionError::Busy));

        session.complete(ticket, sample_response()).unwrap();
        assert!(session.latest.is_some());
        assert!(session.begin().is_ok());
    }

    #[test]
    fn session_discards_result_started_before_reset() {
        let mut session = Session::default();
        let stale = session.begin().unwrap();
        session.reset();

        let fresh = session.begin().unwrap();
        assert_eq!(
            session.complete(stale, sample_response()),
            Err(SessionError::Discarded)
        );
        assert!(session.latest.is_none());
        assert!(session.in_flight);

        session.complete(fresh, sample_response()).unwrap();
        assert!(session.latest.is_some());
        assert!(!session.in_flight);
    }

    #[test]
    fn session_abandon_only_clears_current_generation() {
        let mut session = Session::default();
        let stale = session.begin().unwrap();
        session.reset();
        let _fresh = session.begin().unwrap();
        session.abandon(stale);
        assert!(session.in_flight);
    }

    #[test]
    fn cli_flags_produce_report_with_thirty_rows() {
        let report = run_cli([
            "retire forecast",
            "--birth-year",
            "1960",
            "--retirement-age",
            "67",
            "--liquid-assets",
            "500000",
            "--annual-income",
            "80000",
            "--years-worked",
            "35",
            "--housing",
            "40000",
            "--real-estate-cashflow",
            "-1200",
            "--as-of-year",
            "2027",
        ])
        .unwrap();

        assert!(report.contains("Portfolio at Retirement"));
        assert!(report.contains("$500,000"));
        let rows = report
            .lines()
            .filter(|line| line.trim_start().starts_with(|c: char| c.is_ascii_digit()))
            .count();
        assert_eq!(rows, FORECAST_YEARS as usize);
    }

    #[test]
    fn cli_reports_validation_errors() {
        let err = run_cli([
            "retire forecast",
            "--birth-year",
            "1960",
            "--retirement-age",
            "67",
            "--liquid-assets",
            "500000",
            "--annual-income",
            "80000",
            "--years-worked",
            "35",
            "--healthcare",
            "0",
        ])
        .unwrap_err();
        assert_eq!(err, "budget total must be > 0");
    }
}
