use super::format::round_half_up;
use super::types::{Household, PersonInputs, SocialSecurityDetails};

pub const FULL_RETIREMENT_AGE: u32 = 67;
const FULL_CAREER_YEARS: f64 = 35.0;
const REPLACEMENT_RATE: f64 = 0.4;
const EARLIEST_CLAIM_AGE: f64 = 62.0;
const EARLY_CLAIM_MULTIPLIER: f64 = 0.70;
const LATE_CLAIM_MULTIPLIER: f64 = 1.32;
const SPOUSAL_SHARE: f64 = 0.5;
const SPOUSAL_REDUCTION_PER_YEAR: f64 = 0.025;

/// Benefit multiplier applied to the full-retirement-age benefit.
pub fn claim_age_multiplier(claim_age: u32) -> f64 {
    match claim_age {
        62 => EARLY_CLAIM_MULTIPLIER,
        70 => LATE_CLAIM_MULTIPLIER,
        _ => {
            let age_diff = claim_age as f64 - EARLIEST_CLAIM_AGE;
            EARLY_CLAIM_MULTIPLIER + (0.32 * age_diff) / 8.0
        }
    }
}

fn full_retirement_benefit(annual_income: f64, years_worked: u32) -> f64 {
    let career_share = (years_worked as f64 / FULL_CAREER_YEARS).clamp(0.0, 1.0);
    annual_income * REPLACEMENT_RATE * career_share
}

/// Annual benefit for a claimant with their own earnings record. Inputs are
/// not range-checked here.
pub fn estimate_benefit(_birth_year: i32, annual_income: f64, years_worked: u32, claim_age: u32) -> f64 {
    let benefit = full_retirement_benefit(annual_income, years_worked) * claim_age_multiplier(claim_age);
    round_half_up(benefit)
}

/// Half of the worker's benefit, reduced by a simple 2.5% per year claimed
/// before `fra`. Claiming after `fra` earns nothing extra.
pub fn estimate_spousal_benefit(primary_benefit: f64, spouse_claim_age: u32, fra: u32) -> f64 {
    let mut benefit = primary_benefit * SPOUSAL_SHARE;
    if spouse_claim_age < fra {
        let reduction = (fra - spouse_claim_age) as f64 * SPOUSAL_REDUCTION_PER_YEAR;
        benefit *= 1.0 - reduction;
    }
    round_half_up(benefit)
}

fn person_benefit(person: &PersonInputs, claim_age: u32) -> f64 {
    estimate_benefit(person.birth_year, person.annual_income, person.years_worked, claim_age)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseholdBenefits {
    pub primary: f64,
    pub spouse: f64,
}

impl HouseholdBenefits {
    pub fn total(self) -> f64 {
        self.primary + self.spouse
    }
}

/// Claimed benefits for the household. A working spouse gets an independent
/// benefit; a non-working spouse gets the spousal benefit off the primary's.
pub fn household_benefits(primary: &PersonInputs, household: &Household) -> HouseholdBenefits {
    let primary_benefit = person_benefit(primary, primary.claim_age);
    let spouse = match household {
        Household::Single => 0.0,
        Household::BothWorking { spouse, .. } => person_benefit(spouse, spouse.claim_age),
        Household::OneWorking { spouse, .. } => {
            estimate_spousal_benefit(primary_benefit, spouse.claim_age, FULL_RETIREMENT_AGE)
        }
    };
    HouseholdBenefits {
        primary: primary_benefit,
        spouse,
    }
}

pub fn benefit_details(primary: &PersonInputs, household: &Household) -> SocialSecurityDetails {
    let claimed = household_benefits(primary, household);

    let primary_at_fra = person_benefit(primary, FULL_RETIREMENT_AGE);
    let spouse_at_fra = match household {
        Household::Single => 0.0,
        Household::BothWorking { spouse, .. } => person_benefit(spouse, FULL_RETIREMENT_AGE),
        Household::OneWorking { .. } => {
            estimate_spousal_benefit(primary_at_fra, FULL_RETIREMENT_AGE, FULL_RETIREMENT_AGE)
        }
    };

    SocialSecurityDetails {
        primary_at_fra,
        primary_claimed: claimed.primary,
        spouse_at_fra,
        spouse_claimed: claimed.spouse,
        total_at_fra: primary_at_fra + spouse_at_fra,
        total_claimed: claimed.total(),
    }
}
