pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;

pub fn safe_withdrawal(balance: f64) -> f64 {
    balance * SAFE_WITHDRAWAL_RATE
}

/// Ceiling on spending: available income, capped at the stated budget.
pub fn sustainable_spending(
    balance: f64,
    real_estate_income: f64,
    social_security_income: f64,
    expenses: f64,
) -> f64 {
    let available = safe_withdrawal(balance) + real_estate_income + social_security_income;
    available.min(expenses)
}
