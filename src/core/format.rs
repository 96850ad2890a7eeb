/// Nearest whole unit, ties toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// US-dollar display with thousands separators and no cents, e.g. `-$1,234`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$NaN".to_string();
    }

    let whole = amount.round();
    let digits = format!("{:.0}", whole.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if whole < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
