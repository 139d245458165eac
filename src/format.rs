use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const CURRENCY_SYMBOL: &str = "$";

fn format_with_commas(value: u64) -> String {
    let s = value.to_string().chars().rev().collect::<Vec<char>>();
    let mut out = Vec::new();
    for (i, ch) in s.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    out.into_iter().rev().collect()
}

/// `$1,234.50`, with a leading `-` for negative amounts.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let abs = rounded.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * Decimal::ONE_HUNDRED).trunc();
    let whole = whole.to_u64().unwrap_or(u64::MAX);
    let cents = cents.to_u64().unwrap_or(0);
    format!(
        "{}{}{}.{:02}",
        sign,
        CURRENCY_SYMBOL,
        format_with_commas(whole),
        cents
    )
}

/// Amount column of the transactions table: expenses always read as outflows.
pub fn format_outflow(amount: Decimal) -> String {
    format!("-{}", format_currency(amount.abs()))
}

/// `May 1, 2024`
pub fn format_long_date(date: &NaiveDateTime) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `5/1/2024`
pub fn format_short_date(date: &NaiveDateTime) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Value for an `<input type="date">`.
pub fn format_input_date(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d").to_string()
}
