mod amortization;
mod leverage;
mod payoff;
mod types;
mod valuation;

pub use amortization::{compute_amortization, monthly_payment};
pub use leverage::simulate_buyd;
pub use payoff::{priority_order, simulate_debt_payoff};
pub use types::{
    Amortization, AmortizationYear, BorrowMode, BuydEvent, BuydInputs, BuydResult, BuydSummary,
    BuydYear, CalculationResult, DEFAULT_MAX_MONTHS, DebtInput, DebtPayoffParams, DebtPayoffRow,
    DebtPayoffSummary, DebtSimulationResult, DebtStrategy, InvestmentGrade, PriorityParams,
    ProfitYear, PropertyAssumptions, RuleBreach,
};
pub use valuation::calculate_metrics;

/// NaN and infinities become 0 so every engine stays total.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

/// `numerator / denominator`, or 0 when the denominator is 0.
fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
