use super::finite_or_zero;
use super::types::{Amortization, AmortizationYear};

const MONTHS_PER_YEAR: u32 = 12;

/// Level monthly payment for a fixed-rate loan.
///
/// Falls back to straight-line repayment when the rate is not positive and to 0
/// when there are no payments to make.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let principal = finite_or_zero(principal);
    let monthly_rate = finite_or_zero(annual_rate_percent) / 100.0 / 12.0;
    let payments = term_years.saturating_mul(MONTHS_PER_YEAR);
    if payments == 0 {
        return 0.0;
    }

    let n = payments as f64;
    if monthly_rate > 0.0 {
        let growth = (1.0 + monthly_rate).powf(n);
        let denom = growth - 1.0;
        if denom > 0.0 && denom.is_finite() {
            return principal * (monthly_rate * growth) / denom;
        }
        return principal * monthly_rate;
    }
    principal / n
}

pub fn compute_amortization(
    principal: f64,
    annual_rate_percent: f64,
    term_years: u32,
) -> Amortization {
    let principal = finite_or_zero(principal);
    let payment = monthly_payment(principal, annual_rate_percent, term_years);
    let monthly_rate = finite_or_zero(annual_rate_percent) / 100.0 / 12.0;
    let payments = term_years.saturating_mul(MONTHS_PER_YEAR);

    let mut yearly_schedule = Vec::new();
    let mut balance = principal;
    let mut year_interest = 0.0;
    let mut year_principal = 0.0;

    for month in 1..=payments {
        let interest = balance * monthly_rate;
        let principal_part = payment - interest;
        year_interest += interest;
        year_principal += principal_part;
        balance = (balance - principal_part).max(0.0);

        if month % MONTHS_PER_YEAR == 0 {
            yearly_schedule.push(AmortizationYear {
                year: month / MONTHS_PER_YEAR,
                balance,
                interest_paid: year_interest,
                principal_paid: year_principal,
                total_paid: year_interest + year_principal,
            });
            year_interest = 0.0;
            year_principal = 0.0;
        }
    }

    Amortization {
        monthly_payment: payment,
        yearly_schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn thirty_year_six_percent_matches_reference_payment() {
        let schedule = compute_amortization(200_000.0, 6.0, 30);
        assert_approx_tol(schedule.monthly_payment, 1_199.10, 0.01);
        assert_eq!(schedule.yearly_schedule.len(), 30);
        let last = schedule.yearly_schedule.last().expect("30 rows");
        assert_eq!(last.year, 30);
        assert_approx_tol(last.balance, 0.0, 1e-4);
    }

    #[test]
    fn first_year_splits_interest_and_principal() {
        let schedule = compute_amortization(200_000.0, 6.5, 30);
        let first = schedule.yearly_schedule[0];
        assert_approx_tol(first.interest_paid, 12_934.18, 0.01);
        assert_approx_tol(first.balance, 197_764.55, 0.01);
        assert_approx_tol(first.total_paid, schedule.monthly_payment * 12.0, 1e-6);
        assert_approx_tol(
            first.principal_paid,
            first.total_paid - first.interest_paid,
            1e-6,
        );
    }

    #[test]
    fn zero_rate_is_straight_line() {
        let schedule = compute_amortization(120_000.0, 0.0, 10);
        assert_approx_tol(schedule.monthly_payment, 1_000.0, 1e-9);
        for row in &schedule.yearly_schedule {
            assert_approx_tol(row.interest_paid, 0.0, 1e-9);
            assert_approx_tol(row.principal_paid, 12_000.0, 1e-6);
        }
        assert_approx_tol(schedule.yearly_schedule[4].balance, 60_000.0, 1e-6);
    }

    #[test]
    fn zero_term_yields_empty_schedule() {
        let schedule = compute_amortization(150_000.0, 5.0, 0);
        assert_eq!(schedule.monthly_payment, 0.0);
        assert!(schedule.yearly_schedule.is_empty());
    }

    #[test]
    fn non_finite_inputs_are_treated_as_zero() {
        let schedule = compute_amortization(f64::NAN, f64::INFINITY, 5);
        assert_eq!(schedule.monthly_payment, 0.0);
        assert_eq!(schedule.yearly_schedule.len(), 5);
        assert!(schedule.yearly_schedule.iter().all(|row| row.balance == 0.0));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_final_balance_is_zero(
            principal in 0u32..2_000_000,
            rate_bp in 0u32..2_000,
            term_years in 1u32..41,
        ) {
            let principal = principal as f64;
            let schedule = compute_amortization(principal, rate_bp as f64 / 100.0, term_years);
            prop_assert_eq!(schedule.yearly_schedule.len(), term_years as usize);
            let last = schedule.yearly_schedule.last().expect("at least one year");
            prop_assert!(last.balance.abs() <= 1e-6 * principal.max(1.0));
            for pair in schedule.yearly_schedule.windows(2) {
                prop_assert!(pair[1].year == pair[0].year + 1);
                prop_assert!(pair[1].balance <= pair[0].balance + 1e-9);
            }
        }

        #[test]
        fn prop_zero_rate_payment_is_principal_over_months(
            principal in 0u32..5_000_000,
            term_years in 1u32..51,
        ) {
            let payment = monthly_payment(principal as f64, 0.0, term_years);
            let expected = principal as f64 / (term_years as f64 * 12.0);
            prop_assert!((payment - expected).abs() <= 1e-9);
        }
    }
}
