use super::amortization::{compute_amortization, monthly_payment};
use super::types::{CalculationResult, InvestmentGrade, ProfitYear, PropertyAssumptions};
use super::{non_negative, ratio_or_zero};

const DEFAULT_LOAN_TERM_YEARS: u32 = 30;

const CAPEX_RESERVE_PERCENT: f64 = 5.0;
const REQUIRED_RETURN: f64 = 0.10;
const HOLDING_PERIOD_YEARS: i32 = 10;
const TERMINAL_CAP_RATE: f64 = 0.08;

const STRESS_INCOME_FACTOR: f64 = 0.8;
const STRESS_VACANCY_BUMP_PERCENT: f64 = 10.0;
const STRESS_EXPENSE_FACTOR: f64 = 1.15;
const STRESS_RATE_BUMP_PERCENT: f64 = 2.0;

// Score components saturate at these levels.
const PERFECT_CASH_ON_CASH: f64 = 12.0;
const PERFECT_CAP_RATE: f64 = 8.0;
const PERFECT_MONTHLY_CASH_FLOW: f64 = 500.0;

const PROJECTION_YEARS: u32 = 30;
const APPRECIATION_RATE: f64 = 0.02;

/// Sanitized copy of the assumptions; every field is finite and non-negative.
#[derive(Debug, Clone, Copy)]
struct Property {
    price: f64,
    renovation: f64,
    closing: f64,
    down_payment_percent: f64,
    rate_percent: f64,
    term_years: u32,
    rent: f64,
    other_income: f64,
    vacancy_percent: f64,
    management_percent: f64,
    fixed_monthly_costs: f64,
    maintenance_percent: f64,
}

impl Property {
    fn from_assumptions(a: &PropertyAssumptions) -> Self {
        let fixed_monthly_costs = non_negative(a.property_tax_yearly) / 12.0
            + non_negative(a.insurance_yearly) / 12.0
            + non_negative(a.hoa_monthly)
            + non_negative(a.utilities_monthly)
            + non_negative(a.other_monthly_expenses);
        Self {
            price: non_negative(a.purchase_price),
            renovation: non_negative(a.renovation_cost),
            closing: non_negative(a.closing_costs),
            down_payment_percent: non_negative(a.down_payment_percent),
            rate_percent: non_negative(a.interest_rate),
            term_years: if a.loan_term_years == 0 {
                DEFAULT_LOAN_TERM_YEARS
            } else {
                a.loan_term_years
            },
            rent: non_negative(a.monthly_rent),
            other_income: non_negative(a.other_monthly_income),
            vacancy_percent: non_negative(a.vacancy_rate_percent),
            management_percent: non_negative(a.management_fee_percent),
            fixed_monthly_costs,
            maintenance_percent: non_negative(a.maintenance_percent),
        }
    }

    fn down_payment(&self) -> f64 {
        self.price * self.down_payment_percent / 100.0
    }

    fn loan_amount(&self) -> f64 {
        (self.price - self.down_payment()).max(0.0)
    }

    fn total_initial_cash(&self) -> f64 {
        self.down_payment() + self.closing + self.renovation
    }
}

/// One month of operations under a given income scenario.
#[derive(Debug, Clone, Copy)]
struct OperatingMonth {
    gross_income: f64,
    effective_income: f64,
    expenses: f64,
}

impl OperatingMonth {
    fn new(property: &Property, income_factor: f64, vacancy_percent: f64) -> Self {
        let gross_income = (property.rent + property.other_income) * income_factor;
        let effective_income = gross_income * (1.0 - vacancy_percent / 100.0);
        let expenses = property.fixed_monthly_costs
            + gross_income * property.management_percent / 100.0
            + gross_income * property.maintenance_percent / 100.0;
        Self {
            gross_income,
            effective_income,
            expenses,
        }
    }

    fn noi(&self) -> f64 {
        self.effective_income - self.expenses
    }
}

pub fn calculate_metrics(assumptions: &PropertyAssumptions) -> CalculationResult {
    let property = Property::from_assumptions(assumptions);
    let loan_amount = property.loan_amount();
    let total_initial_cash = property.total_initial_cash();

    let amortization =
        compute_amortization(loan_amount, property.rate_percent, property.term_years);
    let monthly_mortgage = amortization.monthly_payment;
    let monthly_interest = loan_amount * property.rate_percent / 100.0 / 12.0;

    let base = OperatingMonth::new(&property, 1.0, property.vacancy_percent);
    let monthly_noi = base.noi();
    let monthly_cash_flow = monthly_noi - monthly_mortgage;
    let annual_noi = monthly_noi * 12.0;
    let annual_cash_flow = monthly_cash_flow * 12.0;

    let cap_rate = ratio_or_zero(annual_noi, property.price) * 100.0;
    let cash_on_cash = ratio_or_zero(annual_cash_flow, total_initial_cash) * 100.0;

    let owner_earnings_monthly =
        monthly_noi - base.gross_income * CAPEX_RESERVE_PERCENT / 100.0;
    let owner_earnings_annual = owner_earnings_monthly * 12.0;
    let earnings_yield = ratio_or_zero(owner_earnings_annual, property.price) * 100.0;
    let intrinsic_value = intrinsic_value(owner_earnings_annual);
    let margin_of_safety = ratio_or_zero(intrinsic_value - property.price, intrinsic_value) * 100.0;

    let stress_test_cash_flow = stressed_cash_flow(&property, loan_amount);

    let investment_score = investment_score(cash_on_cash, cap_rate, monthly_cash_flow);

    let balances: Vec<f64> = amortization
        .yearly_schedule
        .iter()
        .map(|row| row.balance)
        .collect();
    let cumulative_profit = project_cumulative_profit(
        property.price,
        total_initial_cash,
        annual_cash_flow,
        &balances,
    );

    CalculationResult {
        monthly_mortgage,
        monthly_principal: monthly_mortgage - monthly_interest,
        monthly_interest,
        total_monthly_expenses: base.expenses,
        monthly_noi,
        monthly_cash_flow,
        owner_earnings_monthly,
        owner_earnings_annual,
        earnings_yield,
        intrinsic_value,
        margin_of_safety,
        stress_test_cash_flow,
        stress_test_pass: stress_test_cash_flow > 0.0,
        cap_rate,
        cash_on_cash,
        investment_score,
        investment_grade: InvestmentGrade::from_score(investment_score),
        total_initial_cash,
        yearly_amortization: amortization.yearly_schedule,
        cumulative_profit,
    }
}

/// Ten-year DCF of owner earnings plus a discounted terminal value.
fn intrinsic_value(owner_earnings_annual: f64) -> f64 {
    if owner_earnings_annual <= 0.0 {
        return 0.0;
    }
    let dcf: f64 = (1..=HOLDING_PERIOD_YEARS)
        .map(|year| owner_earnings_annual / (1.0 + REQUIRED_RETURN).powi(year))
        .sum();
    let terminal = owner_earnings_annual / TERMINAL_CAP_RATE;
    dcf + terminal / (1.0 + REQUIRED_RETURN).powi(HOLDING_PERIOD_YEARS)
}

fn stressed_cash_flow(property: &Property, loan_amount: f64) -> f64 {
    let vacancy = (property.vacancy_percent + STRESS_VACANCY_BUMP_PERCENT).min(100.0);
    let stressed = OperatingMonth::new(property, STRESS_INCOME_FACTOR, vacancy);
    let expenses = stressed.expenses * STRESS_EXPENSE_FACTOR;
    let mortgage = monthly_payment(
        loan_amount,
        property.rate_percent + STRESS_RATE_BUMP_PERCENT,
        property.term_years,
    );
    stressed.effective_income - expenses - mortgage
}

fn investment_score(cash_on_cash: f64, cap_rate: f64, monthly_cash_flow: f64) -> u32 {
    let part = |value: f64, perfect: f64| (value / perfect * 100.0).clamp(0.0, 100.0);
    let score = part(cash_on_cash, PERFECT_CASH_ON_CASH) * 0.5
        + part(cap_rate, PERFECT_CAP_RATE) * 0.3
        + part(monthly_cash_flow, PERFECT_MONTHLY_CASH_FLOW) * 0.2;
    score.round() as u32
}

fn project_cumulative_profit(
    price: f64,
    total_initial_cash: f64,
    annual_cash_flow: f64,
    loan_balances: &[f64],
) -> Vec<ProfitYear> {
    let mut rows = Vec::with_capacity(PROJECTION_YEARS as usize);
    let mut property_value = price;
    let mut cumulative_cash_flow = -total_initial_cash;

    for year in 1..=PROJECTION_YEARS {
        property_value *= 1.0 + APPRECIATION_RATE;
        cumulative_cash_flow += annual_cash_flow;
        let balance = loan_balances
            .get(year as usize - 1)
            .copied()
            .unwrap_or(0.0);
        let equity = property_value - balance;
        rows.push(ProfitYear {
            year,
            cumulative_cash_flow,
            equity,
            total_value: cumulative_cash_flow + equity,
        });
    }
    rows
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

    fn sample_condo() -> PropertyAssumptions {
        PropertyAssumptions {
            purchase_price: 250_000.0,
            renovation_cost: 15_000.0,
            closing_costs: 5_000.0,
            down_payment_percent: 20.0,
            interest_rate: 6.5,
            loan_term_years: 30,
            monthly_rent: 2_200.0,
            other_monthly_income: 0.0,
            vacancy_rate_percent: 5.0,
            management_fee_percent: 10.0,
            property_tax_yearly: 800.0,
            insurance_yearly: 1_200.0,
            hoa_monthly: 150.0,
            utilities_monthly: 0.0,
            maintenance_percent: 5.0,
            other_monthly_expenses: 0.0,
        }
    }

    #[test]
    fn condo_core_metrics() {
        let result = calculate_metrics(&sample_condo());
        assert_approx_tol(result.total_initial_cash, 70_000.0, 1e-9);
        assert_approx_tol(result.monthly_mortgage, 1_264.136, 1e-3);
        assert_approx_tol(result.total_monthly_expenses, 646.6667, 1e-3);
        assert_approx_tol(result.monthly_noi, 1_443.3333, 1e-3);
        assert_approx_tol(result.monthly_cash_flow, 179.197, 1e-3);
        assert_approx_tol(result.cap_rate, 6.928, 1e-9);
        assert_approx_tol(result.cash_on_cash, 3.07195, 1e-4);
        assert_approx_tol(result.monthly_interest, 1_083.3333, 1e-3);
        assert_approx_tol(
            result.monthly_principal + result.monthly_interest,
            result.monthly_mortgage,
            1e-9,
        );
    }

    #[test]
    fn condo_owner_earnings_and_intrinsic_value() {
        let result = calculate_metrics(&sample_condo());
        assert_approx_tol(result.owner_earnings_monthly, 1_333.3333, 1e-3);
        assert_approx_tol(result.owner_earnings_annual, 16_000.0, 1e-6);
        assert_approx_tol(result.earnings_yield, 6.4, 1e-9);
        assert_approx_tol(result.intrinsic_value, 175_421.73, 0.01);
        assert_approx_tol(result.margin_of_safety, -42.5137, 1e-3);
    }

    #[test]
    fn condo_fails_stress_test_and_scores_f() {
        let result = calculate_metrics(&sample_condo());
        assert_approx_tol(result.stress_test_cash_flow, -709.594, 1e-3);
        assert!(!result.stress_test_pass);
        assert_eq!(result.investment_score, 46);
        assert_eq!(result.investment_grade, InvestmentGrade::F);
    }

    #[test]
    fn cumulative_profit_starts_from_initial_cash_and_uses_loan_balance() {
        let result = calculate_metrics(&sample_condo());
        assert_eq!(result.cumulative_profit.len(), 30);
        assert_eq!(result.yearly_amortization.len(), 30);
        let first = result.cumulative_profit[0];
        assert_eq!(first.year, 1);
        assert_approx_tol(first.cumulative_cash_flow, -67_849.63, 0.01);
        assert_approx_tol(first.equity, 57_235.45, 0.01);
        assert_approx_tol(first.total_value, first.cumulative_cash_flow + first.equity, 1e-9);

        let last = result.cumulative_profit[29];
        assert_approx_tol(last.equity, 250_000.0 * 1.02f64.powi(30), 1e-3);
    }

    #[test]
    fn equity_is_full_value_after_short_loan_ends() {
        let mut assumptions = sample_condo();
        assumptions.loan_term_years = 15;
        let result = calculate_metrics(&assumptions);
        assert_eq!(result.yearly_amortization.len(), 15);
        let year_20 = result.cumulative_profit[19];
        assert_approx_tol(year_20.equity, 250_000.0 * 1.02f64.powi(20), 1e-6);
    }

    #[test]
    fn zero_loan_term_defaults_to_thirty_years() {
        let mut assumptions = sample_condo();
        assumptions.loan_term_years = 0;
        let result = calculate_metrics(&assumptions);
        assert_eq!(result.yearly_amortization.len(), 30);
        assert_approx_tol(result.monthly_mortgage, 1_264.136, 1e-3);
    }

    #[test]
    fn all_zero_input_is_renderable() {
        let result = calculate_metrics(&PropertyAssumptions::default());
        assert_eq!(result.monthly_mortgage, 0.0);
        assert_eq!(result.cap_rate, 0.0);
        assert_eq!(result.cash_on_cash, 0.0);
        assert_eq!(result.earnings_yield, 0.0);
        assert_eq!(result.intrinsic_value, 0.0);
        assert_eq!(result.margin_of_safety, 0.0);
        assert!(!result.stress_test_pass);
        assert_eq!(result.investment_score, 0);
        assert_eq!(result.investment_grade, InvestmentGrade::F);
        assert_eq!(result.cumulative_profit.len(), 30);
    }

    #[test]
    fn negative_and_nan_fields_coerce_to_zero() {
        let mut assumptions = sample_condo();
        assumptions.hoa_monthly = -500.0;
        assumptions.other_monthly_income = f64::NAN;
        let mut expected = sample_condo();
        expected.hoa_monthly = 0.0;
        assert_eq!(calculate_metrics(&assumptions), calculate_metrics(&expected));
    }

    #[test]
    fn cash_purchase_scores_top_grade() {
        let assumptions = PropertyAssumptions {
            purchase_price: 100_000.0,
            down_payment_percent: 100.0,
            interest_rate: 7.0,
            loan_term_years: 30,
            monthly_rent: 1_500.0,
            ..PropertyAssumptions::default()
        };
        let result = calculate_metrics(&assumptions);
        assert_eq!(result.monthly_mortgage, 0.0);
        assert_approx_tol(result.cap_rate, 18.0, 1e-9);
        assert_approx_tol(result.cash_on_cash, 18.0, 1e-9);
        assert_eq!(result.investment_score, 100);
        assert_eq!(result.investment_grade, InvestmentGrade::APlus);
        assert!(result.stress_test_pass);
        assert!(result.yearly_amortization.iter().all(|row| row.balance == 0.0));
    }

    #[test]
    fn grade_bands() {
        assert_eq!(InvestmentGrade::from_score(100), InvestmentGrade::APlus);
        assert_eq!(InvestmentGrade::from_score(90), InvestmentGrade::APlus);
        assert_eq!(InvestmentGrade::from_score(89), InvestmentGrade::A);
        assert_eq!(InvestmentGrade::from_score(70), InvestmentGrade::B);
        assert_eq!(InvestmentGrade::from_score(60), InvestmentGrade::C);
        assert_eq!(InvestmentGrade::from_score(50), InvestmentGrade::D);
        assert_eq!(InvestmentGrade::from_score(49), InvestmentGrade::F);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_metrics_are_finite_and_bounded(
            price in 0u32..2_000_000,
            down_pct in 0u32..101,
            rate_bp in 0u32..1_500,
            term in 0u32..41,
            rent in 0u32..20_000,
            vacancy in 0u32..101,
            management in 0u32..30,
            maintenance in 0u32..30,
            tax in 0u32..30_000,
        ) {
            let assumptions = PropertyAssumptions {
                purchase_price: price as f64,
                down_payment_percent: down_pct as f64,
                interest_rate: rate_bp as f64 / 100.0,
                loan_term_years: term,
                monthly_rent: rent as f64,
                vacancy_rate_percent: vacancy as f64,
                management_fee_percent: management as f64,
                maintenance_percent: maintenance as f64,
                property_tax_yearly: tax as f64,
                ..PropertyAssumptions::default()
            };
            let result = calculate_metrics(&assumptions);
            prop_assert!(result.investment_score <= 100);
            prop_assert_eq!(result.cumulative_profit.len(), 30);
            prop_assert!(result.intrinsic_value >= 0.0);
            prop_assert!(result.monthly_cash_flow.is_finite());
            prop_assert!(result.margin_of_safety.is_finite());
            prop_assert!(result.yearly_amortization.iter().all(|row| row.balance >= 0.0));
            prop_assert_eq!(result.stress_test_pass, result.stress_test_cash_flow > 0.0);
        }
    }
}
