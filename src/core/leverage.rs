use std::collections::BTreeSet;

use super::types::{
    BorrowMode, BuydEvent, BuydInputs, BuydResult, BuydSummary, BuydYear, RuleBreach,
};
use super::{finite_or_zero, non_negative, ratio_or_zero};

/// Ending position of a year; the only thing carried into the next year.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BuydState {
    asset_value: f64,
    debt_balance: f64,
    income_yield_base: f64,
    annual_expenses: f64,
    living_expenses: f64,
    cash_buffer: f64,
}

impl BuydState {
    fn initial(inputs: &BuydInputs) -> Self {
        let living_expenses = non_negative(inputs.living_expenses_per_year);
        Self {
            asset_value: non_negative(inputs.initial_asset_value),
            debt_balance: non_negative(inputs.initial_debt),
            income_yield_base: finite_or_zero(inputs.income_yield_percent) / 100.0,
            annual_expenses: non_negative(inputs.annual_expenses),
            living_expenses,
            cash_buffer: living_expenses / 12.0 * non_negative(inputs.cash_buffer_months),
        }
    }
}

/// A one-off shock hitting a single year.
#[derive(Debug, Clone, Copy)]
struct Shock {
    year: u32,
    percent: f64,
}

impl Shock {
    fn configured(enabled: bool, year: u32, percent: f64) -> Option<Self> {
        enabled.then(|| Self {
            year,
            percent: finite_or_zero(percent).clamp(0.0, 100.0),
        })
    }

    /// Percent applied in `year`, if the shock lands there.
    fn hits(shock: Option<Self>, year: u32) -> Option<f64> {
        shock.filter(|s| s.year == year).map(|s| s.percent)
    }
}

#[derive(Debug, Clone, Copy)]
struct RateSpike {
    start_year: u32,
    increase_percent: f64,
}

impl RateSpike {
    /// Extra rate for `year`: half the increase in the first spike year, all of it afterwards.
    fn extra_rate(&self, year: u32) -> Option<f64> {
        if year < self.start_year {
            return None;
        }
        let years_since_start = (year - self.start_year + 1).min(2);
        Some(self.increase_percent / 100.0 * years_since_start as f64 / 2.0)
    }
}

/// Static per-run configuration with percentages already converted to fractions.
#[derive(Debug, Clone, Copy)]
struct BuydParams {
    growth_rate: f64,
    income_growth_rate: f64,
    expense_growth_rate: f64,
    base_interest_rate: f64,
    target_ltv: f64,
    lender_max_ltv: f64,
    borrow_mode: BorrowMode,
    yearly_spend: f64,
    crash: Option<Shock>,
    income_shock: Option<Shock>,
    expense_shock: Option<Shock>,
    rate_spike: Option<RateSpike>,
}

impl BuydParams {
    fn from_inputs(inputs: &BuydInputs) -> Self {
        let fraction = |percent: f64| finite_or_zero(percent) / 100.0;
        Self {
            growth_rate: fraction(inputs.growth_rate_percent),
            income_growth_rate: fraction(inputs.income_growth_rate_percent),
            expense_growth_rate: fraction(inputs.expense_growth_rate_percent),
            base_interest_rate: fraction(inputs.interest_rate_percent),
            target_ltv: fraction(inputs.target_ltv_percent),
            lender_max_ltv: fraction(inputs.lender_max_ltv_percent),
            borrow_mode: inputs.borrow_mode,
            yearly_spend: non_negative(inputs.yearly_spend),
            crash: Shock::configured(
                inputs.stress_crash_enabled,
                inputs.stress_crash_year,
                inputs.stress_crash_drop_percent,
            ),
            income_shock: Shock::configured(
                inputs.stress_income_shock_enabled,
                inputs.stress_income_shock_year,
                inputs.stress_income_shock_percent,
            ),
            expense_shock: Shock::configured(
                inputs.stress_expense_shock_enabled,
                inputs.stress_expense_shock_year,
                inputs.stress_expense_shock_percent,
            ),
            rate_spike: inputs.stress_rate_spike_enabled.then(|| RateSpike {
                // Years are 1-based.
                start_year: inputs.stress_rate_spike_start_year.max(1),
                increase_percent: non_negative(inputs.stress_rate_spike_increase_percent),
            }),
        }
    }
}

pub fn simulate_buyd(inputs: &BuydInputs) -> BuydResult {
    let params = BuydParams::from_inputs(inputs);
    let horizon = inputs.years.max(1);

    let years: Vec<BuydYear> = (1..=horizon)
        .scan(BuydState::initial(inputs), |state, year| {
            let (next, snapshot) = advance_year(state, year, &params);
            *state = next;
            Some(snapshot)
        })
        .collect();

    let summary = summarize(&years);
    BuydResult { years, summary }
}

fn summarize(years: &[BuydYear]) -> BuydSummary {
    let Some(last) = years.last() else {
        return BuydSummary::default();
    };
    BuydSummary {
        current_net_worth: last.asset_value - last.debt_balance,
        current_ltv: last.ltv,
        current_cash_flow: last.cash_flow,
        current_borrow_capacity: last.borrow_capacity,
        current_dscr: last.dscr,
        current_cash_buffer: last.cash_buffer,
        current_buffer_months: last.buffer_months,
        break_year: years
            .iter()
            .find(|y| !y.rule_breaches.is_empty())
            .map(|y| y.year),
    }
}

/// One year of the simulation. Depends only on the prior ending state and the
/// static stress schedule.
fn advance_year(prior: &BuydState, year: u32, params: &BuydParams) -> (BuydState, BuydYear) {
    let mut events = Vec::new();

    let mut asset_value = (prior.asset_value * (1.0 + params.growth_rate)).max(0.0);
    if let Some(percent) = Shock::hits(params.crash, year) {
        asset_value *= 1.0 - percent / 100.0;
        events.push(BuydEvent::AssetCrash { percent });
    }

    let income_yield_base = prior.income_yield_base * (1.0 + params.income_growth_rate);
    let annual_expenses = (prior.annual_expenses * (1.0 + params.expense_growth_rate)).max(0.0);
    let living_expenses = (prior.living_expenses * (1.0 + params.expense_growth_rate)).max(0.0);

    let mut effective_yield = income_yield_base;
    if let Some(percent) = Shock::hits(params.income_shock, year) {
        effective_yield *= 1.0 - percent / 100.0;
        events.push(BuydEvent::IncomeShock { percent });
    }

    let mut effective_expenses = annual_expenses;
    if let Some(percent) = Shock::hits(params.expense_shock, year) {
        effective_expenses *= 1.0 + percent / 100.0;
        events.push(BuydEvent::ExpenseShock { percent });
    }

    let mut effective_rate = params.base_interest_rate;
    if let Some(spike) = params.rate_spike {
        if let Some(extra) = spike.extra_rate(year) {
            effective_rate += extra;
            if year == spike.start_year {
                events.push(BuydEvent::RateSpike {
                    percent: spike.increase_percent,
                });
            }
        }
    }

    let income = asset_value * effective_yield;
    let interest = prior.debt_balance * effective_rate;
    let cash_flow = income - effective_expenses - interest;

    let borrow_capacity = borrow_capacity(
        asset_value,
        prior.debt_balance,
        params.target_ltv,
        params.lender_max_ltv,
    );
    let borrowed = match params.borrow_mode {
        BorrowMode::MaxSafe => borrow_capacity,
        BorrowMode::Fixed => borrow_capacity.min(params.yearly_spend),
    };
    if borrowed > 0.0 {
        events.push(BuydEvent::Borrowed { amount: borrowed });
    }

    let debt_balance = prior.debt_balance + borrowed;
    let ltv = ratio_or_zero(debt_balance, asset_value);
    let dscr = ratio_or_zero(income, interest);

    let cash_buffer = prior.cash_buffer + cash_flow - living_expenses;
    let buffer_months = ratio_or_zero(cash_buffer, living_expenses / 12.0);

    let mut rule_breaches = BTreeSet::new();
    if ltv > params.lender_max_ltv {
        rule_breaches.insert(RuleBreach::LtvMax);
    }
    // With no interest due there is no debt service to cover.
    if interest > 0.0 && dscr < 1.0 {
        rule_breaches.insert(RuleBreach::DscrLow);
    }
    if cash_buffer < 0.0 {
        rule_breaches.insert(RuleBreach::BufferDepleted);
    }

    let next = BuydState {
        asset_value,
        debt_balance,
        income_yield_base,
        annual_expenses,
        living_expenses,
        cash_buffer,
    };
    let snapshot = BuydYear {
        year,
        asset_value,
        debt_balance,
        ltv,
        cash_flow,
        borrow_capacity,
        borrowed_this_year: borrowed,
        dscr,
        cash_buffer,
        buffer_months,
        rule_breaches,
        events,
    };
    (next, snapshot)
}

fn borrow_capacity(asset_value: f64, debt: f64, target_ltv: f64, lender_max_ltv: f64) -> f64 {
    let to_target = (target_ltv * asset_value - debt).max(0.0);
    let to_lender_cap = (lender_max_ltv * asset_value - debt).max(0.0);
    to_target.min(to_lender_cap)
}
