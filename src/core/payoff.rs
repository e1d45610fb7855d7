use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::finite_or_zero;
use super::types::{
    DEFAULT_MAX_MONTHS, DebtInput, DebtPayoffParams, DebtPayoffRow, DebtPayoffSummary,
    DebtSimulationResult, DebtStrategy, PriorityParams,
};

/// A balance at or below this is treated as settled.
const PAID_OFF_EPSILON: f64 = 0.01;

#[derive(Debug, Clone)]
struct WorkingDebt {
    id: String,
    name: String,
    balance: f64,
    apr: f64,
    min_payment: f64,
    interest_paid: f64,
}

impl WorkingDebt {
    fn from_input(debt: &DebtInput) -> Self {
        Self {
            id: debt.id.clone(),
            name: debt.name.clone(),
            balance: finite_or_zero(debt.balance),
            apr: finite_or_zero(debt.apr),
            min_payment: finite_or_zero(debt.min_payment).max(0.0),
            interest_paid: 0.0,
        }
    }

    fn summary(&self, months_to_payoff: u32) -> DebtPayoffSummary {
        DebtPayoffSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            months_to_payoff,
            interest_paid: self.interest_paid,
        }
    }
}

fn by_apr_desc(a: (f64, f64), b: (f64, f64)) -> Ordering {
    b.0.total_cmp(&a.0)
}

/// Priority order over `(apr, balance)` keys, returned as indices into `keys`.
///
/// Sorting is stable, so fully tied debts keep their input order.
fn priority_indices(
    keys: &[(f64, f64)],
    strategy: DebtStrategy,
    hybrid_threshold: f64,
) -> Vec<usize> {
    let avalanche = |a: &usize, b: &usize| {
        by_apr_desc(keys[*a], keys[*b]).then_with(|| keys[*b].1.total_cmp(&keys[*a].1))
    };
    let snowball = |a: &usize, b: &usize| {
        keys[*a]
            .1
            .total_cmp(&keys[*b].1)
            .then_with(|| by_apr_desc(keys[*a], keys[*b]))
    };
    let hybrid = |a: &usize, b: &usize| {
        by_apr_desc(keys[*a], keys[*b]).then_with(|| keys[*a].1.total_cmp(&keys[*b].1))
    };

    let mut order: Vec<usize> = (0..keys.len()).collect();
    match strategy {
        DebtStrategy::Avalanche => order.sort_by(avalanche),
        DebtStrategy::Snowball => order.sort_by(snowball),
        DebtStrategy::Hybrid => {
            let (mut priority, mut rest): (Vec<usize>, Vec<usize>) =
                order.into_iter().partition(|&i| keys[i].0 >= hybrid_threshold);
            if priority.is_empty() {
                rest.sort_by(snowball);
                return rest;
            }
            priority.sort_by(hybrid);
            rest.sort_by(hybrid);
            priority.extend(rest);
            order = priority;
        }
    }
    order
}

/// Debts in the order extra payments would be routed to them.
pub fn priority_order(params: &PriorityParams) -> Vec<DebtInput> {
    let keys: Vec<(f64, f64)> = params
        .debts
        .iter()
        .map(|d| (finite_or_zero(d.apr), finite_or_zero(d.balance)))
        .collect();
    priority_indices(&keys, params.strategy, finite_or_zero(params.hybrid_threshold))
        .into_iter()
        .map(|i| params.debts[i].clone())
        .collect()
}

pub fn simulate_debt_payoff(params: &DebtPayoffParams) -> DebtSimulationResult {
    let max_months = params.max_months.unwrap_or(DEFAULT_MAX_MONTHS);
    let hybrid_threshold = finite_or_zero(params.hybrid_threshold);
    let monthly_budget = finite_or_zero(params.extra_payment).max(0.0)
        + params
            .debts
            .iter()
            .map(|d| finite_or_zero(d.min_payment).max(0.0))
            .sum::<f64>();

    let mut active: Vec<WorkingDebt> = params
        .debts
        .iter()
        .filter(|d| d.balance > 0.0)
        .map(WorkingDebt::from_input)
        .collect();
    let mut settled: Vec<DebtPayoffSummary> = Vec::new();
    let mut schedule: Vec<DebtPayoffRow> = Vec::new();
    let mut total_interest_paid = 0.0;

    for month in 1..=max_months {
        if active.is_empty() {
            break;
        }

        let mut interest_this_month = 0.0;
        for debt in &mut active {
            let interest = debt.balance * debt.apr / 100.0 / 12.0;
            debt.balance += interest;
            debt.interest_paid += interest;
            interest_this_month += interest;
        }
        total_interest_paid += interest_this_month;

        let mut minimums_paid = 0.0;
        for debt in &mut active {
            let payment = debt.min_payment.min(debt.balance).max(0.0);
            debt.balance -= payment;
            minimums_paid += payment;
        }

        let mut leftover = (monthly_budget - minimums_paid).max(0.0);
        let keys: Vec<(f64, f64)> = active.iter().map(|d| (d.apr, d.balance)).collect();
        for index in priority_indices(&keys, params.strategy, hybrid_threshold) {
            if leftover <= 0.0 {
                break;
            }
            let debt = &mut active[index];
            let payment = leftover.min(debt.balance).max(0.0);
            debt.balance -= payment;
            leftover -= payment;
        }

        let (paid_off, still_open): (Vec<WorkingDebt>, Vec<WorkingDebt>) = active
            .into_iter()
            .partition(|d| d.balance <= PAID_OFF_EPSILON);
        active = still_open;
        for debt in &paid_off {
            if !settled.iter().any(|s| s.id == debt.id) {
                settled.push(debt.summary(month));
            }
        }

        schedule.push(DebtPayoffRow {
            month,
            total_balance: active.iter().map(|d| d.balance).sum(),
            total_interest_paid,
            interest_this_month,
            balances: balances_by_id(&params.debts, &active),
        });
    }

    let total_months = schedule.len() as u32;
    let payoff_summaries = settled
        .into_iter()
        .chain(active.iter().map(|d| d.summary(total_months)))
        .collect();

    DebtSimulationResult {
        schedule,
        payoff_summaries,
        total_interest_paid,
        total_months,
    }
}

/// Remaining balance for every originally supplied id; settled debts report 0.
fn balances_by_id(original: &[DebtInput], active: &[WorkingDebt]) -> BTreeMap<String, f64> {
    original
        .iter()
        .map(|debt| {
            let balance = active
                .iter()
                .find(|d| d.id == debt.id)
                .map_or(0.0, |d| d.balance.max(0.0));
            (debt.id.clone(), balance)
        })
        .collect()
}
