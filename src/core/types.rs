use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationYear {
    pub year: u32,
    pub balance: f64,
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub total_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Amortization {
    pub monthly_payment: f64,
    pub yearly_schedule: Vec<AmortizationYear>,
}

/// Property purchase, financing, income and expense inputs.
///
/// Percent fields are raw percentages (`6.5` means 6.5 %).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyAssumptions {
    pub purchase_price: f64,
    pub renovation_cost: f64,
    pub closing_costs: f64,
    pub down_payment_percent: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub monthly_rent: f64,
    pub other_monthly_income: f64,
    pub vacancy_rate_percent: f64,
    pub management_fee_percent: f64,
    pub property_tax_yearly: f64,
    pub insurance_yearly: f64,
    pub hoa_monthly: f64,
    pub utilities_monthly: f64,
    pub maintenance_percent: f64,
    pub other_monthly_expenses: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum InvestmentGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl InvestmentGrade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => InvestmentGrade::APlus,
            80..=89 => InvestmentGrade::A,
            70..=79 => InvestmentGrade::B,
            60..=69 => InvestmentGrade::C,
            50..=59 => InvestmentGrade::D,
            _ => InvestmentGrade::F,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitYear {
    pub year: u32,
    pub cumulative_cash_flow: f64,
    pub equity: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub monthly_mortgage: f64,
    pub monthly_principal: f64,
    pub monthly_interest: f64,
    pub total_monthly_expenses: f64,
    #[serde(rename = "monthlyNOI")]
    pub monthly_noi: f64,
    pub monthly_cash_flow: f64,
    pub owner_earnings_monthly: f64,
    pub owner_earnings_annual: f64,
    pub earnings_yield: f64,
    pub intrinsic_value: f64,
    pub margin_of_safety: f64,
    pub stress_test_cash_flow: f64,
    pub stress_test_pass: bool,
    pub cap_rate: f64,
    pub cash_on_cash: f64,
    pub investment_score: u32,
    pub investment_grade: InvestmentGrade,
    pub total_initial_cash: f64,
    pub yearly_amortization: Vec<AmortizationYear>,
    pub cumulative_profit: Vec<ProfitYear>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorrowMode {
    /// Borrow `min(capacity, yearly_spend)`.
    #[default]
    Fixed,
    /// Borrow the whole capacity every year.
    MaxSafe,
}

/// Configuration of one "buy, borrow, die" run. Percent fields are raw percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuydInputs {
    pub initial_asset_value: f64,
    pub growth_rate_percent: f64,
    pub income_yield_percent: f64,
    pub income_growth_rate_percent: f64,
    pub annual_expenses: f64,
    pub expense_growth_rate_percent: f64,
    pub initial_debt: f64,
    pub interest_rate_percent: f64,
    pub target_ltv_percent: f64,
    pub lender_max_ltv_percent: f64,
    pub borrow_mode: BorrowMode,
    pub yearly_spend: f64,
    pub living_expenses_per_year: f64,
    pub cash_buffer_months: f64,
    pub years: u32,
    pub stress_crash_enabled: bool,
    pub stress_crash_year: u32,
    pub stress_crash_drop_percent: f64,
    pub stress_rate_spike_enabled: bool,
    pub stress_rate_spike_start_year: u32,
    pub stress_rate_spike_increase_percent: f64,
    pub stress_income_shock_enabled: bool,
    pub stress_income_shock_year: u32,
    pub stress_income_shock_percent: f64,
    pub stress_expense_shock_enabled: bool,
    pub stress_expense_shock_year: u32,
    pub stress_expense_shock_percent: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleBreach {
    LtvMax,
    DscrLow,
    BufferDepleted,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BuydEvent {
    Borrowed { amount: f64 },
    AssetCrash { percent: f64 },
    RateSpike { percent: f64 },
    IncomeShock { percent: f64 },
    ExpenseShock { percent: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuydYear {
    pub year: u32,
    pub asset_value: f64,
    pub debt_balance: f64,
    pub ltv: f64,
    pub cash_flow: f64,
    pub borrow_capacity: f64,
    pub borrowed_this_year: f64,
    pub dscr: f64,
    pub cash_buffer: f64,
    pub buffer_months: f64,
    pub rule_breaches: BTreeSet<RuleBreach>,
    pub events: Vec<BuydEvent>,
}

/// Terminal position of a BUYD run; this is what gets persisted for list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuydSummary {
    pub current_net_worth: f64,
    pub current_ltv: f64,
    pub current_cash_flow: f64,
    pub current_borrow_capacity: f64,
    pub current_dscr: f64,
    pub current_cash_buffer: f64,
    pub current_buffer_months: f64,
    pub break_year: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuydResult {
    pub years: Vec<BuydYear>,
    #[serde(flatten)]
    pub summary: BuydSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebtInput {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub apr: f64,
    pub min_payment: f64,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStrategy {
    #[default]
    Avalanche,
    Snowball,
    Hybrid,
}

pub const DEFAULT_MAX_MONTHS: u32 = 600;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebtPayoffParams {
    pub debts: Vec<DebtInput>,
    pub extra_payment: f64,
    pub strategy: DebtStrategy,
    pub hybrid_threshold: f64,
    pub max_months: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriorityParams {
    pub debts: Vec<DebtInput>,
    pub strategy: DebtStrategy,
    pub hybrid_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoffRow {
    pub month: u32,
    pub total_balance: f64,
    pub total_interest_paid: f64,
    pub interest_this_month: f64,
    pub balances: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoffSummary {
    pub id: String,
    pub name: String,
    pub months_to_payoff: u32,
    pub interest_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSimulationResult {
    pub schedule: Vec<DebtPayoffRow>,
    pub payoff_summaries: Vec<DebtPayoffSummary>,
    pub total_interest_paid: f64,
    pub total_months: u32,
}
