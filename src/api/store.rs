use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::error::{ApiError, Result};
use super::validate::{validate_buyd, validate_debt, validate_property};
use crate::core::{
    BuydInputs, BuydSummary, DebtPayoffParams, DebtPayoffSummary, InvestmentGrade,
    PropertyAssumptions, calculate_metrics, simulate_buyd, simulate_debt_payoff,
};

/// Inputs of one calculator run, tagged by calculator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "inputs", rename_all = "camelCase")]
pub enum CalculatorInputs {
    Property(PropertyAssumptions),
    Buyd(BuydInputs),
    Debt(DebtPayoffParams),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub monthly_cash_flow: f64,
    pub cap_rate: f64,
    pub cash_on_cash: f64,
    pub intrinsic_value: f64,
    pub investment_score: u32,
    pub investment_grade: InvestmentGrade,
    pub stress_test_pass: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSummary {
    pub total_months: u32,
    pub total_interest_paid: f64,
    pub payoff_summaries: Vec<DebtPayoffSummary>,
}

/// Terminal figures kept alongside saved inputs; never a time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScenarioSummary {
    Property(PropertySummary),
    Buyd(BuydSummary),
    Debt(DebtSummary),
}

impl CalculatorInputs {
    /// Rejects inputs whose simulation horizon is out of range.
    pub fn validate(&self) -> Result<()> {
        match self {
            CalculatorInputs::Property(assumptions) => validate_property(assumptions),
            CalculatorInputs::Buyd(inputs) => validate_buyd(inputs),
            CalculatorInputs::Debt(params) => validate_debt(params),
        }
    }
}

impl ScenarioSummary {
    pub fn compute(inputs: &CalculatorInputs) -> Self {
        match inputs {
            CalculatorInputs::Property(assumptions) => {
                let result = calculate_metrics(assumptions);
                ScenarioSummary::Property(PropertySummary {
                    monthly_cash_flow: result.monthly_cash_flow,
                    cap_rate: result.cap_rate,
                    cash_on_cash: result.cash_on_cash,
                    intrinsic_value: result.intrinsic_value,
                    investment_score: result.investment_score,
                    investment_grade: result.investment_grade,
                    stress_test_pass: result.stress_test_pass,
                })
            }
            CalculatorInputs::Buyd(inputs) => ScenarioSummary::Buyd(simulate_buyd(inputs).summary),
            CalculatorInputs::Debt(params) => {
                let result = simulate_debt_payoff(params);
                ScenarioSummary::Debt(DebtSummary {
                    total_months: result.total_months,
                    total_interest_paid: result.total_interest_paid,
                    payoff_summaries: result.payoff_summaries,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScenario {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub calculator: CalculatorInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScenario {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub calculator: CalculatorInputs,
    pub summary: ScenarioSummary,
}

/// Saved calculator runs, listed newest first.
pub trait ScenarioStore: Send + Sync {
    fn create(&self, scenario: NewScenario) -> Result<SavedScenario>;
    fn list(&self) -> Result<Vec<SavedScenario>>;
    fn get(&self, id: u64) -> Result<Option<SavedScenario>>;
    /// Returns whether a scenario was removed.
    fn delete(&self, id: u64) -> Result<bool>;
}

#[derive(Debug, Default)]
struct StoreInner {
    next_id: u64,
    scenarios: Vec<SavedScenario>,
}

#[derive(Debug, Default)]
pub struct InMemoryScenarioStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> ApiError {
    ApiError::Internal("scenario store lock poisoned".to_string())
}

impl ScenarioStore for InMemoryScenarioStore {
    fn create(&self, scenario: NewScenario) -> Result<SavedScenario> {
        let title = scenario.title.trim();
        if title.is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".to_string()));
        }
        scenario.calculator.validate()?;
        let summary = ScenarioSummary::compute(&scenario.calculator);

        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.next_id += 1;
        let saved = SavedScenario {
            id: inner.next_id,
            title: title.to_string(),
            description: scenario.description,
            calculator: scenario.calculator,
            summary,
        };
        inner.scenarios.push(saved.clone());
        Ok(saved)
    }

    fn list(&self) -> Result<Vec<SavedScenario>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.scenarios.iter().rev().cloned().collect())
    }

    fn get(&self, id: u64) -> Result<Option<SavedScenario>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.scenarios.iter().find(|s| s.id == id).cloned())
    }

    fn delete(&self, id: u64) -> Result<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let before = inner.scenarios.len();
        inner.scenarios.retain(|s| s.id != id);
        Ok(inner.scenarios.len() != before)
    }
}

/// The sample analysis a fresh server starts with.
pub fn sample_property() -> NewScenario {
    NewScenario {
        title: "Sample Investment: San Juan Condo".to_string(),
        description: Some("2BR/1BA apartment in Santurce".to_string()),
        calculator: CalculatorInputs::Property(PropertyAssumptions {
            purchase_price: 250_000.0,
            renovation_cost: 15_000.0,
            closing_costs: 5_000.0,
            down_payment_percent: 20.0,
            interest_rate: 6.5,
            loan_term_years: 30,
            monthly_rent: 2_200.0,
            vacancy_rate_percent: 5.0,
            management_fee_percent: 10.0,
            property_tax_yearly: 800.0,
            insurance_yearly: 1_200.0,
            hoa_monthly: 150.0,
            maintenance_percent: 5.0,
            ..PropertyAssumptions::default()
        }),
    }
}

/// Seeds `store` with [`sample_property`] when it holds nothing yet.
pub fn seed_if_empty(store: &dyn ScenarioStore) -> Result<Option<SavedScenario>> {
    if !store.list()?.is_empty() {
        return Ok(None);
    }
    store.create(sample_property()).map(Some)
}
