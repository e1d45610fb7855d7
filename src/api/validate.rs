use super::error::{ApiError, Result};
use crate::core::{BuydInputs, DebtPayoffParams, PropertyAssumptions};

pub const MAX_LOAN_TERM_YEARS: u32 = 100;
pub const MAX_BUYD_YEARS: u32 = 100;
pub const MAX_PAYOFF_MONTHS: u32 = 1_200;

fn bad_request(msg: String) -> Result<()> {
    Err(ApiError::BadRequest(msg))
}

pub fn validate_loan_term(term_years: u32) -> Result<()> {
    if term_years > MAX_LOAN_TERM_YEARS {
        return bad_request(format!(
            "termYears must be <= {MAX_LOAN_TERM_YEARS}, got {term_years}"
        ));
    }
    Ok(())
}

pub fn validate_property(assumptions: &PropertyAssumptions) -> Result<()> {
    if assumptions.loan_term_years > MAX_LOAN_TERM_YEARS {
        return bad_request(format!(
            "loanTermYears must be <= {MAX_LOAN_TERM_YEARS}, got {}",
            assumptions.loan_term_years
        ));
    }
    Ok(())
}

pub fn validate_buyd(inputs: &BuydInputs) -> Result<()> {
    if inputs.years > MAX_BUYD_YEARS {
        return bad_request(format!(
            "years must be <= {MAX_BUYD_YEARS}, got {}",
            inputs.years
        ));
    }
    Ok(())
}

pub fn validate_debt(params: &DebtPayoffParams) -> Result<()> {
    if let Some(max_months) = params.max_months {
        if max_months > MAX_PAYOFF_MONTHS {
            return bad_request(format!(
                "maxMonths must be <= {MAX_PAYOFF_MONTHS}, got {max_months}"
            ));
        }
    }
    Ok(())
}
