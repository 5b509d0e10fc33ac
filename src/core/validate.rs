use thiserror::Error;

use super::types::Assumptions;

/// Rejections from the optional strict boundary check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssumptionError {
    #[error("invalid assumption `{field}`: {reason}")]
    InvalidAssumption { field: &'static str, reason: String },
}

impl AssumptionError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidAssumption {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidAssumption { field, .. } => *field,
        }
    }
}

/// Strict-mode check run before evaluation when a caller opts in. The engine
/// itself accepts anything finite; this rejects values that make the snapshot
/// meaningless. Reports the first offending field.
pub fn validate(a: &Assumptions) -> Result<(), AssumptionError> {
    let numeric = [
        ("purchasePrice", a.purchase_price),
        ("marketValue", a.market_value),
        ("downPaymentPercent", a.down_payment_percent),
        ("interestRate", a.interest_rate),
        ("loanTermYears", a.loan_term_years),
        ("monthlyRent", a.monthly_rent),
        ("vacancyRate", a.vacancy_rate),
        ("managementFee", a.management_fee),
        ("maintenanceRate", a.maintenance_rate),
        ("propertyTaxRate", a.property_tax_rate),
        ("insuranceRate", a.insurance_rate),
        ("appreciationRate", a.appreciation_rate),
        ("buildingValuePercent", a.building_value_percent),
        ("marginalTaxRate", a.marginal_tax_rate),
        ("capitalGainsRate", a.capital_gains_rate),
        ("stockReturnRate", a.stock_return_rate),
        ("bondYieldRate", a.bond_yield_rate),
        ("sellingCostPercent", a.selling_cost_percent),
        ("armFixedPeriod", a.arm_fixed_period),
        ("armIndex", a.arm_index),
        ("armMargin", a.arm_margin),
        ("armPeriodicCap", a.arm_periodic_cap),
        ("armLifetimeCap", a.arm_lifetime_cap),
    ];
    for (field, value) in numeric {
        if !value.is_finite() {
            return Err(AssumptionError::invalid(field, "must be a finite number"));
        }
    }

    for (field, value) in [
        ("purchasePrice", a.purchase_price),
        ("marketValue", a.market_value),
        ("monthlyRent", a.monthly_rent),
        ("interestRate", a.interest_rate),
    ] {
        if value < 0.0 {
            return Err(AssumptionError::invalid(field, "must be >= 0"));
        }
    }

    for (field, value) in [
        ("downPaymentPercent", a.down_payment_percent),
        ("vacancyRate", a.vacancy_rate),
        ("managementFee", a.management_fee),
        ("maintenanceRate", a.maintenance_rate),
        ("propertyTaxRate", a.property_tax_rate),
        ("insuranceRate", a.insurance_rate),
        ("buildingValuePercent", a.building_value_percent),
        ("marginalTaxRate", a.marginal_tax_rate),
        ("capitalGainsRate", a.capital_gains_rate),
        ("sellingCostPercent", a.selling_cost_percent),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(AssumptionError::invalid(field, "must be between 0 and 100"));
        }
    }

    if a.loan_term_years <= 0.0 {
        return Err(AssumptionError::invalid("loanTermYears", "must be > 0"));
    }
    if a.loan_term_years.fract() != 0.0 {
        return Err(AssumptionError::invalid("loanTermYears", "must be whole years"));
    }

    Ok(())
}
