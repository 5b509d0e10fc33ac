use serde::{Deserialize, Serialize};

/// Economic inputs for one hold-versus-sell evaluation.
///
/// Every rate or percent field is a whole-number percentage (`3.25` means
/// 3.25%). No range checks happen here; see [`crate::core::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Assumptions {
    pub purchase_price: f64,
    pub market_value: f64,
    pub down_payment_percent: f64,
    pub interest_rate: f64,
    pub loan_term_years: f64,
    pub monthly_rent: f64,

    pub vacancy_rate: f64,
    pub management_fee: f64,
    pub maintenance_rate: f64,
    pub property_tax_rate: f64,
    pub insurance_rate: f64,

    pub appreciation_rate: f64,
    pub building_value_percent: f64,
    pub marginal_tax_rate: f64,
    pub capital_gains_rate: f64,

    pub stock_return_rate: f64,
    pub bond_yield_rate: f64,
    pub selling_cost_percent: f64,

    #[serde(rename = "isARM")]
    pub is_arm: bool,
    pub arm_fixed_period: f64,
    pub arm_index: f64,
    pub arm_margin: f64,
    pub arm_periodic_cap: f64,
    pub arm_lifetime_cap: f64,
}

pub const DEFAULT_ASSUMPTIONS: Assumptions = Assumptions {
    purchase_price: 450_000.0,
    market_value: 520_000.0,
    down_payment_percent: 20.0,
    interest_rate: 3.25,
    loan_term_years: 30.0,
    monthly_rent: 3_200.0,

    vacancy_rate: 5.0,
    management_fee: 8.0,
    maintenance_rate: 1.0,
    property_tax_rate: 1.2,
    insurance_rate: 0.5,

    appreciation_rate: 2.0,
    building_value_percent: 80.0,
    marginal_tax_rate: 32.0,
    capital_gains_rate: 15.0,

    stock_return_rate: 8.0,
    bond_yield_rate: 4.5,
    selling_cost_percent: 6.0,

    is_arm: false,
    arm_fixed_period: 5.0,
    arm_index: 4.5,
    arm_margin: 2.25,
    arm_periodic_cap: 2.0,
    arm_lifetime_cap: 5.0,
};

impl Default for Assumptions {
    fn default() -> Self {
        DEFAULT_ASSUMPTIONS
    }
}

/// Single-year snapshot derived from [`Assumptions`]. All monthly unless the
/// field name says otherwise; ROE fields are annual percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialResult {
    pub loan_amount: f64,
    #[serde(rename = "monthlyPI")]
    pub monthly_pi: f64,
    pub interest_payment: f64,
    pub principal_payment: f64,

    pub total_operating_expenses: f64,
    pub monthly_cash_flow: f64,
    pub monthly_depreciation: f64,
    pub annual_depreciation: f64,
    pub taxable_income: f64,
    pub monthly_tax_liability: f64,
    pub after_tax_cash_flow: f64,

    pub monthly_appreciation: f64,
    pub total_monthly_return: f64,

    pub selling_costs: f64,
    pub net_proceeds: f64,

    #[serde(rename = "rentalROE")]
    pub rental_roe: f64,
    pub monthly_stock_return: f64,
    #[serde(rename = "stockROE")]
    pub stock_roe: f64,
    pub monthly_bond_return: f64,
    #[serde(rename = "bondROE")]
    pub bond_roe: f64,
    pub leverage_ratio: f64,
    pub tax_shield_percentage: f64,
}
