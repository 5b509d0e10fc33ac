use super::types::{Assumptions, FinancialResult};

/// Straight-line recovery period for residential rental structures.
pub const DEPRECIATION_RECOVERY_YEARS: f64 = 27.5;

/// Converts one set of assumptions into the full hold-versus-sell snapshot.
///
/// Total for finite input: degenerate values (zero rate, zero equity, negative
/// cash flow) produce defined numbers through explicit guards instead of
/// panicking. Interest and principal are first-month figures; the loan
/// balance is not amortized forward.
pub fn evaluate(a: &Assumptions) -> FinancialResult {
    let loan_amount = a.purchase_price * (1.0 - a.down_payment_percent / 100.0);
    let monthly_rate = monthly_rate(a.interest_rate);
    let num_payments = a.loan_term_years * 12.0;
    let monthly_pi = monthly_payment(loan_amount, a.interest_rate, num_payments);

    let vacancy_cost = a.monthly_rent * (a.vacancy_rate / 100.0);
    let management_cost = a.monthly_rent * (a.management_fee / 100.0);
    let property_tax = annual_percent_monthly(a.market_value, a.property_tax_rate);
    let insurance = annual_percent_monthly(a.market_value, a.insurance_rate);
    let maintenance = annual_percent_monthly(a.market_value, a.maintenance_rate);
    let total_operating_expenses =
        vacancy_cost + management_cost + property_tax + insurance + maintenance;

    let interest_payment = loan_amount * monthly_rate;
    let principal_payment = monthly_pi - interest_payment;
    let monthly_cash_flow = a.monthly_rent - total_operating_expenses - monthly_pi;

    let monthly_appreciation = annual_percent_monthly(a.market_value, a.appreciation_rate);

    let depreciation_basis = a.purchase_price * (a.building_value_percent / 100.0);
    let annual_depreciation = depreciation_basis / DEPRECIATION_RECOVERY_YEARS;
    let monthly_depreciation = annual_depreciation / 12.0;

    // Paper P&L: only the interest half of P&I is deductible.
    let taxable_income =
        a.monthly_rent - total_operating_expenses - interest_payment - monthly_depreciation;
    // Losses are not carried forward or offset against other income.
    let monthly_tax_liability = if taxable_income > 0.0 {
        taxable_income * (a.marginal_tax_rate / 100.0)
    } else {
        0.0
    };
    let after_tax_cash_flow = monthly_cash_flow - monthly_tax_liability;
    let total_monthly_return = after_tax_cash_flow + principal_payment + monthly_appreciation;

    let selling_costs = a.market_value * (a.selling_cost_percent / 100.0);
    let gross_equity = a.market_value - loan_amount;
    let net_proceeds = (gross_equity - selling_costs).max(0.0);
    let equity_base = nonzero_or_one(net_proceeds);

    let rental_roe = (total_monthly_return * 12.0) / equity_base * 100.0;
    let monthly_stock_return = annual_percent_monthly(net_proceeds, a.stock_return_rate);
    let monthly_bond_return = annual_percent_monthly(net_proceeds, a.bond_yield_rate);
    let leverage_ratio = a.market_value / equity_base;

    let tax_shield_percentage = if monthly_cash_flow > 0.0 {
        (monthly_depreciation / monthly_cash_flow * 100.0).min(100.0)
    } else {
        0.0
    };

    FinancialResult {
        loan_amount,
        monthly_pi,
        interest_payment,
        principal_payment,
        total_operating_expenses,
        monthly_cash_flow,
        monthly_depreciation,
        annual_depreciation,
        taxable_income,
        monthly_tax_liability,
        after_tax_cash_flow,
        monthly_appreciation,
        total_monthly_return,
        selling_costs,
        net_proceeds,
        rental_roe,
        monthly_stock_return,
        stock_roe: a.stock_return_rate,
        monthly_bond_return,
        bond_roe: a.bond_yield_rate,
        leverage_ratio,
        tax_shield_percentage,
    }
}

/// Fixed-rate principal-and-interest payment. A zero rate degenerates to
/// straight-line repayment.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, num_payments: f64) -> f64 {
    let r = monthly_rate(annual_rate_percent);
    if r == 0.0 {
        return principal / num_payments;
    }
    let growth = (1.0 + r).powf(num_payments);
    principal * (r * growth) / (growth - 1.0)
}

pub(crate) fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

fn annual_percent_monthly(base: f64, annual_percent: f64) -> f64 {
    base * (annual_percent / 100.0) / 12.0
}

// The ROE and leverage denominators substitute 1 when there is no equity to
// redeploy, so those two figures are raw dollar ratios in that corner.
fn nonzero_or_one(value: f64) -> f64 {
    if value == 0.0 { 1.0 } else { value }
}

/// Memoizes the most recent evaluation, keyed on the whole assumptions value.
#[derive(Debug, Default)]
pub struct Evaluator {
    last: Option<(Assumptions, FinancialResult)>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next `evaluate` with these inputs will be served from cache.
    pub fn is_cached(&self, assumptions: &Assumptions) -> bool {
        matches!(&self.last, Some((cached_inputs, _)) if cached_inputs == assumptions)
    }

    pub fn evaluate(&mut self, assumptions: &Assumptions) -> FinancialResult {
        if let Some((cached_inputs, cached_result)) = &self.last {
            if cached_inputs == assumptions {
                log::debug!("reusing cached evaluation");
                return *cached_result;
            }
        }
        let result = evaluate(assumptions);
        self.last = Some((*assumptions, result));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_ASSUMPTIONS;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> Assumptions {
        DEFAULT_ASSUMPTIONS
    }

    #[test]
    fn loan_amount_and_payment_follow_annuity_identity() {
        let result = evaluate(&sample_inputs());
        assert_approx(result.loan_amount, 360_000.0);
        assert_approx_tol(result.monthly_pi, 1_566.742_748_660_577, 1e-6);

        // Present value of the payment stream must reproduce the principal.
        let r: f64 = 3.25 / 100.0 / 12.0;
        let n: f64 = 360.0;
        let pv = result.monthly_pi * (1.0 - (1.0 + r).powf(-n)) / r;
        assert_approx_tol(pv, result.loan_amount, 1e-4);
    }

    #[test]
    fn zero_rate_payment_is_straight_line() {
        let mut inputs = sample_inputs();
        inputs.interest_rate = 0.0;
        let result = evaluate(&inputs);
        assert_eq!(result.monthly_pi, result.loan_amount / 360.0);
        assert_eq!(result.interest_payment, 0.0);
        assert_eq!(result.principal_payment, result.monthly_pi);
    }

    #[test]
    fn degenerate_loan_terms_still_evaluate() {
        let mut inputs = sample_inputs();
        inputs.loan_term_years = -5.0;
        let negative = evaluate(&inputs);
        assert!(negative.monthly_pi.is_finite());
        assert!(negative.monthly_pi < 0.0);
        assert!(negative.rental_roe.is_finite());

        inputs.loan_term_years = 2.5;
        let fractional = evaluate(&inputs);
        let expected = monthly_payment(360_000.0, 3.25, 30.0);
        assert_approx(fractional.monthly_pi, expected);

        inputs.loan_term_years = 0.0;
        let zero = evaluate(&inputs);
        assert!(zero.monthly_pi.is_infinite());
        assert_approx(zero.net_proceeds, 128_800.0);
    }

    #[test]
    fn default_scenario_matches_recorded_fixture() {
        let result = evaluate(&DEFAULT_ASSUMPTIONS);

        assert_approx(result.total_operating_expenses, 1_586.0);
        assert_approx(result.interest_payment, 975.0);
        assert_approx(result.principal_payment, 591.742_748_660_577);
        assert_approx(result.monthly_cash_flow, 47.257_251_339_422_7);
        assert_approx(result.monthly_depreciation, 1_090.909_090_909_091);
        assert_approx(result.annual_depreciation, 13_090.909_090_909_09);
        assert_approx(result.taxable_income, -451.909_090_909_091);
        assert_eq!(result.monthly_tax_liability, 0.0);
        assert_approx(result.after_tax_cash_flow, 47.257_251_339_422_7);
        assert_approx(result.monthly_appreciation, 866.666_666_666_667);
        assert_approx(result.total_monthly_return, 1_505.666_666_666_667);
        assert_approx(result.selling_costs, 31_200.0);
        assert_approx(result.net_proceeds, 128_800.0);
        assert_approx(result.rental_roe, 14.027_950_310_559);
        assert_approx(result.monthly_stock_return, 858.666_666_666_667);
        assert_approx(result.monthly_bond_return, 483.0);
        assert_approx(result.leverage_ratio, 4.037_267_080_745_342);
        assert_approx(result.tax_shield_percentage, 100.0);
        assert_eq!(result.stock_roe, 8.0);
        assert_eq!(result.bond_roe, 4.5);
    }

    #[test]
    fn positive_taxable_income_is_taxed_at_marginal_rate() {
        let mut inputs = sample_inputs();
        inputs.monthly_rent = 6_000.0;
        let result = evaluate(&inputs);
        assert!(result.taxable_income > 0.0);
        assert_approx(result.monthly_tax_liability, result.taxable_income * 0.32);
        assert_approx(
            result.after_tax_cash_flow,
            result.monthly_cash_flow - result.monthly_tax_liability,
        );
    }

    #[test]
    fn underwater_sale_floors_net_proceeds_and_guards_ratios() {
        let mut inputs = sample_inputs();
        inputs.market_value = 370_000.0;
        let result = evaluate(&inputs);
        assert_eq!(result.net_proceeds, 0.0);
        assert_approx(result.leverage_ratio, 370_000.0);
        assert_approx(result.rental_roe, result.total_monthly_return * 12.0 * 100.0);
        assert_eq!(result.monthly_stock_return, 0.0);
        assert_eq!(result.monthly_bond_return, 0.0);
    }

    #[test]
    fn negative_cash_flow_has_no_tax_shield() {
        let mut inputs = sample_inputs();
        inputs.monthly_rent = 1_000.0;
        let result = evaluate(&inputs);
        assert!(result.monthly_cash_flow < 0.0);
        assert_eq!(result.tax_shield_percentage, 0.0);
    }

    #[test]
    fn arm_fields_do_not_change_the_snapshot() {
        let mut inputs = sample_inputs();
        let baseline = evaluate(&inputs);
        inputs.is_arm = true;
        inputs.arm_index = 9.0;
        inputs.arm_margin = 3.0;
        assert_eq!(evaluate(&inputs), baseline);
    }

    #[test]
    fn evaluator_recomputes_only_when_assumptions_change() {
        let mut evaluator = Evaluator::new();
        let mut inputs = sample_inputs();
        assert!(!evaluator.is_cached(&inputs));
        let first = evaluator.evaluate(&inputs);
        assert!(evaluator.is_cached(&inputs));
        assert_eq!(evaluator.evaluate(&inputs), first);

        inputs.monthly_rent += 100.0;
        assert!(!evaluator.is_cached(&inputs));
        let second = evaluator.evaluate(&inputs);
        assert_eq!(second, evaluate(&inputs));
        assert!(second.monthly_cash_flow > first.monthly_cash_flow);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_core_invariants_hold_for_arbitrary_inputs(
            purchase_price in 0u32..2_000_000,
            market_value in 0u32..3_000_000,
            down_payment_bp in 0u32..10_001,
            rate_bp in 0u32..1_500,
            term_years in 1u32..41,
            rent in 0u32..20_000,
            vacancy_bp in 0u32..5_000,
            management_bp in 0u32..3_000,
            maintenance_bp in 0u32..500,
            property_tax_bp in 0u32..500,
            insurance_bp in 0u32..300,
            appreciation_bp in -500i32..1_500,
            building_bp in 0u32..10_001,
            tax_bp in 0u32..6_000,
            selling_bp in 0u32..2_000
        ) {
            let mut inputs = sample_inputs();
            inputs.purchase_price = purchase_price as f64;
            inputs.market_value = market_value as f64;
            inputs.down_payment_percent = down_payment_bp as f64 / 100.0;
            inputs.interest_rate = rate_bp as f64 / 100.0;
            inputs.loan_term_years = term_years as f64;
            inputs.monthly_rent = rent as f64;
            inputs.vacancy_rate = vacancy_bp as f64 / 100.0;
            inputs.management_fee = management_bp as f64 / 100.0;
            inputs.maintenance_rate = maintenance_bp as f64 / 100.0;
            inputs.property_tax_rate = property_tax_bp as f64 / 100.0;
            inputs.insurance_rate = insurance_bp as f64 / 100.0;
            inputs.appreciation_rate = appreciation_bp as f64 / 100.0;
            inputs.building_value_percent = building_bp as f64 / 100.0;
            inputs.marginal_tax_rate = tax_bp as f64 / 100.0;
            inputs.selling_cost_percent = selling_bp as f64 / 100.0;

            let result = evaluate(&inputs);

            prop_assert!(result.net_proceeds >= 0.0);
            if result.taxable_income <= 0.0 {
                prop_assert!(result.monthly_tax_liability == 0.0);
            }
            prop_assert!(result.rental_roe.is_finite());
            prop_assert!(result.leverage_ratio.is_finite());
            prop_assert!((0.0..=100.0).contains(&result.tax_shield_percentage));
            if rate_bp == 0 {
                prop_assert!(result.monthly_pi == result.loan_amount / (term_years * 12) as f64);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_higher_appreciation_raises_return_and_roe(
            appreciation_bp in -500i32..1_500,
            bump_bp in 1u32..500,
            market_value in 400_000u32..900_000
        ) {
            let mut low = sample_inputs();
            low.market_value = market_value as f64;
            low.appreciation_rate = appreciation_bp as f64 / 100.0;
            let mut high = low;
            high.appreciation_rate += bump_bp as f64 / 100.0;

            let low_result = evaluate(&low);
            let high_result = evaluate(&high);
            prop_assert!(high_result.total_monthly_return > low_result.total_monthly_return);
            prop_assert!(high_result.rental_roe > low_result.rental_roe);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_higher_selling_costs_never_raise_net_proceeds(
            selling_bp in 0u32..2_000,
            bump_bp in 1u32..1_000,
            market_value in 0u32..1_000_000
        ) {
            let mut cheap = sample_inputs();
            cheap.market_value = market_value as f64;
            cheap.selling_cost_percent = selling_bp as f64 / 100.0;
            let mut costly = cheap;
            costly.selling_cost_percent += bump_bp as f64 / 100.0;

            let cheap_result = evaluate(&cheap);
            let costly_result = evaluate(&costly);
            if cheap_result.net_proceeds > 0.0 {
                prop_assert!(costly_result.net_proceeds < cheap_result.net_proceeds);
            } else {
                prop_assert!(costly_result.net_proceeds == 0.0);
            }
        }
    }
}
