use serde::Serialize;

use super::engine::{monthly_payment, monthly_rate};
use super::types::Assumptions;

/// Benchmark 30-year fixed rate the locked-in loan is compared against.
pub const MARKET_BENCHMARK_RATE: f64 = 7.12;

/// Both loans are compared over the same 30-year schedule, whatever the
/// actual loan term is.
const COMPARISON_PAYMENTS: f64 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLockAnalysis {
    pub market_rate: f64,
    pub loan_amount: f64,
    #[serde(rename = "myMonthlyPI")]
    pub my_monthly_pi: f64,
    #[serde(rename = "marketMonthlyPI")]
    pub market_monthly_pi: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub ten_year_value: f64,
    pub affordable_loan_today: f64,
    pub purchasing_power_loss: f64,
    pub purchasing_power_ratio: f64,
    pub arm_warning: Option<ArmWarning>,
}

/// Reset risk for an adjustable loan. Display only; the reset is not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmWarning {
    pub fixed_period_years: f64,
    pub expected_reset_rate: f64,
    pub periodic_cap: f64,
    pub lifetime_cap: f64,
}

/// Values the below-market rate on the existing loan: what the same loan would
/// cost at `market_rate`, and how much loan the current payment buys today.
pub fn analyze_rate_lock(a: &Assumptions, market_rate: f64) -> RateLockAnalysis {
    let loan_amount = a.purchase_price * (1.0 - a.down_payment_percent / 100.0);
    let my_monthly_pi = monthly_payment(loan_amount, a.interest_rate, COMPARISON_PAYMENTS);
    let market_monthly_pi = monthly_payment(loan_amount, market_rate, COMPARISON_PAYMENTS);
    let monthly_savings = market_monthly_pi - my_monthly_pi;
    let annual_savings = monthly_savings * 12.0;

    let affordable_loan_today = affordable_principal(my_monthly_pi, market_rate);
    let purchasing_power_ratio = if loan_amount == 0.0 {
        1.0
    } else {
        affordable_loan_today / loan_amount
    };

    let arm_warning = a.is_arm.then(|| ArmWarning {
        fixed_period_years: a.arm_fixed_period,
        expected_reset_rate: a.arm_index + a.arm_margin,
        periodic_cap: a.arm_periodic_cap,
        lifetime_cap: a.arm_lifetime_cap,
    });

    RateLockAnalysis {
        market_rate,
        loan_amount,
        my_monthly_pi,
        market_monthly_pi,
        monthly_savings,
        annual_savings,
        ten_year_value: annual_savings * 10.0,
        affordable_loan_today,
        purchasing_power_loss: loan_amount - affordable_loan_today,
        purchasing_power_ratio,
        arm_warning,
    }
}

// Present value of `payment` over the comparison schedule.
fn affordable_principal(payment: f64, annual_rate_percent: f64) -> f64 {
    let r = monthly_rate(annual_rate_percent);
    let n = COMPARISON_PAYMENTS;
    if r == 0.0 {
        return payment * n;
    }
    let growth = (1.0 + r).powf(n);
    payment * (growth - 1.0) / (r * growth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_ASSUMPTIONS;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_loan_against_benchmark_rate() {
        let analysis = analyze_rate_lock(&DEFAULT_ASSUMPTIONS, MARKET_BENCHMARK_RATE);
        assert_approx(analysis.loan_amount, 360_000.0);
        assert_approx(analysis.my_monthly_pi, 1_566.742_748_660_577);
        assert!((analysis.market_monthly_pi - 2_424.171_876_743_473).abs() < 1e-5);
        assert!((analysis.annual_savings - 10_289.149_536_994_74).abs() < 1e-4);
        assert!((analysis.ten_year_value - 102_891.495_369_947_5).abs() < 1e-3);
        assert!((analysis.affordable_loan_today - 232_668.069_013_117).abs() < 1e-3);
        assert!((analysis.purchasing_power_ratio - 0.646_300_191_703_102_8).abs() < 1e-9);
        assert_approx(
            analysis.purchasing_power_loss,
            analysis.loan_amount - analysis.affordable_loan_today,
        );
        assert!(analysis.arm_warning.is_none());
    }

    #[test]
    fn matching_rates_leave_nothing_to_lose() {
        let analysis = analyze_rate_lock(&DEFAULT_ASSUMPTIONS, DEFAULT_ASSUMPTIONS.interest_rate);
        assert_approx(analysis.monthly_savings, 0.0);
        assert!((analysis.purchasing_power_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_market_rate_uses_straight_line_present_value() {
        let analysis = analyze_rate_lock(&DEFAULT_ASSUMPTIONS, 0.0);
        assert_approx(analysis.market_monthly_pi, 1_000.0);
        assert_approx(analysis.affordable_loan_today, analysis.my_monthly_pi * 360.0);
        assert!(analysis.purchasing_power_ratio > 1.0);
    }

    #[test]
    fn fully_paid_purchase_has_neutral_ratio() {
        let mut inputs = DEFAULT_ASSUMPTIONS;
        inputs.down_payment_percent = 100.0;
        let analysis = analyze_rate_lock(&inputs, MARKET_BENCHMARK_RATE);
        assert_eq!(analysis.loan_amount, 0.0);
        assert_eq!(analysis.purchasing_power_ratio, 1.0);
        assert_eq!(analysis.purchasing_power_loss, 0.0);
    }

    #[test]
    fn arm_warning_reports_index_plus_margin() {
        let mut inputs = DEFAULT_ASSUMPTIONS;
        inputs.is_arm = true;
        let warning = analyze_rate_lock(&inputs, MARKET_BENCHMARK_RATE)
            .arm_warning
            .expect("ARM loans carry a warning");
        assert_approx(warning.fixed_period_years, 5.0);
        assert_approx(warning.expected_reset_rate, 6.75);
        assert_approx(warning.lifetime_cap, 5.0);
    }
}
