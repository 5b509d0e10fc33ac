mod concepts;
mod engine;
mod format;
mod rate_lock;
mod types;
mod validate;

pub use concepts::{ComparisonRow, Concept, ConceptComparison, UnknownConcept, ViewMode};
pub use engine::{DEPRECIATION_RECOVERY_YEARS, Evaluator, evaluate, monthly_payment};
pub use format::{format_currency, format_percent, format_usd};
pub use rate_lock::{ArmWarning, MARKET_BENCHMARK_RATE, RateLockAnalysis, analyze_rate_lock};
pub use types::{Assumptions, DEFAULT_ASSUMPTIONS, FinancialResult};
pub use validate::{AssumptionError, validate};
