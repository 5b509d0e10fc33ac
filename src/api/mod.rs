use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use clap::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core::{
    Assumptions, Concept, ConceptComparison, DEFAULT_ASSUMPTIONS, FinancialResult,
    Evaluator, MARKET_BENCHMARK_RATE, RateLockAnalysis, analyze_rate_lock, format_percent,
    format_usd, validate,
};

/// Shared by all requests; repeated identical evaluations are served from the
/// evaluator's last-result cache.
type SharedEvaluator = Arc<Mutex<Evaluator>>;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EvaluatePayload {
    purchase_price: Option<f64>,
    market_value: Option<f64>,
    down_payment_percent: Option<f64>,
    interest_rate: Option<f64>,
    loan_term_years: Option<f64>,
    monthly_rent: Option<f64>,

    vacancy_rate: Option<f64>,
    management_fee: Option<f64>,
    maintenance_rate: Option<f64>,
    property_tax_rate: Option<f64>,
    insurance_rate: Option<f64>,

    appreciation_rate: Option<f64>,
    building_value_percent: Option<f64>,
    marginal_tax_rate: Option<f64>,
    capital_gains_rate: Option<f64>,

    stock_return_rate: Option<f64>,
    bond_yield_rate: Option<f64>,
    selling_cost_percent: Option<f64>,

    #[serde(rename = "isARM", alias = "isArm")]
    is_arm: Option<bool>,
    arm_fixed_period: Option<f64>,
    arm_index: Option<f64>,
    arm_margin: Option<f64>,
    arm_periodic_cap: Option<f64>,
    arm_lifetime_cap: Option<f64>,

    strict: Option<bool>,
    market_rate: Option<f64>,
    concepts: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "rent-vs-invest",
    about = "Compare keeping a property as a rental against selling it and investing the proceeds"
)]
struct Cli {
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.purchase_price)]
    purchase_price: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.market_value,
        help = "Current market value of the property"
    )]
    market_value: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.down_payment_percent,
        help = "Original down payment in percent of purchase price"
    )]
    down_payment_percent: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.interest_rate,
        help = "Annual loan interest rate in percent, e.g. 3.25"
    )]
    interest_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.loan_term_years,
        allow_negative_numbers = true,
        help = "Loan term in years; --strict requires a positive whole number"
    )]
    loan_term_years: f64,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.monthly_rent)]
    monthly_rent: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.vacancy_rate,
        help = "Vacancy allowance in percent of rent"
    )]
    vacancy_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.management_fee,
        help = "Property management fee in percent of rent"
    )]
    management_fee: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.maintenance_rate,
        help = "Annual maintenance in percent of market value"
    )]
    maintenance_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.property_tax_rate,
        help = "Annual property tax in percent of market value"
    )]
    property_tax_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.insurance_rate,
        help = "Annual insurance in percent of market value"
    )]
    insurance_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.appreciation_rate,
        help = "Expected annual appreciation in percent"
    )]
    appreciation_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.building_value_percent,
        help = "Depreciable share of the purchase price in percent"
    )]
    building_value_percent: f64,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.marginal_tax_rate)]
    marginal_tax_rate: f64,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.capital_gains_rate)]
    capital_gains_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.stock_return_rate,
        help = "Expected annual stock return in percent"
    )]
    stock_return_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.bond_yield_rate,
        help = "Expected annual bond yield in percent"
    )]
    bond_yield_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ASSUMPTIONS.selling_cost_percent,
        help = "Agent fees and closing costs to sell, in percent of market value"
    )]
    selling_cost_percent: f64,
    #[arg(long = "arm", help = "The loan is an adjustable-rate mortgage")]
    is_arm: bool,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.arm_fixed_period)]
    arm_fixed_period: f64,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.arm_index)]
    arm_index: f64,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.arm_margin)]
    arm_margin: f64,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.arm_periodic_cap)]
    arm_periodic_cap: f64,
    #[arg(long, default_value_t = DEFAULT_ASSUMPTIONS.arm_lifetime_cap)]
    arm_lifetime_cap: f64,
    #[arg(long, help = "Reject out-of-range assumptions instead of evaluating them")]
    strict: bool,
    #[arg(
        long,
        default_value_t = MARKET_BENCHMARK_RATE,
        help = "Benchmark mortgage rate in percent for the rate lock comparison"
    )]
    market_rate: f64,
    #[arg(long, help = "Comma-separated concept ids, e.g. roe,leverage,tax")]
    concepts: Option<String>,
    #[arg(long, help = "Print the JSON document served by /api/evaluate")]
    json: bool,
}

#[derive(Debug, Clone)]
struct ApiOptions {
    strict: bool,
    market_rate: f64,
    concepts: Vec<Concept>,
}

#[derive(Debug)]
struct ApiRequest {
    assumptions: Assumptions,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    #[serde(rename = "monthlyPI")]
    monthly_pi: String,
    monthly_cash_flow: String,
    after_tax_cash_flow: String,
    total_monthly_return: String,
    net_proceeds: String,
    #[serde(rename = "rentalROE")]
    rental_roe: String,
    #[serde(rename = "stockROE")]
    stock_roe: String,
    #[serde(rename = "bondROE")]
    bond_roe: String,
    leverage_ratio: String,
    tax_shield_percentage: String,
    /// Set when the ROE and leverage figures sit on the zero-equity guard.
    zero_equity_note: Option<String>,
    /// Names the result fields that are infinite or NaN; JSON encodes those as
    /// `null`.
    non_finite_note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateResponse {
    assumptions: Assumptions,
    result: FinancialResult,
    rate_lock: RateLockAnalysis,
    concepts: Vec<ConceptComparison>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConceptListing {
    id: &'static str,
    title: &'static str,
    definition: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_assumptions(cli: &Cli) -> Assumptions {
    Assumptions {
        purchase_price: cli.purchase_price,
        market_value: cli.market_value,
        down_payment_percent: cli.down_payment_percent,
        interest_rate: cli.interest_rate,
        loan_term_years: cli.loan_term_years,
        monthly_rent: cli.monthly_rent,
        vacancy_rate: cli.vacancy_rate,
        management_fee: cli.management_fee,
        maintenance_rate: cli.maintenance_rate,
        property_tax_rate: cli.property_tax_rate,
        insurance_rate: cli.insurance_rate,
        appreciation_rate: cli.appreciation_rate,
        building_value_percent: cli.building_value_percent,
        marginal_tax_rate: cli.marginal_tax_rate,
        capital_gains_rate: cli.capital_gains_rate,
        stock_return_rate: cli.stock_return_rate,
        bond_yield_rate: cli.bond_yield_rate,
        selling_cost_percent: cli.selling_cost_percent,
        is_arm: cli.is_arm,
        arm_fixed_period: cli.arm_fixed_period,
        arm_index: cli.arm_index,
        arm_margin: cli.arm_margin,
        arm_periodic_cap: cli.arm_periodic_cap,
        arm_lifetime_cap: cli.arm_lifetime_cap,
    }
}

fn parse_concepts(raw: Option<&str>) -> Result<Vec<Concept>, String> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(Concept::DEFAULT_SELECTION.to_vec());
    };
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(Concept::ALL.to_vec());
    }

    let mut concepts = Vec::new();
    for id in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let concept = id.parse::<Concept>().map_err(|e| e.to_string())?;
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }
    Ok(concepts)
}

fn validate_market_rate(market_rate: f64) -> Result<f64, String> {
    if !market_rate.is_finite() || market_rate < 0.0 {
        return Err("marketRate must be a finite number >= 0".to_string());
    }
    Ok(market_rate)
}

/// Runs the command-line front end and returns the text to print.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Ok(e.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    let request = ApiRequest {
        assumptions: build_assumptions(&cli),
        options: ApiOptions {
            strict: cli.strict,
            market_rate: validate_market_rate(cli.market_rate)?,
            concepts: parse_concepts(cli.concepts.as_deref())?,
        },
    };
    let response = evaluate_request(&mut Evaluator::new(), &request)?;

    if cli.json {
        serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to encode JSON: {e}"))
    } else {
        Ok(render_report(&response))
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state: SharedEvaluator = Arc::new(Mutex::new(Evaluator::new()));
    let app = Router::new()
        .route("/api/defaults", get(defaults_handler))
        .route("/api/concepts", get(concepts_handler))
        .route(
            "/api/evaluate",
            get(evaluate_get_handler).post(evaluate_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("rent-vs-invest API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/api/evaluate");

    axum::serve(listener, app).await
}

async fn defaults_handler() -> Response {
    json_response(StatusCode::OK, DEFAULT_ASSUMPTIONS)
}

async fn concepts_handler() -> Response {
    let listing: Vec<ConceptListing> = Concept::ALL
        .into_iter()
        .map(|concept| ConceptListing {
            id: concept.id(),
            title: concept.title(),
            definition: concept.definition(),
        })
        .collect();
    json_response(StatusCode::OK, listing)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn evaluate_get_handler(
    State(evaluator): State<SharedEvaluator>,
    Query(payload): Query<EvaluatePayload>,
) -> Response {
    evaluate_handler_impl(&evaluator, payload)
}

async fn evaluate_post_handler(
    State(evaluator): State<SharedEvaluator>,
    Json(payload): Json<EvaluatePayload>,
) -> Response {
    evaluate_handler_impl(&evaluator, payload)
}

fn evaluate_handler_impl(evaluator: &SharedEvaluator, payload: EvaluatePayload) -> Response {
    let response = api_request_from_payload(payload).and_then(|request| {
        let mut evaluator = evaluator
            .lock()
            .map_err(|_| "evaluator state is unavailable".to_string())?;
        evaluate_request(&mut evaluator, &request)
    });
    match response {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            log::warn!("rejected evaluate request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn evaluate_request(
    evaluator: &mut Evaluator,
    request: &ApiRequest,
) -> Result<EvaluateResponse, String> {
    let assumptions = request.assumptions;
    if request.options.strict {
        validate(&assumptions).map_err(|e| e.to_string())?;
    }

    let result = evaluator.evaluate(&assumptions);
    log::debug!(
        "evaluated: rental ROE {:.2}% on net proceeds {:.0}",
        result.rental_roe,
        result.net_proceeds
    );
    let rate_lock = analyze_rate_lock(&assumptions, request.options.market_rate);
    let concepts = request
        .options
        .concepts
        .iter()
        .map(|concept| concept.comparison(&result))
        .collect();

    Ok(EvaluateResponse {
        assumptions,
        result,
        rate_lock,
        concepts,
        summary: build_summary(&result),
    })
}

fn build_summary(result: &FinancialResult) -> Summary {
    let zero_equity_note = (result.net_proceeds == 0.0).then(|| {
        "Selling would net nothing after debt and costs; ROE and leverage are computed against $1 and are not meaningful.".to_string()
    });
    let non_finite: Vec<&str> = result_figures(result)
        .into_iter()
        .filter(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
        .collect();
    let non_finite_note = (!non_finite.is_empty()).then(|| {
        format!(
            "Not finite for these inputs (shown as null in the result): {}.",
            non_finite.join(", ")
        )
    });
    Summary {
        monthly_pi: format_usd(result.monthly_pi),
        monthly_cash_flow: format_usd(result.monthly_cash_flow),
        after_tax_cash_flow: format_usd(result.after_tax_cash_flow),
        total_monthly_return: format_usd(result.total_monthly_return),
        net_proceeds: format_usd(result.net_proceeds),
        rental_roe: format_percent(result.rental_roe),
        stock_roe: format_percent(result.stock_roe),
        bond_roe: format_percent(result.bond_roe),
        leverage_ratio: format!("{:.1}x", result.leverage_ratio),
        tax_shield_percentage: format_percent(result.tax_shield_percentage),
        zero_equity_note,
        non_finite_note,
    }
}

// Keys match the serialized `FinancialResult`.
fn result_figures(r: &FinancialResult) -> [(&'static str, f64); 22] {
    [
        ("loanAmount", r.loan_amount),
        ("monthlyPI", r.monthly_pi),
        ("interestPayment", r.interest_payment),
        ("principalPayment", r.principal_payment),
        ("totalOperatingExpenses", r.total_operating_expenses),
        ("monthlyCashFlow", r.monthly_cash_flow),
        ("monthlyDepreciation", r.monthly_depreciation),
        ("annualDepreciation", r.annual_depreciation),
        ("taxableIncome", r.taxable_income),
        ("monthlyTaxLiability", r.monthly_tax_liability),
        ("afterTaxCashFlow", r.after_tax_cash_flow),
        ("monthlyAppreciation", r.monthly_appreciation),
        ("totalMonthlyReturn", r.total_monthly_return),
        ("sellingCosts", r.selling_costs),
        ("netProceeds", r.net_proceeds),
        ("rentalROE", r.rental_roe),
        ("monthlyStockReturn", r.monthly_stock_return),
        ("stockROE", r.stock_roe),
        ("monthlyBondReturn", r.monthly_bond_return),
        ("bondROE", r.bond_roe),
        ("leverageRatio", r.leverage_ratio),
        ("taxShieldPercentage", r.tax_shield_percentage),
    ]
}

fn render_report(response: &EvaluateResponse) -> String {
    let r = &response.result;
    let s = &response.summary;
    let lock = &response.rate_lock;
    let mut out = String::new();

    let _ = writeln!(out, "Keep as rental");
    let _ = writeln!(out, "  Mortgage P&I          {}", s.monthly_pi);
    let _ = writeln!(
        out,
        "  Operating expenses    {}",
        format_usd(r.total_operating_expenses)
    );
    let _ = writeln!(out, "  Cash flow (pre-tax)   {}", s.monthly_cash_flow);
    let _ = writeln!(
        out,
        "  Tax liability         {}",
        format_usd(r.monthly_tax_liability)
    );
    let _ = writeln!(out, "  Cash flow (after tax) {}", s.after_tax_cash_flow);
    let _ = writeln!(
        out,
        "  Principal paydown     {}",
        format_usd(r.principal_payment)
    );
    let _ = writeln!(
        out,
        "  Appreciation          {}",
        format_usd(r.monthly_appreciation)
    );
    let _ = writeln!(out, "  Total monthly return  {}", s.total_monthly_return);
    let _ = writeln!(out, "  Tax shield            {}", s.tax_shield_percentage);
    let _ = writeln!(out);

    let _ = writeln!(out, "Sell and reinvest {}", s.net_proceeds);
    let _ = writeln!(
        out,
        "  Selling costs         {}",
        format_usd(r.selling_costs)
    );
    let _ = writeln!(
        out,
        "  Stocks                {}/mo",
        format_usd(r.monthly_stock_return)
    );
    let _ = writeln!(
        out,
        "  Bonds                 {}/mo",
        format_usd(r.monthly_bond_return)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Return on equity");
    let _ = writeln!(out, "  Rental                {}", s.rental_roe);
    let _ = writeln!(out, "  Stocks                {}", s.stock_roe);
    let _ = writeln!(out, "  Bonds                 {}", s.bond_roe);
    let _ = writeln!(out, "  Leverage              {}", s.leverage_ratio);
    for note in [&s.zero_equity_note, &s.non_finite_note].into_iter().flatten() {
        let _ = writeln!(out, "  Note: {note}");
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Rate lock vs {} market",
        format_percent(lock.market_rate)
    );
    let _ = writeln!(
        out,
        "  Payment at market     {}",
        format_usd(lock.market_monthly_pi)
    );
    let _ = writeln!(
        out,
        "  Annual savings        {}",
        format_usd(lock.annual_savings)
    );
    let _ = writeln!(
        out,
        "  Ten-year value        {}",
        format_usd(lock.ten_year_value)
    );
    let _ = writeln!(
        out,
        "  Loan affordable today {}",
        format_usd(lock.affordable_loan_today)
    );
    if let Some(arm) = &lock.arm_warning {
        let _ = writeln!(
            out,
            "  ARM warning: fixed period ends in {} years; rate likely resets to {}",
            arm.fixed_period_years,
            format_percent(arm.expected_reset_rate)
        );
    }

    for comparison in &response.concepts {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", comparison.title);
        for row in &comparison.rows {
            let marker = if row.is_winner {
                "+"
            } else if row.is_loser {
                "-"
            } else {
                " "
            };
            let _ = writeln!(out, "  {marker} {:<12} {}", row.label, row.headline);
        }
    }

    out
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<EvaluatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: EvaluatePayload) -> Result<ApiRequest, String> {
    let mut a = DEFAULT_ASSUMPTIONS;

    if let Some(v) = payload.purchase_price {
        a.purchase_price = v;
    }
    if let Some(v) = payload.market_value {
        a.market_value = v;
    }
    if let Some(v) = payload.down_payment_percent {
        a.down_payment_percent = v;
    }
    if let Some(v) = payload.interest_rate {
        a.interest_rate = v;
    }
    if let Some(v) = payload.loan_term_years {
        a.loan_term_years = v;
    }
    if let Some(v) = payload.monthly_rent {
        a.monthly_rent = v;
    }

    if let Some(v) = payload.vacancy_rate {
        a.vacancy_rate = v;
    }
    if let Some(v) = payload.management_fee {
        a.management_fee = v;
    }
    if let Some(v) = payload.maintenance_rate {
        a.maintenance_rate = v;
    }
    if let Some(v) = payload.property_tax_rate {
        a.property_tax_rate = v;
    }
    if let Some(v) = payload.insurance_rate {
        a.insurance_rate = v;
    }

    if let Some(v) = payload.appreciation_rate {
        a.appreciation_rate = v;
    }
    if let Some(v) = payload.building_value_percent {
        a.building_value_percent = v;
    }
    if let Some(v) = payload.marginal_tax_rate {
        a.marginal_tax_rate = v;
    }
    if let Some(v) = payload.capital_gains_rate {
        a.capital_gains_rate = v;
    }

    if let Some(v) = payload.stock_return_rate {
        a.stock_return_rate = v;
    }
    if let Some(v) = payload.bond_yield_rate {
        a.bond_yield_rate = v;
    }
    if let Some(v) = payload.selling_cost_percent {
        a.selling_cost_percent = v;
    }

    if let Some(v) = payload.is_arm {
        a.is_arm = v;
    }
    if let Some(v) = payload.arm_fixed_period {
        a.arm_fixed_period = v;
    }
    if let Some(v) = payload.arm_index {
        a.arm_index = v;
    }
    if let Some(v) = payload.arm_margin {
        a.arm_margin = v;
    }
    if let Some(v) = payload.arm_periodic_cap {
        a.arm_periodic_cap = v;
    }
    if let Some(v) = payload.arm_lifetime_cap {
        a.arm_lifetime_cap = v;
    }

    let options = ApiOptions {
        strict: payload.strict.unwrap_or(false),
        market_rate: validate_market_rate(payload.market_rate.unwrap_or(MARKET_BENCHMARK_RATE))?,
        concepts: parse_concepts(payload.concepts.as_deref())?,
    };

    Ok(ApiRequest {
        assumptions: a,
        options,
    })
}
