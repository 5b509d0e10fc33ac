use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use super::format::format_percent;
use super::types::FinancialResult;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Rent,
    Stock,
    Bond,
}

/// Dimensions along which holding the rental is compared with selling.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Concept {
    Roe,
    Leverage,
    Tax,
    Cashflow,
    Principal,
    Liquidity,
    Inflation,
    Volatility,
    Control,
    Effort,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub mode: ViewMode,
    pub label: &'static str,
    pub headline: String,
    pub is_winner: bool,
    pub is_loser: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptComparison {
    pub concept: Concept,
    pub title: &'static str,
    pub definition: &'static str,
    pub rows: [ComparisonRow; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown concept `{0}`")]
pub struct UnknownConcept(pub String);

impl Concept {
    pub const ALL: [Concept; 10] = [
        Concept::Roe,
        Concept::Leverage,
        Concept::Tax,
        Concept::Cashflow,
        Concept::Principal,
        Concept::Liquidity,
        Concept::Inflation,
        Concept::Volatility,
        Concept::Control,
        Concept::Effort,
    ];

    /// Shown when the caller has not picked any concepts.
    pub const DEFAULT_SELECTION: [Concept; 3] = [Concept::Roe, Concept::Leverage, Concept::Tax];

    pub fn id(self) -> &'static str {
        match self {
            Concept::Roe => "roe",
            Concept::Leverage => "leverage",
            Concept::Tax => "tax",
            Concept::Cashflow => "cashflow",
            Concept::Principal => "principal",
            Concept::Liquidity => "liquidity",
            Concept::Inflation => "inflation",
            Concept::Volatility => "volatility",
            Concept::Control => "control",
            Concept::Effort => "effort",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Concept::Roe => "Wealth Speed (ROE)",
            Concept::Leverage => "The Multiplier (Leverage)",
            Concept::Tax => "Tax Shield Efficiency",
            Concept::Cashflow => "Cash Flow Stability",
            Concept::Principal => "Forced Savings",
            Concept::Liquidity => "Liquidity (Access to Cash)",
            Concept::Inflation => "Inflation Protection",
            Concept::Volatility => "Psychological Stress (Volatility)",
            Concept::Control => "Active Control",
            Concept::Effort => "Lifestyle Impact",
        }
    }

    pub fn definition(self) -> &'static str {
        match self {
            Concept::Roe => "How fast your actual cash equity is growing per year.",
            Concept::Leverage => "Using the bank's money to buy a bigger asset.",
            Concept::Tax => "How much of your profit goes to tax?",
            Concept::Cashflow => "Can you count on this money every month?",
            Concept::Principal => "Are you saving money automatically?",
            Concept::Liquidity => "If you have an emergency, how fast can you get your money?",
            Concept::Inflation => "Does it keep up when everything gets expensive?",
            Concept::Volatility => "How scary is the price movement?",
            Concept::Control => "Can you work harder to make more money?",
            Concept::Effort => "Is this a passive investment or a job?",
        }
    }

    pub fn comparison(self, result: &FinancialResult) -> ConceptComparison {
        let rows = match self {
            Concept::Roe => {
                let rental = result.rental_roe;
                let stock = result.stock_roe;
                let bond = result.bond_roe;
                [
                    row(
                        ViewMode::Rent,
                        format_percent(rental),
                        rental > stock && rental > bond,
                        false,
                    ),
                    row(ViewMode::Stock, format_percent(stock), stock > rental, false),
                    ComparisonRow {
                        label: "Bonds/CD",
                        ..row(ViewMode::Bond, format_percent(bond), false, true)
                    },
                ]
            }
            Concept::Leverage => [
                row(
                    ViewMode::Rent,
                    format!("{:.1}x Multiplier", result.leverage_ratio),
                    true,
                    false,
                ),
                row(ViewMode::Stock, "1.0x (None)".to_string(), false, false),
                row(ViewMode::Bond, "1.0x (None)".to_string(), false, false),
            ],
            Concept::Tax => fixed_rows(
                ("High Shield", true, false),
                ("Tax Deferred", false, false),
                ("Fully Taxed", false, true),
            ),
            Concept::Cashflow => fixed_rows(
                ("Volatile", false, true),
                ("Low Yield", false, false),
                ("Guaranteed", true, false),
            ),
            Concept::Principal => fixed_rows(
                ("Automatic", true, false),
                ("Manual", false, false),
                ("N/A", false, false),
            ),
            Concept::Liquidity => fixed_rows(
                ("Locked Up", false, true),
                ("Instant", true, false),
                ("High", true, false),
            ),
            Concept::Inflation => fixed_rows(
                ("The 'Double Hedge'", true, false),
                ("Good", true, false),
                ("Destroyed", false, true),
            ),
            Concept::Volatility => fixed_rows(
                ("Calm", true, false),
                ("Rollercoaster", false, true),
                ("Stable", true, false),
            ),
            Concept::Control => fixed_rows(
                ("Yes (High)", true, false),
                ("No (Passive)", false, false),
                ("No (Passive)", false, false),
            ),
            Concept::Effort => fixed_rows(
                ("Part-Time Job", false, true),
                ("Freedom", true, false),
                ("Freedom", true, false),
            ),
        };

        ConceptComparison {
            concept: self,
            title: self.title(),
            definition: self.definition(),
            rows,
        }
    }
}

impl FromStr for Concept {
    type Err = UnknownConcept;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Concept::ALL
            .into_iter()
            .find(|concept| concept.id() == needle)
            .ok_or_else(|| UnknownConcept(s.to_string()))
    }
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Rent => "Real Estate",
            ViewMode::Stock => "Stocks",
            ViewMode::Bond => "Bonds",
        }
    }
}

fn row(mode: ViewMode, headline: String, is_winner: bool, is_loser: bool) -> ComparisonRow {
    ComparisonRow {
        mode,
        label: mode.label(),
        headline,
        is_winner,
        is_loser,
    }
}

type FixedRow = (&'static str, bool, bool);

fn fixed_rows(rent: FixedRow, stock: FixedRow, bond: FixedRow) -> [ComparisonRow; 3] {
    [
        row(ViewMode::Rent, rent.0.to_string(), rent.1, rent.2),
        row(ViewMode::Stock, stock.0.to_string(), stock.1, stock.2),
        row(ViewMode::Bond, bond.0.to_string(), bond.1, bond.2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DEFAULT_ASSUMPTIONS, evaluate};

    #[test]
    fn every_concept_round_trips_through_its_id() {
        for concept in Concept::ALL {
            assert_eq!(concept.id().parse::<Concept>(), Ok(concept));
        }
        assert_eq!("  ROE ".parse::<Concept>(), Ok(Concept::Roe));
        assert_eq!(
            "yield".parse::<Concept>(),
            Err(UnknownConcept("yield".to_string()))
        );
    }

    #[test]
    fn default_scenario_rental_wins_roe() {
        let result = evaluate(&DEFAULT_ASSUMPTIONS);
        let roe = Concept::Roe.comparison(&result);
        assert_eq!(roe.rows[0].headline, "14.03%");
        assert!(roe.rows[0].is_winner);
        assert!(!roe.rows[1].is_winner);
        assert_eq!(roe.rows[1].headline, "8.00%");
        assert!(roe.rows[2].is_loser);
        assert_eq!(roe.rows[2].label, "Bonds/CD");
        assert_eq!(roe.rows[2].headline, "4.50%");
    }

    #[test]
    fn unknown_concept_error_names_the_id() {
        let err = "yield".parse::<Concept>().expect_err("not a concept");
        assert_eq!(err.to_string(), "unknown concept `yield`");
    }

    #[test]
    fn stocks_win_roe_when_rental_falls_behind() {
        let mut inputs = DEFAULT_ASSUMPTIONS;
        inputs.appreciation_rate = 0.0;
        inputs.monthly_rent = 2_500.0;
        let result = evaluate(&inputs);
        assert!(result.rental_roe < result.stock_roe);

        let roe = Concept::Roe.comparison(&result);
        assert!(!roe.rows[0].is_winner);
        assert!(roe.rows[1].is_winner);
    }

    #[test]
    fn leverage_headline_uses_one_decimal() {
        let result = evaluate(&DEFAULT_ASSUMPTIONS);
        let leverage = Concept::Leverage.comparison(&result);
        assert_eq!(leverage.rows[0].headline, "4.0x Multiplier");
        assert_eq!(leverage.rows[0].label, "Real Estate");
        assert_eq!(leverage.rows[2].mode, ViewMode::Bond);
        assert_eq!(leverage.rows[2].label, "Bonds");
    }

    #[test]
    fn rows_are_always_rent_stock_bond() {
        let result = evaluate(&DEFAULT_ASSUMPTIONS);
        for concept in Concept::ALL {
            let comparison = concept.comparison(&result);
            let modes: Vec<ViewMode> = comparison.rows.iter().map(|r| r.mode).collect();
            assert_eq!(modes, vec![ViewMode::Rent, ViewMode::Stock, ViewMode::Bond]);
            assert!(comparison.rows.iter().all(|r| !(r.is_winner && r.is_loser)));
        }
    }
}
