//! Simulation scenarios.

use serde::{Deserialize, Serialize};

/// A scripted sequence of publishes and checked conversions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Publish `1 base = price quote`.
    Publish {
        base: String,
        quote: String,
        price: String,
    },
    /// Convert and compare with the expected outcome.
    Convert {
        from: String,
        to: String,
        amount: String,
        expect: Expectation,
    },
}

/// Expected outcome of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    /// The formatted converted amount.
    Price(String),
    /// An unknown currency or no connecting rate.
    NotFound,
}

const REFERENCE_RATES: [(&str, &str, &str); 9] = [
    ("BTC", "EUR", "50000.0000"),
    ("EUR", "USD", "1.2000"),
    ("EUR", "AUD", "1.5000"),
    ("USD", "RUB", "80.0000"),
    ("UAH", "RUB", "4.0000"),
    ("LTC", "BTC", "0.0400"),
    ("LTC", "USD", "2320.0000"),
    ("LTC", "USD", "2320.0000"),
    ("GBP", "JPY", "152.1400"),
];

const REFERENCE_CONVERSIONS: [(&str, &str, &str, &str); 8] = [
    ("BTC", "BTC", "0.9997", "0.9997"),
    ("EUR", "BTC", "50000.0000", "1.0000"),
    ("BTC", "EUR", "1.0000", "50000.0000"),
    ("BTC", "AUD", "1.0000", "75000.0000"),
    ("BTC", "RUB", "1.0000", "4800000.0000"),
    ("RUB", "EUR", "96.0000", "1.0000"),
    ("BTC", "USD", "0.000000003", "0.0002"),
    ("BTC", "USD", "0.0000000003", "0.0000"),
];

const REFERENCE_FAILURES: [(&str, &str, &str); 4] = [
    ("test", "BTC", "0.9997"),
    ("UAH", "test", "0.9997"),
    ("test", "test", "0.9997"),
    ("JPY", "BTC", "50000.0000"),
];

impl Scenario {
    /// Names of the built-in scenarios.
    pub const BUILT_IN: [&'static str; 2] = ["reference", "republish"];

    /// Load a scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "reference" => Ok(Self::reference()),
            "republish" => Ok(Self::republish()),
            _ => Err(anyhow::anyhow!(
                "Unknown scenario: {} (built-in: {}, concurrent)",
                name,
                Self::BUILT_IN.join(", ")
            )),
        }
    }

    /// Parse a scenario from JSON.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reference rate set with its expected conversions.
    fn reference() -> Self {
        let mut steps: Vec<ScenarioStep> = REFERENCE_RATES.iter().map(publish).collect();
        steps.extend(expected_conversions());

        Self {
            name: "reference".to_string(),
            description: "Reference rate set with direct, reversed and multi-hop conversions".to_string(),
            steps,
        }
    }

    /// Reference rates published twice plus a worse rate for an existing
    /// pair; every conversion must stay as in the reference scenario.
    fn republish() -> Self {
        let mut steps: Vec<ScenarioStep> = REFERENCE_RATES.iter().map(publish).collect();
        steps.extend(REFERENCE_RATES.iter().map(publish));
        steps.push(publish(&("LTC", "USD", "2300.0000")));
        steps.extend(expected_conversions());

        Self {
            name: "republish".to_string(),
            description: "Republished and worsened rates keep the best known paths".to_string(),
            steps,
        }
    }
}

fn publish(&(base, quote, price): &(&str, &str, &str)) -> ScenarioStep {
    ScenarioStep::Publish {
        base: base.to_string(),
        quote: quote.to_string(),
        price: price.to_string(),
    }
}

fn expected_conversions() -> Vec<ScenarioStep> {
    let prices = REFERENCE_CONVERSIONS
        .iter()
        .map(|&(from, to, amount, price)| (from, to, amount, Expectation::Price(price.to_string())));
    let failures = REFERENCE_FAILURES
        .iter()
        .map(|&(from, to, amount)| (from, to, amount, Expectation::NotFound));

    prices
        .chain(failures)
        .map(|(from, to, amount, expect)| ScenarioStep::Convert {
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.to_string(),
            expect,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_built_in() {
        for name in Scenario::BUILT_IN {
            let scenario = Scenario::load(name).unwrap();
            assert_eq!(scenario.name, name);
        }
        assert!(Scenario::load("missing").is_err());
    }

    #[test]
    fn test_reference_steps() {
        let scenario = Scenario::load("reference").unwrap();
        let publishes = scenario
            .steps
            .iter()
            .filter(|step| matches!(step, ScenarioStep::Publish { .. }))
            .count();
        assert_eq!(publishes, 9);
        assert_eq!(scenario.steps.len(), 9 + 8 + 4);
    }

    #[test]
    fn test_scenario_from_json() {
        let json = r#"{
            "name": "custom",
            "description": "one hop",
            "steps": [
                {"Publish": {"base": "AAA", "quote": "BBB", "price": "2"}},
                {"Convert": {"from": "BBB", "to": "AAA", "amount": "4", "expect": {"Price": "2.0000"}}},
                {"Convert": {"from": "AAA", "to": "CCC", "amount": "1", "expect": "NotFound"}}
            ]
        }"#;

        let scenario = Scenario::from_json(json).unwrap();
        assert_eq!(scenario.steps.len(), 3);
        assert!(Scenario::from_json("{}").is_err());
    }
}
