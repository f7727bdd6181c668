//! Chemical formulas and elemental composition.
//!
//! Formulas are parsed into an element -> stoichiometric amount map.
//! Amounts may be decimal (`LiNi0.6Mn0.2Co0.2O2`) and groups may be nested
//! with round or square brackets (`Ca3(PO4)2`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::elements::atomic_mass;
use crate::error::{LciError, LciResult};
use crate::quantity::Quantity;

const TOKEN_PATTERN: &str = r"([A-Z][a-z]?)|(\d+(?:\.\d+)?)|([\(\[])|([\)\]])|(\s+)|(.)";

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Element(String),
    Amount(f64),
    Open,
    Close,
}

/// A parsed chemical formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalFormula {
    pub formula: String,
    pub composition: BTreeMap<String, f64>,
}

impl ChemicalFormula {
    pub fn parse(formula: &str) -> LciResult<Self> {
        let tokens = tokenize(formula)?;
        if tokens.is_empty() {
            return Err(LciError::invalid_formula(formula, "formula is empty"));
        }

        let mut pos = 0;
        let composition = parse_group(formula, &tokens, &mut pos, 0)?;
        for symbol in composition.keys() {
            if atomic_mass(symbol).is_none() {
                return Err(LciError::UnknownElement {
                    symbol: symbol.clone(),
                });
            }
        }

        if composition.values().sum::<f64>() <= 0.0 {
            return Err(LciError::invalid_formula(formula, "formula has no atoms"));
        }

        Ok(Self {
            formula: formula.to_string(),
            composition,
        })
    }

    /// Atomic mass contributed by each element (relative mass x amount).
    pub fn mass_per_element(&self) -> BTreeMap<String, f64> {
        self.composition
            .iter()
            .filter_map(|(symbol, amount)| {
                atomic_mass(symbol).map(|mass| (symbol.clone(), mass * amount))
            })
            .collect()
    }

    /// Molar mass in g/mol.
    pub fn molar_mass(&self) -> f64 {
        self.mass_per_element().values().sum()
    }

    /// Mass fraction of each element; sums to 1.0.
    pub fn molar_share(&self) -> BTreeMap<String, f64> {
        let mass_per_element = self.mass_per_element();
        let total: f64 = mass_per_element.values().sum();
        mass_per_element
            .into_iter()
            .map(|(symbol, mass)| (symbol, mass / total))
            .collect()
    }

    /// Splits a mass of this compound into per-element masses.
    pub fn element_masses(&self, quantity: &Quantity) -> BTreeMap<String, Quantity> {
        self.molar_share()
            .into_iter()
            .map(|(symbol, share)| {
                (symbol, Quantity::new(quantity.value * share, quantity.unit.clone()))
            })
            .collect()
    }
}

fn tokenize(formula: &str) -> LciResult<Vec<Token>> {
    let pattern =
        Regex::new(TOKEN_PATTERN).map_err(|e| LciError::invalid_formula(formula, e.to_string()))?;

    let mut tokens = Vec::new();
    for caps in pattern.captures_iter(formula) {
        if let Some(symbol) = caps.get(1) {
            tokens.push(Token::Element(symbol.as_str().to_string()));
        } else if let Some(amount) = caps.get(2) {
            let value = amount
                .as_str()
                .parse::<f64>()
                .map_err(|e| LciError::invalid_formula(formula, e.to_string()))?;
            tokens.push(Token::Amount(value));
        } else if caps.get(3).is_some() {
            tokens.push(Token::Open);
        } else if caps.get(4).is_some() {
            tokens.push(Token::Close);
        } else if let Some(other) = caps.get(6) {
            return Err(LciError::invalid_formula(
                formula,
                format!("unexpected character '{}'", other.as_str()),
            ));
        }
    }
    Ok(tokens)
}

fn parse_group(
    formula: &str,
    tokens: &[Token],
    pos: &mut usize,
    depth: usize,
) -> LciResult<BTreeMap<String, f64>> {
    let mut composition: BTreeMap<String, f64> = BTreeMap::new();

    while *pos < tokens.len() {
        match &tokens[*pos] {
            Token::Element(symbol) => {
                *pos += 1;
                let amount = take_amount(tokens, pos);
                *composition.entry(symbol.clone()).or_insert(0.0) += amount;
            }
            Token::Open => {
                *pos += 1;
                let inner = parse_group(formula, tokens, pos, depth + 1)?;
                let multiplier = take_amount(tokens, pos);
                for (symbol, amount) in inner {
                    *composition.entry(symbol).or_insert(0.0) += amount * multiplier;
                }
            }
            Token::Close => {
                if depth == 0 {
                    return Err(LciError::invalid_formula(formula, "unbalanced closing bracket"));
                }
                *pos += 1;
                return Ok(composition);
            }
            Token::Amount(value) => {
                return Err(LciError::invalid_formula(
                    formula,
                    format!("amount {} does not follow an element or group", value),
                ));
            }
        }
    }

    if depth > 0 {
        return Err(LciError::invalid_formula(formula, "unclosed bracket"));
    }
    Ok(composition)
}

fn take_amount(tokens: &[Token], pos: &mut usize) -> f64 {
    match tokens.get(*pos) {
        Some(Token::Amount(value)) => {
            *pos += 1;
            *value
        }
        _ => 1.0,
    }
}
