use std::collections::BTreeMap;

use crate::product::{ProductId, ProductRef};

/// One linear influence: `ratio` units of `influenced` per unit of
/// `influencing`.
#[derive(Debug, Clone)]
pub struct Ratio {
    pub influencing: ProductRef,
    pub influenced: ProductRef,
    pub ratio: f64,
}

/// Ratio entries keyed by (influencing, influenced).
#[derive(Debug, Clone, Default)]
pub struct RatioTable {
    entries: BTreeMap<(ProductId, ProductId), Ratio>,
}

impl RatioTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ratios(ratios: impl IntoIterator<Item = (ProductRef, ProductRef, f64)>) -> Self {
        let mut table = Self::new();
        for (influencing, influenced, ratio) in ratios {
            table.insert(influencing, influenced, ratio);
        }
        table
    }

    /// Inserts or replaces the ratio of a pair.
    pub fn insert(&mut self, influencing: ProductRef, influenced: ProductRef, ratio: f64) {
        let key = (influencing.id().clone(), influenced.id().clone());
        self.entries.insert(
            key,
            Ratio {
                influencing,
                influenced,
                ratio,
            },
        );
    }

    pub fn get(&self, influencing: &str, influenced: &str) -> Option<f64> {
        self.entries
            .get(&(ProductId::new(influencing), ProductId::new(influenced)))
            .map(|entry| entry.ratio)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ratio> {
        self.entries.values()
    }

    pub fn influencing_products(&self) -> impl Iterator<Item = &ProductRef> {
        self.entries.values().map(|entry| &entry.influencing)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
