//! Bill of Materials
//!
//! A mapping from product to "this much of that product". Adding two BoMs
//! sums the quantities of shared products, which is what lets diamond
//! shaped product trees accumulate instead of overwrite.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{LciError, LciResult};
use crate::instance::ProductInstance;
use crate::product::{Product, ProductId, ProductRef};
use crate::quantity::{Operand, Quantity};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bom {
    entries: BTreeMap<ProductId, ProductInstance>,
}

/// Serializable view of a BoM handed to reporting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomReport {
    pub entries: Vec<BomReportEntry>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomReportEntry {
    pub product: String,
    pub external_identifier: Option<String>,
    pub value: f64,
    pub unit: String,
}

impl Bom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a BoM from instances. A product given twice keeps the last
    /// instance.
    pub fn from_instances(instances: impl IntoIterator<Item = ProductInstance>) -> Self {
        let mut bom = Self::new();
        for instance in instances {
            bom.insert(instance);
        }
        bom
    }

    pub fn single(instance: ProductInstance) -> Self {
        Self::from_instances(std::iter::once(instance))
    }

    /// Inserts or replaces the entry for the instance's product.
    pub fn insert(&mut self, instance: ProductInstance) -> Option<ProductInstance> {
        self.entries.insert(instance.product.id().clone(), instance)
    }

    pub fn product_quantities(&self) -> &BTreeMap<ProductId, ProductInstance> {
        &self.entries
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductRef> {
        self.entries.values().map(|instance| &instance.product)
    }

    pub fn instances(&self) -> impl Iterator<Item = &ProductInstance> {
        self.entries.values()
    }

    pub fn get(&self, name: &str) -> Option<&ProductInstance> {
        self.entries.get(name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn contains(&self, product: &Product) -> bool {
        self.entries.contains_key(product.id())
    }

    pub fn contains_instance(&self, instance: &ProductInstance) -> bool {
        self.contains(&instance.product)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of entry values, regardless of unit.
    pub fn quantity_total(&self) -> f64 {
        self.entries.values().map(|instance| instance.quantity.value).sum()
    }

    /// Unit-checked sum of entry quantities; `None` for an empty BoM.
    pub fn total_quantity(&self) -> LciResult<Option<Quantity>> {
        Quantity::sum(self.entries.values().map(|instance| &instance.quantity))
    }

    /// Combines two BoMs; quantities of products present on both sides are
    /// summed.
    pub fn add(&self, other: &Bom) -> LciResult<Bom> {
        let mut combined = self.clone();
        combined.merge(other)?;
        Ok(combined)
    }

    /// In-place form of [`Bom::add`].
    pub fn merge(&mut self, other: &Bom) -> LciResult<()> {
        for (id, instance) in &other.entries {
            let merged = match self.entries.get(id) {
                Some(existing) => existing.add(instance)?,
                None => instance.clone(),
            };
            self.entries.insert(id.clone(), merged);
        }
        Ok(())
    }

    /// Multiplies every entry quantity by `factor`.
    pub fn multiply(&self, factor: impl Into<Operand>) -> LciResult<Bom> {
        let factor = factor.into();
        let entries = self
            .entries
            .iter()
            .map(|(id, instance)| Ok((id.clone(), instance.multiply(factor.clone())?)))
            .collect::<LciResult<BTreeMap<_, _>>>()?;
        Ok(Bom { entries })
    }

    /// Overwrites the quantity value of the named product, keeping its unit.
    pub fn set_quantity_of_product(&mut self, name: &str, value: f64) -> LciResult<()> {
        let instance = self
            .entries
            .get_mut(name)
            .ok_or_else(|| LciError::product_not_found(name))?;
        instance.quantity = Quantity::new(value, instance.quantity.unit.clone());
        Ok(())
    }

    pub fn to_report(&self) -> BomReport {
        BomReport {
            entries: self
                .entries
                .values()
                .map(|instance| BomReportEntry {
                    product: instance.product.name.clone(),
                    external_identifier: instance.product.external_identifier.clone(),
                    value: instance.quantity.value,
                    unit: instance.quantity.unit.name.clone(),
                })
                .collect(),
            total: self.quantity_total(),
        }
    }
}

impl fmt::Display for Bom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .entries
            .values()
            .map(|instance| format!("{}: {}", instance.product.name, instance.quantity))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}
