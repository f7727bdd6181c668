//! BoM flattening
//!
//! Reduces a nested product tree to a BoM of raw materials only. Sub-BoMs
//! are expressed per reference quantity of their product, so a composite
//! entry contributes its own flattened BoM multiplied by the entry quantity.

use tracing::{debug, trace};

use crate::bom::Bom;
use crate::error::{LciError, LciResult};
use crate::instance::ProductInstance;
use crate::product::{Product, ProductId, ProductRef};

impl Product {
    /// Flattens this product into a leaf-only BoM. A raw material flattens
    /// to itself at its reference quantity.
    pub fn flatten(self: &ProductRef) -> LciResult<Bom> {
        let mut path = Vec::new();
        let flattened = flatten_product(self, &mut path)?;
        debug!(
            product = %self.name,
            leaves = flattened.len(),
            total = flattened.quantity_total(),
            "Flattened product BoM"
        );
        Ok(flattened)
    }
}

impl ProductInstance {
    /// Flattens the instance's product and scales it by the instance quantity.
    /// The instance quantity must be in the product's reference unit, else
    /// this fails with [`LciError::UnitMismatch`].
    pub fn flatten(&self) -> LciResult<Bom> {
        self.product.flatten()?.multiply(&self.quantity)
    }
}

/// Flattens every entry of `bom` and merges the results. Raw materials are
/// kept at their entry quantity.
pub fn flatten_bom(bom: &Bom) -> LciResult<Bom> {
    let mut path = Vec::new();
    flatten_entries(bom, &mut path)
}

fn flatten_product(product: &ProductRef, path: &mut Vec<ProductId>) -> LciResult<Bom> {
    let bom = match product.bom() {
        Some(bom) => bom,
        None => {
            return Ok(Bom::single(ProductInstance::new(
                product.clone(),
                product.reference_quantity.clone(),
            )))
        }
    };

    if path.contains(product.id()) {
        let mut cycle: Vec<String> = path.iter().map(|id| id.to_string()).collect();
        cycle.push(product.name.clone());
        return Err(LciError::CyclicBom { path: cycle });
    }

    path.push(product.id().clone());
    let flattened = flatten_entries(bom, path);
    path.pop();
    flattened
}

fn flatten_entries(bom: &Bom, path: &mut Vec<ProductId>) -> LciResult<Bom> {
    let mut result = Bom::new();
    for instance in bom.instances() {
        if instance.product.is_raw_material() {
            result.merge(&Bom::single(instance.clone()))?;
        } else {
            trace!(product = %instance.product.name, quantity = %instance.quantity, "Descending into sub-product");
            let sub_bom = flatten_product(&instance.product, path)?;
            result.merge(&sub_bom.multiply(&instance.quantity)?)?;
        }
    }
    Ok(result)
}
