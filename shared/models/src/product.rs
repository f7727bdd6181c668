//! Products and their decomposition.
//!
//! A product is either generic (optionally owning a BoM) or a chemical
//! compound (always a raw material). Products are shared between BoMs
//! through [`ProductRef`] and keyed by [`ProductId`], which is derived from
//! the product name.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::bom::Bom;
use crate::chemical::ChemicalFormula;
use crate::error::{LciError, LciResult};
use crate::quantity::Quantity;

/// Shared handle to an immutable product.
pub type ProductRef = Arc<Product>;

/// Relative tolerance used when checking a BoM total against its product's
/// reference quantity.
const REFERENCE_TOLERANCE: f64 = 1e-9;

/// Stable identity key of a product within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub enum ProductKind {
    Generic { bom: Option<Bom> },
    Chemical { formula: ChemicalFormula },
}

#[derive(Debug, Clone)]
pub struct Product {
    id: ProductId,
    pub name: String,
    pub external_identifier: Option<String>,
    pub reference_quantity: Quantity,
    pub kind: ProductKind,
}

impl Product {
    /// Creates a raw material.
    pub fn new(name: impl Into<String>, reference_quantity: Quantity) -> Self {
        let name = name.into();
        Self {
            id: ProductId::new(name.clone()),
            name,
            external_identifier: None,
            reference_quantity,
            kind: ProductKind::Generic { bom: None },
        }
    }

    /// Creates a composite product. The BoM's total must equal the
    /// reference quantity in both unit and value.
    pub fn with_bom(name: impl Into<String>, reference_quantity: Quantity, bom: Bom) -> LciResult<Self> {
        let mut product = Self::new(name, reference_quantity);
        product.check_bom_total(&bom)?;
        product.kind = ProductKind::Generic { bom: Some(bom) };
        Ok(product)
    }

    /// Creates a chemical compound from its formula.
    pub fn chemical(name: impl Into<String>, reference_quantity: Quantity, formula: &str) -> LciResult<Self> {
        let mut product = Self::new(name, reference_quantity);
        product.kind = ProductKind::Chemical {
            formula: ChemicalFormula::parse(formula)?,
        };
        Ok(product)
    }

    pub fn with_external_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.external_identifier = Some(identifier.into());
        self
    }

    pub fn into_ref(self) -> ProductRef {
        Arc::new(self)
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn bom(&self) -> Option<&Bom> {
        match &self.kind {
            ProductKind::Generic { bom } => bom.as_ref(),
            ProductKind::Chemical { .. } => None,
        }
    }

    /// A product without a BoM is a raw material.
    pub fn is_raw_material(&self) -> bool {
        self.bom().is_none()
    }

    pub fn formula(&self) -> Option<&ChemicalFormula> {
        match &self.kind {
            ProductKind::Chemical { formula } => Some(formula),
            ProductKind::Generic { .. } => None,
        }
    }

    pub fn molar_mass(&self) -> Option<f64> {
        self.formula().map(ChemicalFormula::molar_mass)
    }

    pub fn mass_per_element(&self) -> Option<BTreeMap<String, f64>> {
        self.formula().map(ChemicalFormula::mass_per_element)
    }

    pub fn molar_share(&self) -> Option<BTreeMap<String, f64>> {
        self.formula().map(ChemicalFormula::molar_share)
    }

    fn check_bom_total(&self, bom: &Bom) -> LciResult<()> {
        let reference = &self.reference_quantity;
        let mismatch = |bom_total: String| LciError::BomReferenceQuantityMismatch {
            product: self.name.clone(),
            bom_total,
            reference: reference.to_string(),
        };

        let total = match bom.total_quantity()? {
            Some(total) => total,
            None => Quantity::zero(reference.unit.clone()),
        };
        if total.unit != reference.unit {
            return Err(mismatch(total.to_string()));
        }

        let tolerance = REFERENCE_TOLERANCE * reference.value.abs().max(1.0);
        if (total.value - reference.value).abs() > tolerance {
            return Err(mismatch(total.to_string()));
        }
        Ok(())
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[Ref:{}]", self.name, self.reference_quantity)?;
        if let Some(bom) = self.bom() {
            write!(f, " {}", bom)?;
        }
        Ok(())
    }
}
