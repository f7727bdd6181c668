//! Row types of the inventory tables.
//!
//! Each table is a semicolon-separated file with a header row. Rows are
//! deserialized with serde and checked with `validator` before any product
//! is assembled from them.

use batterway_models::ChemicalFormula;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Which side of a process a row describes. In the relative LCI table,
/// `input` rows feed the input-demand ratios and `output` rows the output
/// ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Input,
    Output,
}

/// `units.csv`: `name;iri`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UnitRecord {
    #[validate(length(min = 1, message = "Unit name is required"))]
    pub name: String,
    #[validate(url)]
    pub iri: Option<String>,
}

/// `products.csv`: `name;iri;reference_quantity;unit;BoM_id`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductRecord {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[validate(url)]
    pub iri: Option<String>,
    #[validate(range(min = 0.0, message = "Reference quantity must not be negative"))]
    pub reference_quantity: f64,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    #[serde(rename = "BoM_id")]
    pub bom_id: Option<String>,
}

impl ProductRecord {
    /// The BoM identifier, ignoring blank cells.
    pub fn bom_id(&self) -> Option<&str> {
        self.bom_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// `chemical_compounds.csv`: the product columns plus `chemical_formula`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChemicalCompoundRecord {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[validate(url)]
    pub iri: Option<String>,
    #[validate(range(min = 0.0, message = "Reference quantity must not be negative"))]
    pub reference_quantity: f64,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    #[serde(rename = "BoM_id")]
    pub bom_id: Option<String>,
    #[validate(custom = "validate_chemical_formula")]
    pub chemical_formula: String,
}

/// `BoM.csv`: `BoMId;Material;Quantity;Unit`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BomLineRecord {
    #[serde(rename = "BoMId")]
    #[validate(length(min = 1, message = "BoM identifier is required"))]
    pub bom_id: String,
    #[serde(rename = "Material")]
    #[validate(length(min = 1, message = "Material is required"))]
    pub material: String,
    #[serde(rename = "Quantity")]
    #[validate(range(min = 0.0, message = "Quantity must not be negative"))]
    pub quantity: f64,
    #[serde(rename = "Unit")]
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
}

/// `processes.csv`: `process_id;direction;product;quantity;unit`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProcessFlowRecord {
    #[validate(length(min = 1, message = "Process identifier is required"))]
    pub process_id: String,
    pub direction: FlowDirection,
    #[validate(length(min = 1, message = "Product is required"))]
    pub product: String,
    #[validate(range(min = 0.0, message = "Quantity must not be negative"))]
    pub quantity: f64,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
}

/// `lci_relative.csv`: `lci_id;direction;influencer;influenced;qty`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelativeLciRecord {
    #[validate(length(min = 1, message = "LCI identifier is required"))]
    pub lci_id: String,
    pub direction: FlowDirection,
    #[validate(length(min = 1, message = "Influencing product is required"))]
    pub influencer: String,
    #[validate(length(min = 1, message = "Influenced product is required"))]
    pub influenced: String,
    pub qty: f64,
}

/// `fixed_lci.csv`: `product;quantity`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FixedLciRecord {
    #[validate(length(min = 1, message = "Product is required"))]
    pub product: String,
    #[validate(range(min = 0.0, message = "Fixed quantity must not be negative"))]
    pub quantity: f64,
}

fn validate_chemical_formula(formula: &str) -> Result<(), ValidationError> {
    match ChemicalFormula::parse(formula) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("invalid_chemical_formula")),
    }
}
