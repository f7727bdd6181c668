//! Typed failures raised by the LCI core.
//!
//! Every operation fails fast: the first violation is returned to the caller
//! and nothing is retried or recovered internally.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LciError {
    #[error("Units {left} and {right} are not compatible")]
    UnitMismatch { left: String, right: String },

    #[error("Products {left} and {right} are not compatible")]
    ProductMismatch { left: String, right: String },

    #[error("Sum of quantities in BoM of {product} ({bom_total}) is not equal to reference quantity ({reference})")]
    BomReferenceQuantityMismatch {
        product: String,
        bom_total: String,
        reference: String,
    },

    #[error("Products influencing the {table} of {process} are missing from its inputs: {missing:?}")]
    Coherency {
        process: String,
        table: String,
        missing: Vec<String>,
    },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Cyclic BoM detected: {}", path.join(" -> "))]
    CyclicBom { path: Vec<String> },

    #[error("Product not found: {name}")]
    ProductNotFound { name: String },

    #[error("Invalid chemical formula '{formula}': {message}")]
    InvalidFormula { formula: String, message: String },

    #[error("Unknown element symbol '{symbol}'")]
    UnknownElement { symbol: String },

    #[error("Route {route} is inconsistent: {message}")]
    RouteInconsistency { route: String, message: String },
}

impl LciError {
    pub fn unit_mismatch(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::UnitMismatch {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn product_mismatch(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::ProductMismatch {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn product_not_found(name: impl Into<String>) -> Self {
        Self::ProductNotFound { name: name.into() }
    }

    pub fn invalid_formula(formula: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormula {
            formula: formula.into(),
            message: message.into(),
        }
    }

    pub fn route_inconsistency(route: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RouteInconsistency {
            route: route.into(),
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnitMismatch { .. } => "UNIT_MISMATCH",
            Self::ProductMismatch { .. } => "PRODUCT_MISMATCH",
            Self::BomReferenceQuantityMismatch { .. } => "BOM_REFERENCE_QUANTITY_MISMATCH",
            Self::Coherency { .. } => "COHERENCY_ERROR",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::CyclicBom { .. } => "CYCLIC_BOM",
            Self::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            Self::InvalidFormula { .. } => "INVALID_FORMULA",
            Self::UnknownElement { .. } => "UNKNOWN_ELEMENT",
            Self::RouteInconsistency { .. } => "ROUTE_INCONSISTENCY",
        }
    }
}

pub type LciResult<T> = Result<T, LciError>;
