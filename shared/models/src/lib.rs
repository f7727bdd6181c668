//! # Batterway Core Models
//!
//! Material-flow algebra for life-cycle-inventory analysis of batteries and
//! their recycling processes.
//!
//! ## Key Models
//!
//! - **Unit / Quantity**: unit-checked scalar arithmetic
//! - **Product**: a generic product (optionally owning a BoM) or a chemical compound
//! - **Bom**: product -> quantified instance mapping with summing merge semantics
//! - **ProductInstance**: "this much of this product"
//! - **RecyclingProcess**: ratio-driven propagation of fixed input quantities
//!   into derived input and output flows
//! - **Route**: ordered chains of processes
//!
//! ## Flattening
//!
//! [`Product::flatten`] recursively reduces a nested product tree into a BoM
//! of raw materials, summing contributions that reach the same raw material
//! through several branches.
//!
//! ```
//! use batterway_models::{Bom, Product, ProductInstance, Quantity, Unit};
//!
//! let kg = |v| Quantity::new(v, Unit::new("kg"));
//! let nickel = Product::new("nickel", kg(1.0)).into_ref();
//! let cobalt = Product::new("cobalt", kg(1.0)).into_ref();
//! let cell = Product::with_bom(
//!     "cell",
//!     kg(1.0),
//!     Bom::from_instances(vec![
//!         ProductInstance::new(nickel, kg(0.6)),
//!         ProductInstance::new(cobalt, kg(0.4)),
//!     ]),
//! )
//! .unwrap()
//! .into_ref();
//!
//! let flat = ProductInstance::new(cell, kg(10.0)).flatten().unwrap();
//! assert!((flat.get("nickel").unwrap().quantity.value - 6.0).abs() < 1e-9);
//! ```

pub mod bom;
pub mod chemical;
pub mod elements;
pub mod error;
pub mod flatten;
pub mod instance;
pub mod observer;
pub mod process;
pub mod product;
pub mod quantity;
pub mod ratio;
pub mod route;
pub mod unit;


pub use bom::{Bom, BomReport, BomReportEntry};
pub use chemical::ChemicalFormula;
pub use error::{LciError, LciResult};
pub use flatten::flatten_bom;
pub use instance::{InstanceOperand, ProductInstance};
pub use observer::{ResolutionEvent, ResolutionObserver, TracingObserver};
pub use process::{Process, ProcessFlows, RecyclingProcess, ResolutionState};
pub use product::{Product, ProductId, ProductKind, ProductRef};
pub use quantity::{Operand, Quantity};
pub use ratio::{Ratio, RatioTable};
pub use route::{RecyclingRoute, Route};
pub use unit::Unit;
