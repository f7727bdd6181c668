pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod validation;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::inventory::{CsvTableReader, FlowDirection, Inventory, InventoryTables};
pub use crate::logging::*;
pub use crate::validation::*;
