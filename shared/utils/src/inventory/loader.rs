//! Delimited-table reading for the inventory files.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use validator::Validate;

use super::records::{
    BomLineRecord, ChemicalCompoundRecord, FixedLciRecord, ProcessFlowRecord, ProductRecord,
    RelativeLciRecord, UnitRecord,
};
use crate::error::{BatterwayError, BatterwayResult};
use crate::validation::format_validation_errors;

pub const UNITS_TABLE: &str = "units.csv";
pub const PRODUCTS_TABLE: &str = "products.csv";
pub const CHEMICAL_COMPOUNDS_TABLE: &str = "chemical_compounds.csv";
pub const BOM_TABLE: &str = "BoM.csv";
pub const PROCESSES_TABLE: &str = "processes.csv";
pub const RELATIVE_LCI_TABLE: &str = "lci_relative.csv";
pub const FIXED_LCI_TABLE: &str = "fixed_lci.csv";

#[derive(Debug, Clone, Copy)]
pub struct CsvTableReader {
    delimiter: u8,
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

impl CsvTableReader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Reads every row of `table`, failing on the first row that does not
    /// deserialize or validate. Row numbers in errors count the header as 1.
    pub fn read<T, R>(&self, table: &str, data: R) -> BatterwayResult<Vec<T>>
    where
        T: DeserializeOwned + Validate,
        R: Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(data);

        let mut rows = Vec::new();
        for (idx, result) in reader.deserialize::<T>().enumerate() {
            let row_number = idx + 2;
            let row = result
                .map_err(|e| BatterwayError::csv(table, format!("Row {}: {}", row_number, e)))?;
            row.validate().map_err(|errors| {
                BatterwayError::csv(
                    table,
                    format!("Row {}: {}", row_number, format_validation_errors(&errors)),
                )
            })?;
            rows.push(row);
        }

        debug!(table, rows = rows.len(), "Read inventory table");
        Ok(rows)
    }

    pub fn read_file<T>(&self, dir: &Path, table: &str) -> BatterwayResult<Vec<T>>
    where
        T: DeserializeOwned + Validate,
    {
        let path = dir.join(table);
        let file = File::open(&path)
            .map_err(|e| BatterwayError::io(path.display().to_string(), e.to_string()))?;
        self.read(table, file)
    }

    /// Like [`read_file`](Self::read_file), but a missing file yields `None`.
    pub fn read_optional_file<T>(&self, dir: &Path, table: &str) -> BatterwayResult<Option<Vec<T>>>
    where
        T: DeserializeOwned + Validate,
    {
        if !dir.join(table).exists() {
            debug!(table, "Optional inventory table absent");
            return Ok(None);
        }
        self.read_file(dir, table).map(Some)
    }
}

/// Raw rows of all inventory tables, before any cross-table resolution.
#[derive(Debug, Clone, Default)]
pub struct InventoryTables {
    pub units: Vec<UnitRecord>,
    pub products: Vec<ProductRecord>,
    pub chemical_compounds: Vec<ChemicalCompoundRecord>,
    pub bom_lines: Vec<BomLineRecord>,
    pub process_flows: Vec<ProcessFlowRecord>,
    pub relative_lcis: Vec<RelativeLciRecord>,
    pub fixed_lcis: Vec<FixedLciRecord>,
}

impl InventoryTables {
    pub fn read_dir(dir: &Path, reader: &CsvTableReader) -> BatterwayResult<Self> {
        Ok(Self {
            units: reader.read_file(dir, UNITS_TABLE)?,
            products: reader.read_file(dir, PRODUCTS_TABLE)?,
            chemical_compounds: reader.read_file(dir, CHEMICAL_COMPOUNDS_TABLE)?,
            bom_lines: reader.read_file(dir, BOM_TABLE)?,
            process_flows: reader.read_file(dir, PROCESSES_TABLE)?,
            relative_lcis: reader.read_file(dir, RELATIVE_LCI_TABLE)?,
            fixed_lcis: reader
                .read_optional_file(dir, FIXED_LCI_TABLE)?
                .unwrap_or_default(),
        })
    }
}
