use batterway_models::{Bom, BomReport};
use batterway_utils::inventory::{loader::FIXED_LCI_TABLE, FixedLciRecord};
use batterway_utils::{
    validate_fixed_quantities, BatterwayError, BatterwayResult, CsvTableReader, Inventory,
    ResolutionConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use tracing::{debug, info};

/// Outcome of resolving one recycling process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub process: String,
    pub fixed_inputs: BTreeMap<String, f64>,
    pub computed_inputs: BomReport,
    pub computed_outputs: BomReport,
    /// Elemental mass of the process inputs once fixed, by element symbol.
    pub input_elements: BTreeMap<String, f64>,
}

pub struct LciResolver {
    inventory: Inventory,
    reader: CsvTableReader,
}

impl LciResolver {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            reader: CsvTableReader::default(),
        }
    }

    pub fn with_reader(mut self, reader: CsvTableReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn resolve(&self, settings: &ResolutionConfig) -> BatterwayResult<ResolutionReport> {
        let process_name = self.process_name(settings)?;
        let fixed_inputs = self.fixed_inputs(settings)?;
        validate_fixed_quantities(&fixed_inputs)?;

        info!(process = %process_name, fixed = fixed_inputs.len(), "Resolving recycling process");
        let mut process = self.inventory.get_recycling_process(&process_name)?;
        process.update_fixed_input_lci(fixed_inputs.clone())?;

        let empty = Bom::default();
        let computed_inputs = process.computed_input_bom().unwrap_or(&empty).to_report();
        let computed_outputs = process.computed_output_bom().unwrap_or(&empty).to_report();
        let input_elements = process
            .process()
            .input_mass_per_element()?
            .into_iter()
            .map(|(element, quantity)| (element, quantity.value))
            .collect();

        Ok(ResolutionReport {
            process: process_name,
            fixed_inputs,
            computed_inputs,
            computed_outputs,
            input_elements,
        })
    }

    /// The configured process, or the only process of the inventory.
    fn process_name(&self, settings: &ResolutionConfig) -> BatterwayResult<String> {
        if let Some(name) = &settings.process {
            return Ok(name.clone());
        }
        let names: Vec<&str> = self.inventory.process_names().collect();
        match names.as_slice() {
            [only] => Ok(only.to_string()),
            [] => Err(BatterwayError::inventory("The inventory defines no process")),
            _ => Err(BatterwayError::configuration(format!(
                "resolution.process must name one of: {}",
                names.join(", ")
            ))),
        }
    }

    /// Fixed quantities from the inventory, then the fixed-input file, then
    /// the inline configuration; later sources win per product.
    fn fixed_inputs(&self, settings: &ResolutionConfig) -> BatterwayResult<BTreeMap<String, f64>> {
        let mut fixed = self.inventory.fixed_inputs().clone();

        if let Some(path) = &settings.fixed_inputs_file {
            let file = File::open(path).map_err(|e| BatterwayError::io(path, e.to_string()))?;
            let records: Vec<FixedLciRecord> = self.reader.read(FIXED_LCI_TABLE, file)?;
            debug!(path = %path, rows = records.len(), "Read fixed inputs");
            fixed.extend(records.into_iter().map(|r| (r.product, r.quantity)));
        }

        fixed.extend(settings.fixed_inputs.iter().map(|(k, v)| (k.clone(), *v)));
        Ok(fixed)
    }
}

fn write_bom(f: &mut fmt::Formatter<'_>, title: &str, bom: &BomReport) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    for entry in &bom.entries {
        writeln!(f, "  {}: {} {}", entry.product, round(entry.value), entry.unit)?;
    }
    Ok(())
}

fn round(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Process: {}", self.process)?;
        writeln!(f, "Fixed inputs:")?;
        for (product, value) in &self.fixed_inputs {
            writeln!(f, "  {}: {}", product, value)?;
        }
        write_bom(f, "Computed inputs", &self.computed_inputs)?;
        write_bom(f, "Computed outputs", &self.computed_outputs)?;
        if !self.input_elements.is_empty() {
            writeln!(f, "Input elements:")?;
            for (element, value) in &self.input_elements {
                writeln!(f, "  {}: {}", element, round(*value))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batterway_utils::inventory::{
        loader::{BOM_TABLE, CHEMICAL_COMPOUNDS_TABLE, PROCESSES_TABLE, PRODUCTS_TABLE, RELATIVE_LCI_TABLE, UNITS_TABLE},
        InventoryTables,
    };

    fn inventory() -> Inventory {
        let reader = CsvTableReader::default();
        let tables = InventoryTables {
            units: reader.read(UNITS_TABLE, "name;iri\nkg;\n".as_bytes()).unwrap(),
            products: reader
                .read(
                    PRODUCTS_TABLE,
                    "name;iri;reference_quantity;unit;BoM_id\nwater;;1;kg;\nheat;;1;kg;\nvapor;;1;kg;\n".as_bytes(),
                )
                .unwrap(),
            chemical_compounds: reader
                .read(
                    CHEMICAL_COMPOUNDS_TABLE,
                    "name;iri;reference_quantity;unit;BoM_id;chemical_formula\nnmc111;;1;kg;;LiNi0.33Mn0.33Co0.33O2\n"
                        .as_bytes(),
                )
                .unwrap(),
            bom_lines: reader.read(BOM_TABLE, "BoMId;Material;Quantity;Unit\n".as_bytes()).unwrap(),
            process_flows: reader
                .read(
                    PROCESSES_TABLE,
                    "process_id;direction;product;quantity;unit\n\
                     drying;input;water;1;kg\n\
                     drying;input;nmc111;1;kg\n\
                     drying;output;vapor;0;kg\n"
                        .as_bytes(),
                )
                .unwrap(),
            relative_lcis: reader
                .read(
                    RELATIVE_LCI_TABLE,
                    "lci_id;direction;influencer;influenced;qty\n\
                     drying;input;water;heat;1.0\n\
                     drying;output;water;vapor;3.0\n"
                        .as_bytes(),
                )
                .unwrap(),
            fixed_lcis: Vec::new(),
        };
        Inventory::from_tables(tables).unwrap()
    }

    fn settings(fixed: &[(&str, f64)]) -> ResolutionConfig {
        ResolutionConfig {
            fixed_inputs: fixed.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..ResolutionConfig::default()
        }
    }

    #[test]
    fn test_resolve_single_process() {
        let report = LciResolver::new(inventory())
            .resolve(&settings(&[("water", 1.0), ("nmc111", 1.0)]))
            .unwrap();
        assert_eq!(report.process, "drying");
        assert_eq!(report.computed_inputs.entries.len(), 1);
        assert_eq!(report.computed_inputs.entries[0].product, "heat");
        assert!((report.computed_inputs.entries[0].value - 1.0).abs() < 1e-9);
        assert!((report.computed_outputs.entries[0].value - 3.0).abs() < 1e-9);
        assert!(report.input_elements["Li"] > 0.0);
        let element_total: f64 = report.input_elements.values().sum();
        assert!((element_total - 1.0).abs() < 1e-9);

        let text = report.to_string();
        assert!(text.contains("Process: drying"));
        assert!(text.contains("  vapor: 3 kg"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = LciResolver::new(inventory()).resolve(&settings(&[("water", 2.0)])).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["process"], "drying");
        assert_eq!(json["computed_outputs"]["entries"][0]["product"], "vapor");
        assert_eq!(json["computed_outputs"]["total"], 6.0);
    }

    #[test]
    fn test_unknown_process() {
        let mut config = settings(&[("water", 1.0)]);
        config.process = Some("smelting".to_string());
        let error = LciResolver::new(inventory()).resolve(&config).unwrap_err();
        assert_eq!(error.error_code(), "INVENTORY_ERROR");
    }

    #[test]
    fn test_fixed_input_validation() {
        let resolver = LciResolver::new(inventory());
        let error = resolver.resolve(&settings(&[("water", -1.0)])).unwrap_err();
        assert_eq!(error.error_code(), "VALIDATION_ERROR");

        let error = resolver.resolve(&settings(&[])).unwrap_err();
        assert_eq!(error.error_code(), "INVALID_ARGUMENT");

        let error = resolver.resolve(&settings(&[("lithium", 1.0)])).unwrap_err();
        assert_eq!(error.error_code(), "PRODUCT_NOT_FOUND");
    }

    #[test]
    fn test_inline_fixed_inputs_override_file() {
        let path = std::env::temp_dir().join(format!("batterway-fixed-{}.csv", std::process::id()));
        std::fs::write(&path, "product;quantity\nwater;5\nnmc111;2\n").unwrap();

        let mut config = settings(&[("water", 1.0)]);
        config.fixed_inputs_file = Some(path.display().to_string());
        let report = LciResolver::new(inventory()).resolve(&config).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.fixed_inputs.get("water"), Some(&1.0));
        assert_eq!(report.fixed_inputs.get("nmc111"), Some(&2.0));
        assert!((report.computed_outputs.entries[0].value - 3.0).abs() < 1e-9);
    }
}
