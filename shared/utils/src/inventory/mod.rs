//! Inventory ingestion
//!
//! Builds units, products, and recycling processes from the semicolon-
//! separated inventory tables. Products are assembled bottom-up so that a
//! composite is only created once every material of its BoM exists.

pub mod loader;
pub mod records;

pub use loader::{CsvTableReader, InventoryTables};
pub use records::{
    BomLineRecord, ChemicalCompoundRecord, FixedLciRecord, FlowDirection, ProcessFlowRecord,
    ProductRecord, RelativeLciRecord, UnitRecord,
};

use batterway_models::{
    Bom, LciError, Product, ProductInstance, ProductRef, Quantity, RatioTable, RecyclingProcess,
    Unit,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::InventoryConfig;
use crate::error::{BatterwayError, BatterwayResult};

/// Product row shared by generic products and chemical compounds.
#[derive(Debug, Clone)]
struct ProductDefinition {
    name: String,
    iri: Option<String>,
    reference_quantity: f64,
    unit: String,
    bom_id: Option<String>,
    formula: Option<String>,
}

impl From<ProductRecord> for ProductDefinition {
    fn from(record: ProductRecord) -> Self {
        let bom_id = record.bom_id().map(str::to_string);
        Self {
            name: record.name,
            iri: record.iri,
            reference_quantity: record.reference_quantity,
            unit: record.unit,
            bom_id,
            formula: None,
        }
    }
}

impl From<ChemicalCompoundRecord> for ProductDefinition {
    fn from(record: ChemicalCompoundRecord) -> Self {
        let bom_id = record.bom_id.as_deref().map(str::trim).filter(|id| !id.is_empty()).map(str::to_string);
        Self {
            name: record.name,
            iri: record.iri,
            reference_quantity: record.reference_quantity,
            unit: record.unit,
            bom_id,
            formula: Some(record.chemical_formula),
        }
    }
}

/// Resolved inventory: every unit and product by name, plus the flow and
/// ratio rows needed to instantiate recycling processes on demand.
#[derive(Debug, Clone)]
pub struct Inventory {
    units: BTreeMap<String, Unit>,
    products: BTreeMap<String, ProductRef>,
    process_flows: BTreeMap<String, Vec<ProcessFlowRecord>>,
    relative_lcis: BTreeMap<String, Vec<RelativeLciRecord>>,
    fixed_inputs: BTreeMap<String, f64>,
}

impl Inventory {
    /// Reads and resolves the inventory directory named in the configuration.
    pub fn load(config: &InventoryConfig) -> BatterwayResult<Self> {
        let reader = CsvTableReader::new(config.delimiter_byte()?);
        let dir = Path::new(&config.data_dir);
        info!(data_dir = %dir.display(), "Loading inventory");
        Self::from_tables(InventoryTables::read_dir(dir, &reader)?)
    }

    pub fn from_tables(tables: InventoryTables) -> BatterwayResult<Self> {
        let units = build_units(tables.units)?;

        let mut definitions: BTreeMap<String, ProductDefinition> = BTreeMap::new();
        let all_definitions = tables
            .products
            .into_iter()
            .map(ProductDefinition::from)
            .chain(tables.chemical_compounds.into_iter().map(ProductDefinition::from));
        for definition in all_definitions {
            if definitions.contains_key(&definition.name) {
                return Err(BatterwayError::inventory(format!(
                    "Product '{}' is defined more than once",
                    definition.name
                )));
            }
            definitions.insert(definition.name.clone(), definition);
        }

        let mut bom_lines: BTreeMap<String, Vec<BomLineRecord>> = BTreeMap::new();
        for line in tables.bom_lines {
            bom_lines.entry(line.bom_id.clone()).or_default().push(line);
        }

        let mut builder = ProductBuilder {
            definitions: &definitions,
            bom_lines: &bom_lines,
            units: &units,
            built: BTreeMap::new(),
            visiting: Vec::new(),
        };
        for name in definitions.keys() {
            builder.build(name)?;
        }
        let products = builder.built;

        let mut process_flows: BTreeMap<String, Vec<ProcessFlowRecord>> = BTreeMap::new();
        for flow in tables.process_flows {
            if !products.contains_key(&flow.product) {
                return Err(LciError::product_not_found(flow.product).into());
            }
            process_flows.entry(flow.process_id.clone()).or_default().push(flow);
        }

        let mut relative_lcis: BTreeMap<String, Vec<RelativeLciRecord>> = BTreeMap::new();
        for lci in tables.relative_lcis {
            for name in [&lci.influencer, &lci.influenced] {
                if !products.contains_key(name) {
                    return Err(LciError::product_not_found(name.clone()).into());
                }
            }
            relative_lcis.entry(lci.lci_id.clone()).or_default().push(lci);
        }
        if let Some(orphan) = relative_lcis.keys().find(|id| !process_flows.contains_key(*id)) {
            warn!(lci_id = %orphan, "Relative LCI has no matching process");
        }

        let mut fixed_inputs = BTreeMap::new();
        for fixed in tables.fixed_lcis {
            if !products.contains_key(&fixed.product) {
                return Err(LciError::product_not_found(fixed.product).into());
            }
            fixed_inputs.insert(fixed.product, fixed.quantity);
        }

        info!(
            units = units.len(),
            products = products.len(),
            processes = process_flows.len(),
            "Inventory resolved"
        );
        Ok(Self {
            units,
            products,
            process_flows,
            relative_lcis,
            fixed_inputs,
        })
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    pub fn product(&self, name: &str) -> Option<&ProductRef> {
        self.products.get(name)
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductRef> {
        self.products.values()
    }

    pub fn process_names(&self) -> impl Iterator<Item = &str> {
        self.process_flows.keys().map(String::as_str)
    }

    /// Fixed input quantities from `fixed_lci.csv`, empty when absent.
    pub fn fixed_inputs(&self) -> &BTreeMap<String, f64> {
        &self.fixed_inputs
    }

    /// Instantiates a fresh, unresolved recycling process. Input-direction
    /// ratio rows sharing the process identifier form the input-demand
    /// table; output-direction rows form the output table.
    pub fn get_recycling_process(&self, name: &str) -> BatterwayResult<RecyclingProcess> {
        let flows = self
            .process_flows
            .get(name)
            .ok_or_else(|| BatterwayError::inventory(format!("Unknown process '{}'", name)))?;

        let mut inputs = Bom::new();
        let mut outputs = Bom::new();
        for flow in flows {
            let instance = ProductInstance::new(
                self.require_product(&flow.product)?,
                Quantity::new(flow.quantity, self.require_unit(&flow.unit)?),
            );
            match flow.direction {
                FlowDirection::Input => inputs.insert(instance),
                FlowDirection::Output => outputs.insert(instance),
            };
        }

        let mut input_to_input = RatioTable::new();
        let mut input_to_output = RatioTable::new();
        for lci in self.relative_lcis.get(name).into_iter().flatten() {
            let table = match lci.direction {
                FlowDirection::Input => &mut input_to_input,
                FlowDirection::Output => &mut input_to_output,
            };
            table.insert(
                self.require_product(&lci.influencer)?,
                self.require_product(&lci.influenced)?,
                lci.qty,
            );
        }

        debug!(
            process = name,
            inputs = inputs.len(),
            outputs = outputs.len(),
            input_ratios = input_to_input.len(),
            output_ratios = input_to_output.len(),
            "Instantiating recycling process"
        );
        Ok(RecyclingProcess::new(
            name,
            inputs,
            outputs,
            input_to_input,
            input_to_output,
        )?)
    }

    fn require_product(&self, name: &str) -> BatterwayResult<ProductRef> {
        self.products
            .get(name)
            .cloned()
            .ok_or_else(|| LciError::product_not_found(name).into())
    }

    fn require_unit(&self, name: &str) -> BatterwayResult<Unit> {
        self.units
            .get(name)
            .cloned()
            .ok_or_else(|| BatterwayError::inventory(format!("Unknown unit '{}'", name)))
    }
}

fn build_units(records: Vec<UnitRecord>) -> BatterwayResult<BTreeMap<String, Unit>> {
    let mut units = BTreeMap::new();
    for record in records {
        if units.contains_key(&record.name) {
            return Err(BatterwayError::inventory(format!(
                "Unit '{}' is defined more than once",
                record.name
            )));
        }
        let unit = match record.iri {
            Some(iri) => Unit::with_iri(record.name.clone(), iri),
            None => Unit::new(record.name.clone()),
        };
        units.insert(record.name, unit);
    }
    Ok(units)
}

/// Depth-first product assembly. `visiting` is the chain of products whose
/// BoM is currently being built; meeting one of them again is a cycle.
struct ProductBuilder<'a> {
    definitions: &'a BTreeMap<String, ProductDefinition>,
    bom_lines: &'a BTreeMap<String, Vec<BomLineRecord>>,
    units: &'a BTreeMap<String, Unit>,
    built: BTreeMap<String, ProductRef>,
    visiting: Vec<String>,
}

impl ProductBuilder<'_> {
    fn build(&mut self, name: &str) -> BatterwayResult<ProductRef> {
        if let Some(product) = self.built.get(name) {
            return Ok(product.clone());
        }
        if let Some(start) = self.visiting.iter().position(|visited| visited == name) {
            let mut path = self.visiting[start..].to_vec();
            path.push(name.to_string());
            return Err(LciError::CyclicBom { path }.into());
        }

        let definitions = self.definitions;
        let definition = definitions
            .get(name)
            .ok_or_else(|| LciError::product_not_found(name))?;
        let reference_quantity = Quantity::new(definition.reference_quantity, self.unit(&definition.unit)?);

        let mut product = match (&definition.formula, &definition.bom_id) {
            (Some(formula), bom_id) => {
                if let Some(bom_id) = bom_id {
                    warn!(product = name, bom_id = %bom_id, "Ignoring BoM of chemical compound");
                }
                Product::chemical(name, reference_quantity, formula)?
            }
            (None, Some(bom_id)) => {
                self.visiting.push(name.to_string());
                let bom = self.build_bom(bom_id);
                self.visiting.pop();
                Product::with_bom(name, reference_quantity, bom?)?
            }
            (None, None) => Product::new(name, reference_quantity),
        };
        if let Some(iri) = &definition.iri {
            product = product.with_external_identifier(iri.clone());
        }

        let product = product.into_ref();
        self.built.insert(name.to_string(), product.clone());
        Ok(product)
    }

    fn build_bom(&mut self, bom_id: &str) -> BatterwayResult<Bom> {
        let bom_lines = self.bom_lines;
        let lines = bom_lines
            .get(bom_id)
            .ok_or_else(|| BatterwayError::inventory(format!("Unknown BoM '{}'", bom_id)))?;
        let mut bom = Bom::new();
        for line in lines {
            let material = self.build(&line.material)?;
            let quantity = Quantity::new(line.quantity, self.unit(&line.unit)?);
            if bom.contains_name(&line.material) {
                return Err(BatterwayError::inventory(format!(
                    "Material '{}' is listed more than once in BoM '{}'",
                    line.material, bom_id
                )));
            }
            bom.insert(ProductInstance::new(material, quantity));
        }
        Ok(bom)
    }

    fn unit(&self, name: &str) -> BatterwayResult<Unit> {
        self.units
            .get(name)
            .cloned()
            .ok_or_else(|| BatterwayError::inventory(format!("Unknown unit '{}'", name)))
    }
}
