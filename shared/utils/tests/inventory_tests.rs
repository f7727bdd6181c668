//! End-to-end ingestion tests: inventory tables in, resolved recycling
//! processes out.

use batterway_models::{ProcessFlows, ResolutionState};
use batterway_utils::inventory::{
    loader::{
        BOM_TABLE, CHEMICAL_COMPOUNDS_TABLE, FIXED_LCI_TABLE, PROCESSES_TABLE, PRODUCTS_TABLE,
        RELATIVE_LCI_TABLE, UNITS_TABLE,
    },
    CsvTableReader, Inventory, InventoryTables,
};
use std::fs;
use std::path::PathBuf;

const UNITS: &str = "\
name;iri
kg;http://qudt.org/vocab/unit/KiloGM
MJ;
";

const PRODUCTS: &str = "\
name;iri;reference_quantity;unit;BoM_id
water;;1;kg;
heat;;1;MJ;
vapor;;1;kg;
battery_pack;https://example.org/battery_pack;1;kg;pack_bom
module;;1;kg;module_bom
casing;;1;kg;
";

const CHEMICAL_COMPOUNDS: &str = "\
name;iri;reference_quantity;unit;BoM_id;chemical_formula
nmc111;;1;kg;;LiNi0.33Mn0.33Co0.33O2
graphite;;1;kg;;C
";

const BOM: &str = "\
BoMId;Material;Quantity;Unit
pack_bom;module;0.9;kg
pack_bom;casing;0.1;kg
module_bom;nmc111;0.6;kg
module_bom;graphite;0.4;kg
";

const PROCESSES: &str = "\
process_id;direction;product;quantity;unit
drying;input;water;0;kg
drying;input;battery_pack;0;kg
drying;input;heat;0;MJ
drying;output;vapor;0;kg
";

const RELATIVE_LCI: &str = "\
lci_id;direction;influencer;influenced;qty
drying;input;water;heat;1.0
drying;output;water;vapor;3.0
drying;input;graphite;heat;0.5
";

const FIXED_LCI: &str = "\
product;quantity
water;1.0
battery_pack;10
";

fn tables() -> InventoryTables {
    let reader = CsvTableReader::default();
    InventoryTables {
        units: reader.read(UNITS_TABLE, UNITS.as_bytes()).unwrap(),
        products: reader.read(PRODUCTS_TABLE, PRODUCTS.as_bytes()).unwrap(),
        chemical_compounds: reader
            .read(CHEMICAL_COMPOUNDS_TABLE, CHEMICAL_COMPOUNDS.as_bytes())
            .unwrap(),
        bom_lines: reader.read(BOM_TABLE, BOM.as_bytes()).unwrap(),
        process_flows: reader.read(PROCESSES_TABLE, PROCESSES.as_bytes()).unwrap(),
        relative_lcis: reader.read(RELATIVE_LCI_TABLE, RELATIVE_LCI.as_bytes()).unwrap(),
        fixed_lcis: reader.read(FIXED_LCI_TABLE, FIXED_LCI.as_bytes()).unwrap(),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_inventory_products() {
    let inventory = Inventory::from_tables(tables()).unwrap();

    assert_eq!(inventory.products().count(), 8);
    assert_eq!(
        inventory.unit("kg").unwrap().iri.as_deref(),
        Some("http://qudt.org/vocab/unit/KiloGM")
    );
    assert!(inventory.unit("MJ").unwrap().iri.is_none());

    let pack = inventory.product("battery_pack").unwrap();
    assert_eq!(
        pack.external_identifier.as_deref(),
        Some("https://example.org/battery_pack")
    );
    assert!(!pack.is_raw_material());
    assert!(inventory.product("nmc111").unwrap().formula().is_some());

    let flat = pack.flatten().unwrap();
    assert_eq!(flat.len(), 3);
    assert!(close(flat.get("nmc111").unwrap().quantity.value, 0.54));
    assert!(close(flat.get("graphite").unwrap().quantity.value, 0.36));
    assert!(close(flat.get("casing").unwrap().quantity.value, 0.1));
}

#[test]
fn test_resolve_process_with_fixed_inputs_from_table() {
    let inventory = Inventory::from_tables(tables()).unwrap();
    let mut process = inventory.get_recycling_process("drying").unwrap();
    assert_eq!(process.state(), ResolutionState::Unresolved);
    assert_eq!(process.inputs().len(), 3);
    assert_eq!(process.outputs().len(), 1);

    let fixed = inventory.fixed_inputs().clone();
    process.update_fixed_input_lci(fixed).unwrap();
    assert_eq!(process.state(), ResolutionState::Resolved);

    // 1 kg water and 3.6 kg graphite from the flattened pack.
    let heat = process.computed_input_bom().unwrap().get("heat").unwrap();
    assert!(close(heat.quantity.value, 1.0 + 3.6 * 0.5));
    assert_eq!(heat.quantity.unit.name, "MJ");

    let vapor = process.computed_output_bom().unwrap().get("vapor").unwrap();
    assert!(close(vapor.quantity.value, 3.0));
}

#[test]
fn test_incoherent_ratio_table_rejected() {
    let mut tables = tables();
    let reader = CsvTableReader::default();
    tables.relative_lcis = reader
        .read(
            RELATIVE_LCI_TABLE,
            "lci_id;direction;influencer;influenced;qty\ndrying;output;vapor;heat;1.0\n".as_bytes(),
        )
        .unwrap();
    let inventory = Inventory::from_tables(tables).unwrap();
    let error = inventory.get_recycling_process("drying").unwrap_err();
    assert_eq!(error.error_code(), "COHERENCY_ERROR");
}

#[test]
fn test_load_from_directory() {
    let dir: PathBuf = std::env::temp_dir().join(format!("batterway-inventory-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    for (table, content) in [
        (UNITS_TABLE, UNITS),
        (PRODUCTS_TABLE, PRODUCTS),
        (CHEMICAL_COMPOUNDS_TABLE, CHEMICAL_COMPOUNDS),
        (BOM_TABLE, BOM),
        (PROCESSES_TABLE, PROCESSES),
        (RELATIVE_LCI_TABLE, RELATIVE_LCI),
    ] {
        fs::write(dir.join(table), content).unwrap();
    }

    let config = batterway_utils::InventoryConfig {
        data_dir: dir.display().to_string(),
        ..Default::default()
    };
    let inventory = Inventory::load(&config).unwrap();
    assert!(inventory.fixed_inputs().is_empty());
    assert_eq!(inventory.process_names().collect::<Vec<_>>(), vec!["drying"]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_required_table() {
    let config = batterway_utils::InventoryConfig {
        data_dir: std::env::temp_dir()
            .join("batterway-missing-inventory")
            .display()
            .to_string(),
        ..Default::default()
    };
    let error = Inventory::load(&config).unwrap_err();
    assert_eq!(error.error_code(), "IO_ERROR");
}
