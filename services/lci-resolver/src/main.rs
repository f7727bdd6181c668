//! Batterway LCI Resolver
//!
//! Loads an inventory, fixes the input quantities of one recycling process,
//! and prints the derived input and output flows.

use anyhow::{Context, Result};
use batterway_utils::{init_logging, log_error, AppConfig, CsvTableReader, ErrorReport, Inventory, OutputFormat};
use tracing::info;

mod resolver;

use resolver::LciResolver;

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;
    info!("Starting Batterway LCI resolver");

    let inventory = Inventory::load(&config.inventory)
        .with_context(|| format!("Failed to load inventory from {}", config.inventory.data_dir))?;
    let reader = CsvTableReader::new(config.inventory.delimiter_byte()?);
    let resolver = LciResolver::new(inventory).with_reader(reader);

    let report = match resolver.resolve(&config.resolution) {
        Ok(report) => report,
        Err(e) => {
            log_error!(e, "Resolution failed");
            if config.resolution.output_format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&ErrorReport::from(&e))?);
            }
            return Err(e.into());
        }
    };

    match config.resolution.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", report),
    }

    info!(process = %report.process, "Resolution complete");
    Ok(())
}
