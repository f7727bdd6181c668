//! Diagnostics for recycling process resolution.

use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::bom::Bom;

/// Everything known about one completed resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionEvent<'a> {
    pub process: &'a str,
    pub fixed_inputs: &'a BTreeMap<String, f64>,
    pub basis: &'a Bom,
    pub computed_inputs: &'a Bom,
    pub computed_outputs: &'a Bom,
}

/// Receives one event per resolution of a recycling process.
pub trait ResolutionObserver: fmt::Debug {
    fn on_resolved(&self, event: &ResolutionEvent<'_>);
}

/// Default observer: one `tracing` record per resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn on_resolved(&self, event: &ResolutionEvent<'_>) {
        info!(
            process = event.process,
            fixed_inputs = ?event.fixed_inputs,
            computed_inputs = %event.computed_inputs,
            computed_outputs = %event.computed_outputs,
            "Recycling process resolved"
        );
    }
}
