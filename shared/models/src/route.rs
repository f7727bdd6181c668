//! Ordered sequences of processes.

use std::collections::BTreeMap;
use tracing::info;

use crate::error::{LciError, LciResult};
use crate::process::{ProcessFlows, RecyclingProcess};

#[derive(Debug)]
pub struct Route<P> {
    pub id: String,
    processes: Vec<P>,
}

pub type RecyclingRoute = Route<RecyclingProcess>;

impl<P: ProcessFlows> Route<P> {
    pub fn new(id: impl Into<String>, processes: Vec<P>) -> Self {
        Self {
            id: id.into(),
            processes,
        }
    }

    pub fn processes(&self) -> &[P] {
        &self.processes
    }

    /// Every process must consume at least one product its predecessor
    /// produces.
    pub fn ensure_consistency(&self) -> LciResult<()> {
        for pair in self.processes.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            let linked = previous
                .outputs()
                .products()
                .any(|product| next.inputs().contains(product));
            if !linked {
                return Err(LciError::route_inconsistency(
                    &self.id,
                    format!("No product produced by {} used by {}", previous.name(), next.name()),
                ));
            }
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.processes.iter().map(|p| p.name()).collect();
        format!("{}: {}", self.id, names.join(" => "))
    }
}

impl Route<RecyclingProcess> {
    /// Resolves the first process with `fixed_quantities`, then feeds each
    /// process with the computed outputs of its predecessor that it takes
    /// as inputs.
    pub fn resolve<I, S>(&mut self, fixed_quantities: I) -> LciResult<()>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.ensure_consistency()?;
        let route_id = self.id.clone();
        let Some((first, rest)) = self.processes.split_first_mut() else {
            return Err(LciError::route_inconsistency(route_id, "route has no processes"));
        };

        first.update_fixed_input_lci(fixed_quantities)?;
        let mut previous: &RecyclingProcess = first;
        for next in rest.iter_mut() {
            let forwarded: BTreeMap<String, f64> = previous
                .computed_output_bom()
                .map(|bom| {
                    bom.instances()
                        .filter(|instance| next.inputs().contains(&instance.product))
                        .map(|instance| (instance.product.name.clone(), instance.quantity.value))
                        .collect()
                })
                .unwrap_or_default();

            if forwarded.is_empty() {
                return Err(LciError::route_inconsistency(
                    &route_id,
                    format!(
                        "No computed output of {} feeds {}",
                        previous.name(),
                        next.name()
                    ),
                ));
            }

            info!(route = %route_id, from = previous.name(), to = next.name(), forwarded = ?forwarded, "Forwarding computed outputs");
            next.update_fixed_input_lci(forwarded)?;
            previous = next;
        }
        Ok(())
    }
}
