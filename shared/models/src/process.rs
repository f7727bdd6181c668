//! Processes and recycling processes.
//!
//! A [`RecyclingProcess`] carries two ratio tables describing how the
//! quantity of an input drives the quantity of other inputs and of outputs.
//! Resolving the process with a set of fixed input quantities recomputes
//! the derived input and output BoMs from scratch.

use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::bom::Bom;
use crate::error::{LciError, LciResult};
use crate::flatten::flatten_bom;
use crate::instance::ProductInstance;
use crate::observer::{ResolutionEvent, ResolutionObserver, TracingObserver};
use crate::product::ProductId;
use crate::quantity::Quantity;
use crate::ratio::RatioTable;

/// Shared view of anything with named input and output BoMs.
pub trait ProcessFlows {
    fn name(&self) -> &str;
    fn inputs(&self) -> &Bom;
    fn outputs(&self) -> &Bom;
}

#[derive(Debug, Clone)]
pub struct Process {
    pub name: String,
    pub inputs: Bom,
    pub outputs: Bom,
}

impl Process {
    pub fn new(name: impl Into<String>, inputs: Bom, outputs: Bom) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
        }
    }

    /// Elemental mass entering the process, summed over the chemical
    /// compounds of the flattened inputs.
    pub fn input_mass_per_element(&self) -> LciResult<BTreeMap<String, Quantity>> {
        mass_per_element(&self.inputs)
    }

    /// Elemental mass leaving the process.
    pub fn output_mass_per_element(&self) -> LciResult<BTreeMap<String, Quantity>> {
        mass_per_element(&self.outputs)
    }
}

impl ProcessFlows for Process {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &Bom {
        &self.inputs
    }

    fn outputs(&self) -> &Bom {
        &self.outputs
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : \n{}\n{}", self.name, self.inputs, self.outputs)
    }
}

fn mass_per_element(bom: &Bom) -> LciResult<BTreeMap<String, Quantity>> {
    let mut totals: BTreeMap<String, Quantity> = BTreeMap::new();
    for instance in flatten_bom(bom)?.instances() {
        let Some(formula) = instance.product.formula() else {
            continue;
        };
        for (symbol, mass) in formula.element_masses(&instance.quantity) {
            let total = match totals.get(&symbol) {
                Some(existing) => existing.add(&mass)?,
                None => mass,
            };
            totals.insert(symbol, total);
        }
    }
    Ok(totals)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolved,
}

#[derive(Debug)]
pub struct RecyclingProcess {
    process: Process,
    input_to_input: RatioTable,
    input_to_output: RatioTable,
    computed_input_bom: Option<Bom>,
    computed_output_bom: Option<Bom>,
    observer: Box<dyn ResolutionObserver>,
}

impl RecyclingProcess {
    /// Builds a recycling process. Every influencing product of both ratio
    /// tables must be among the inputs, directly or inside a composite input.
    pub fn new(
        name: impl Into<String>,
        inputs: Bom,
        outputs: Bom,
        input_to_input: RatioTable,
        input_to_output: RatioTable,
    ) -> LciResult<Self> {
        let recycling = Self {
            process: Process::new(name, inputs, outputs),
            input_to_input,
            input_to_output,
            computed_input_bom: None,
            computed_output_bom: None,
            observer: Box::new(TracingObserver),
        };
        recycling.ensure_coherency()?;
        Ok(recycling)
    }

    pub fn with_observer(mut self, observer: Box<dyn ResolutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn input_to_input_ratios(&self) -> &RatioTable {
        &self.input_to_input
    }

    pub fn input_to_output_ratios(&self) -> &RatioTable {
        &self.input_to_output
    }

    pub fn computed_input_bom(&self) -> Option<&Bom> {
        self.computed_input_bom.as_ref()
    }

    pub fn computed_output_bom(&self) -> Option<&Bom> {
        self.computed_output_bom.as_ref()
    }

    pub fn state(&self) -> ResolutionState {
        if self.computed_input_bom.is_some() && self.computed_output_bom.is_some() {
            ResolutionState::Resolved
        } else {
            ResolutionState::Unresolved
        }
    }

    fn ensure_coherency(&self) -> LciResult<()> {
        let basis = resolution_basis(&self.process.inputs)?;
        for (table, label) in [
            (&self.input_to_input, "input demand"),
            (&self.input_to_output, "output"),
        ] {
            let mut missing: Vec<String> = table
                .influencing_products()
                .filter(|product| !basis.contains(product))
                .map(|product| product.name.clone())
                .collect();
            if missing.is_empty() {
                continue;
            }
            missing.dedup();
            warn!(process = %self.process.name, table = label, missing = ?missing, "Incoherent ratio table");
            return Err(LciError::Coherency {
                process: self.process.name.clone(),
                table: label.to_string(),
                missing,
            });
        }
        Ok(())
    }

    /// Fixes the quantities of the named inputs and recomputes the derived
    /// input and output BoMs. Inputs not named in `fixed_quantities` are set
    /// to zero, so every call is a full recompute.
    pub fn update_fixed_input_lci<I, S>(&mut self, fixed_quantities: I) -> LciResult<()>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let fixed: BTreeMap<String, f64> = fixed_quantities
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        if fixed.is_empty() {
            return Err(LciError::invalid_argument("No input products provided."));
        }

        self.computed_input_bom = None;
        self.computed_output_bom = None;

        if let Some(unknown) = fixed.keys().find(|name| !self.process.inputs.contains_name(name)) {
            return Err(LciError::product_not_found(unknown.clone()));
        }
        // inputs left out of this call weigh nothing in the basis
        let names: Vec<String> = self
            .process
            .inputs
            .product_quantities()
            .keys()
            .map(|id| id.as_str().to_string())
            .collect();
        for name in &names {
            let value = fixed.get(name).copied().unwrap_or(0.0);
            self.process.inputs.set_quantity_of_product(name, value)?;
        }

        let basis = resolution_basis(&self.process.inputs)?;
        let computed_inputs = propagate(&self.input_to_input, &basis)?;
        let computed_outputs = propagate(&self.input_to_output, &basis)?;

        self.observer.on_resolved(&ResolutionEvent {
            process: &self.process.name,
            fixed_inputs: &fixed,
            basis: &basis,
            computed_inputs: &computed_inputs,
            computed_outputs: &computed_outputs,
        });

        self.computed_input_bom = Some(computed_inputs);
        self.computed_output_bom = Some(computed_outputs);
        Ok(())
    }
}

impl ProcessFlows for RecyclingProcess {
    fn name(&self) -> &str {
        &self.process.name
    }

    fn inputs(&self) -> &Bom {
        &self.process.inputs
    }

    fn outputs(&self) -> &Bom {
        &self.process.outputs
    }
}

/// The inputs themselves plus the raw materials of every composite input.
fn resolution_basis(inputs: &Bom) -> LciResult<Bom> {
    let mut basis = inputs.clone();
    for instance in inputs.instances().filter(|i| !i.product.is_raw_material()) {
        basis.merge(&instance.flatten()?)?;
    }
    Ok(basis)
}

/// Accumulates `basis[influencing] * ratio` per influenced product. The
/// result is expressed in each influenced product's reference unit; the
/// ratio carries the conversion.
fn propagate(table: &RatioTable, basis: &Bom) -> LciResult<Bom> {
    let mut accumulated: BTreeMap<ProductId, ProductInstance> = BTreeMap::new();
    for entry in table.iter() {
        let Some(source) = basis.get(entry.influencing.id().as_str()) else {
            continue;
        };
        let contribution = source.quantity.value * entry.ratio;
        debug!(
            influencing = %entry.influencing.name,
            influenced = %entry.influenced.name,
            ratio = entry.ratio,
            contribution,
            "Applying ratio"
        );
        let current = accumulated
            .remove(entry.influenced.id())
            .unwrap_or_else(|| ProductInstance::zero(entry.influenced.clone()));
        accumulated.insert(entry.influenced.id().clone(), current.add(contribution)?);
    }
    Ok(Bom::from_instances(accumulated.into_values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Product, ProductRef};
    use crate::unit::Unit;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn kg(value: f64) -> Quantity {
        Quantity::new(value, Unit::new("kg"))
    }

    fn leaf(name: &str) -> ProductRef {
        Product::new(name, kg(1.0)).into_ref()
    }

    #[derive(Debug, Default, Clone)]
    struct RecordingObserver {
        events: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl ResolutionObserver for RecordingObserver {
        fn on_resolved(&self, event: &ResolutionEvent<'_>) {
            self.events
                .borrow_mut()
                .push((event.process.to_string(), event.computed_outputs.to_string()));
        }
    }

    struct Fixture {
        water: ProductRef,
        nmc111: ProductRef,
        heat: ProductRef,
        vapor: ProductRef,
    }

    fn fixture() -> Fixture {
        Fixture {
            water: leaf("water"),
            nmc111: leaf("nmc111"),
            heat: leaf("heat"),
            vapor: leaf("vapor"),
        }
    }

    fn drying(f: &Fixture) -> RecyclingProcess {
        RecyclingProcess::new(
            "drying",
            Bom::from_instances(vec![
                ProductInstance::new(f.water.clone(), kg(1.0)),
                ProductInstance::new(f.nmc111.clone(), kg(1.0)),
            ]),
            Bom::new(),
            RatioTable::from_ratios(vec![(f.water.clone(), f.heat.clone(), 1.0)]),
            RatioTable::from_ratios(vec![(f.water.clone(), f.vapor.clone(), 3.0)]),
        )
        .unwrap()
    }

    #[test]
    fn test_resolution_scenario() {
        let f = fixture();
        let mut process = drying(&f);
        assert_eq!(process.state(), ResolutionState::Unresolved);

        process.update_fixed_input_lci([("water", 1.0)]).unwrap();

        assert_eq!(process.state(), ResolutionState::Resolved);
        let inputs = process.computed_input_bom().unwrap();
        let outputs = process.computed_output_bom().unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs.get("heat").unwrap().quantity, kg(1.0));
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.get("vapor").unwrap().quantity, kg(3.0));
    }

    #[test]
    fn test_resolution_is_linear_in_fixed_quantity() {
        let f = fixture();
        let mut process = drying(&f);
        process.update_fixed_input_lci([("water", 578.0)]).unwrap();
        assert_eq!(process.computed_output_bom().unwrap().get("vapor").unwrap().quantity, kg(1734.0));
        assert_eq!(process.process().inputs.get("water").unwrap().quantity, kg(578.0));

        // full recompute, no accumulation across calls
        process.update_fixed_input_lci([("water", 2.0)]).unwrap();
        assert_eq!(process.computed_output_bom().unwrap().get("vapor").unwrap().quantity, kg(6.0));
    }

    #[test]
    fn test_multiple_influencers_accumulate() {
        let f = fixture();
        let mut process = RecyclingProcess::new(
            "leaching",
            Bom::from_instances(vec![
                ProductInstance::new(f.water.clone(), kg(1.0)),
                ProductInstance::new(f.nmc111.clone(), kg(1.0)),
            ]),
            Bom::new(),
            RatioTable::new(),
            RatioTable::from_ratios(vec![
                (f.water.clone(), f.vapor.clone(), 0.5),
                (f.nmc111.clone(), f.vapor.clone(), 0.25),
                (f.nmc111.clone(), f.heat.clone(), 2.0),
            ]),
        )
        .unwrap();

        process.update_fixed_input_lci([("water", 4.0), ("nmc111", 4.0)]).unwrap();
        let outputs = process.computed_output_bom().unwrap();
        assert_eq!(outputs.get("vapor").unwrap().quantity, kg(3.0));
        assert_eq!(outputs.get("heat").unwrap().quantity, kg(8.0));
        assert!(process.computed_input_bom().unwrap().is_empty());
    }

    #[test]
    fn test_unfixed_inputs_contribute_nothing() {
        let f = fixture();
        let mut process = RecyclingProcess::new(
            "drying",
            Bom::from_instances(vec![
                ProductInstance::new(f.water.clone(), kg(1.0)),
                ProductInstance::new(f.nmc111.clone(), kg(1.0)),
            ]),
            Bom::new(),
            RatioTable::new(),
            RatioTable::from_ratios(vec![(f.nmc111.clone(), f.vapor.clone(), 2.0)]),
        )
        .unwrap();

        // nmc111 keeps its construction quantity of 1 kg but is not fixed
        process.update_fixed_input_lci([("water", 1.0)]).unwrap();
        assert_eq!(process.computed_output_bom().unwrap().get("vapor").unwrap().quantity, kg(0.0));

        process.update_fixed_input_lci([("nmc111", 5.0)]).unwrap();
        assert_eq!(process.computed_output_bom().unwrap().get("vapor").unwrap().quantity, kg(10.0));

        process.update_fixed_input_lci([("water", 1.0)]).unwrap();
        assert_eq!(process.computed_output_bom().unwrap().get("vapor").unwrap().quantity, kg(0.0));
        assert_eq!(process.process().inputs.get("nmc111").unwrap().quantity, kg(0.0));
        assert_eq!(process.process().inputs.get("water").unwrap().quantity, kg(1.0));
    }

    #[test]
    fn test_same_pair_in_both_tables() {
        let f = fixture();
        let mut process = RecyclingProcess::new(
            "heating",
            Bom::single(ProductInstance::new(f.water.clone(), kg(1.0))),
            Bom::new(),
            RatioTable::from_ratios(vec![(f.water.clone(), f.heat.clone(), 1.0)]),
            RatioTable::from_ratios(vec![(f.water.clone(), f.heat.clone(), 2.0)]),
        )
        .unwrap();

        process.update_fixed_input_lci([("water", 7.5)]).unwrap();
        let inputs = process.computed_input_bom().unwrap();
        let outputs = process.computed_output_bom().unwrap();
        assert_eq!(inputs.get("heat").unwrap().quantity, kg(7.5));
        assert_eq!(outputs.get("heat").unwrap().quantity, kg(15.0));
        assert_eq!(inputs.len(), 1);
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_influenced_unit_comes_from_reference_quantity() {
        let f = fixture();
        let energy = Product::new("electricity", Quantity::new(1.0, Unit::new("MJ"))).into_ref();
        let mut process = RecyclingProcess::new(
            "shredding",
            Bom::single(ProductInstance::new(f.nmc111.clone(), kg(1.0))),
            Bom::new(),
            RatioTable::from_ratios(vec![(f.nmc111.clone(), energy, 0.2)]),
            RatioTable::new(),
        )
        .unwrap();

        process.update_fixed_input_lci([("nmc111", 10.0)]).unwrap();
        let electricity = process.computed_input_bom().unwrap().get("electricity").unwrap();
        assert_eq!(electricity.quantity.unit.name, "MJ");
        assert!((electricity.quantity.value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_composite_input_reaches_flattened_basis() {
        let f = fixture();
        let nickel = leaf("nickel");
        let cobalt = leaf("cobalt");
        let battery = Product::with_bom(
            "battery",
            kg(1.0),
            Bom::from_instances(vec![
                ProductInstance::new(nickel.clone(), kg(0.6)),
                ProductInstance::new(cobalt.clone(), kg(0.4)),
            ]),
        )
        .unwrap()
        .into_ref();

        let mut process = RecyclingProcess::new(
            "hydrometallurgy",
            Bom::single(ProductInstance::new(battery.clone(), kg(1.0))),
            Bom::new(),
            RatioTable::from_ratios(vec![(battery.clone(), f.heat.clone(), 1.5)]),
            RatioTable::from_ratios(vec![(nickel.clone(), f.vapor.clone(), 1.0)]),
        )
        .unwrap();

        process.update_fixed_input_lci([("battery", 10.0)]).unwrap();
        assert_eq!(process.computed_input_bom().unwrap().get("heat").unwrap().quantity, kg(15.0));
        let vapor = process.computed_output_bom().unwrap().get("vapor").unwrap();
        assert!((vapor.quantity.value - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_coherency_gate() {
        let f = fixture();
        let err = RecyclingProcess::new(
            "drying",
            Bom::single(ProductInstance::new(f.nmc111.clone(), kg(1.0))),
            Bom::new(),
            RatioTable::from_ratios(vec![(f.water.clone(), f.heat.clone(), 1.0)]),
            RatioTable::new(),
        )
        .unwrap_err();

        match err {
            LciError::Coherency { table, missing, .. } => {
                assert_eq!(table, "input demand");
                assert_eq!(missing, vec!["water".to_string()]);
            }
            other => panic!("expected coherency error, got {:?}", other),
        }

        let err = RecyclingProcess::new(
            "drying",
            Bom::single(ProductInstance::new(f.nmc111.clone(), kg(1.0))),
            Bom::new(),
            RatioTable::new(),
            RatioTable::from_ratios(vec![(f.water.clone(), f.vapor.clone(), 3.0)]),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "COHERENCY_ERROR");
    }

    #[test]
    fn test_empty_fixed_quantities_rejected() {
        let f = fixture();
        let mut process = drying(&f);
        let err = process
            .update_fixed_input_lci(Vec::<(String, f64)>::new())
            .unwrap_err();
        assert!(matches!(err, LciError::InvalidArgument { .. }));
    }

    #[test]
    fn test_unknown_fixed_product_leaves_inputs_untouched() {
        let f = fixture();
        let mut process = drying(&f);
        process.update_fixed_input_lci([("water", 1.0)]).unwrap();

        let err = process
            .update_fixed_input_lci([("water", 9.0), ("lava", 1.0)])
            .unwrap_err();
        assert!(matches!(err, LciError::ProductNotFound { .. }));
        assert_eq!(process.state(), ResolutionState::Unresolved);
        assert_eq!(process.process().inputs.get("water").unwrap().quantity, kg(1.0));
    }

    #[test]
    fn test_observer_receives_one_event_per_resolution() {
        let f = fixture();
        let observer = RecordingObserver::default();
        let mut process = drying(&f).with_observer(Box::new(observer.clone()));

        process.update_fixed_input_lci([("water", 1.0)]).unwrap();
        process.update_fixed_input_lci([("water", 2.0)]).unwrap();

        let events = observer.events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ("drying".to_string(), "vapor: 3.0 kg".to_string()));
        assert_eq!(events[1].1, "vapor: 6.0 kg");
    }

    #[test]
    fn test_mass_per_element() {
        let cathode = Product::chemical("NMC622", kg(1.0), "LiNi0.6Mn0.2Co0.2O2")
            .unwrap()
            .into_ref();
        let anode = Product::chemical("Graphite", kg(1.0), "C").unwrap().into_ref();
        let process = Process::new(
            "NMC622Cell",
            Bom::new(),
            Bom::from_instances(vec![
                ProductInstance::new(cathode, kg(1.6)),
                ProductInstance::new(anode, kg(1.6)),
            ]),
        );

        let masses = process.output_mass_per_element().unwrap();
        assert_eq!(masses.len(), 6);
        assert!((masses["C"].value - 1.6).abs() < 1e-12);
        let total: f64 = masses.values().map(|q| q.value).sum();
        assert!((total - 3.2).abs() < 1e-9);
        assert!(process.input_mass_per_element().unwrap().is_empty());
    }
}
