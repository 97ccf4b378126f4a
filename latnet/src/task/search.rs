//! Shared search-driver state: best-candidate tracking and observers.

use anyhow::{bail, Result};
use log::info;

use crate::lat_def::LatDef;
use crate::task::min_element::MinElement;
use crate::types::{Dimension, LatticeRules, Real};

pub struct SearchState<L: LatticeRules> {
    dimension: Dimension,
    min_element: MinElement,
    best: Option<(LatDef<L>, Real)>,
    on_lattice_selected: Vec<Box<dyn FnMut(&LatDef<L>, Real)>>,
    on_failed_search: Vec<Box<dyn FnMut()>>,
}

impl<L: LatticeRules> SearchState<L> {
    pub fn new(dimension: Dimension) -> Self {
        SearchState {
            dimension,
            min_element: MinElement::new(),
            best: None,
            on_lattice_selected: Vec::new(),
            on_failed_search: Vec::new(),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn min_element(&mut self) -> &mut MinElement {
        &mut self.min_element
    }

    pub fn best_lattice(&self) -> Option<&LatDef<L>> {
        self.best.as_ref().map(|(lat, _)| lat)
    }

    pub fn best_merit_value(&self) -> Option<Real> {
        self.best.as_ref().map(|(_, m)| *m)
    }

    pub fn on_lattice_selected(&mut self, slot: impl FnMut(&LatDef<L>, Real) + 'static) {
        self.on_lattice_selected.push(Box::new(slot));
    }

    pub fn on_failed_search(&mut self, slot: impl FnMut() + 'static) {
        self.on_failed_search.push(Box::new(slot));
    }

    pub fn reset(&mut self) {
        self.best = None;
    }

    /// Replaces the best candidate and notifies the observers; drivers call
    /// this once per committed coordinate (CBC) or once per search
    /// (sequence-based).
    pub(crate) fn select_best_lattice(&mut self, lat: LatDef<L>, merit: Real) {
        info!("selected {lat} with merit {merit:.6e}");
        for slot in &mut self.on_lattice_selected {
            slot(&lat, merit);
        }
        self.best = Some((lat, merit));
    }

    pub(crate) fn scan<T>(
        &mut self,
        items: impl Iterator<Item = (T, Real)>,
        total: usize,
    ) -> Option<(T, Real)> {
        self.min_element.run(items, total)
    }

    pub(crate) fn fail(&mut self) -> Result<()> {
        for slot in &mut self.on_failed_search {
            slot();
        }
        bail!("the search finished without selecting a lattice")
    }
}
