//! Digital net search tasks: best-net tracking over random candidates, and
//! single-net evaluation.

use anyhow::{ensure, Result};
use log::{debug, info};

use crate::lfsr258::Lfsr258;
use crate::net::scheduler::TValueScheduler;
use crate::net::{DigitalNet, ExplicitNet};
use crate::types::Real;
use crate::weights::Weights;

/// Observes candidate nets, keeps the best one, and provides the truncation
/// bound for in-flight figure evaluations.
pub struct MinNetObserver {
    best_net: Option<ExplicitNet>,
    best_merit: Real,
}

impl MinNetObserver {
    pub fn new() -> Self {
        MinNetObserver {
            best_net: None,
            best_merit: Real::INFINITY,
        }
    }

    pub fn reset(&mut self) {
        self.best_net = None;
        self.best_merit = Real::INFINITY;
    }

    pub fn best_net(&self) -> Option<&ExplicitNet> {
        self.best_net.as_ref()
    }

    pub fn best_merit(&self) -> Real {
        self.best_merit
    }

    pub fn has_found_net(&self) -> bool {
        self.best_net.is_some()
    }

    /// Whether an evaluation at this partial merit is still worth finishing.
    pub fn on_progress(&self, merit: Real) -> bool {
        merit < self.best_merit
    }

    /// Records a fully evaluated candidate; returns true when it took the
    /// lead.
    pub fn observe(&mut self, net: ExplicitNet, merit: Real) -> bool {
        if merit < self.best_merit {
            debug!("new best net with merit {merit:.6e}");
            self.best_merit = merit;
            self.best_net = Some(net);
            true
        } else {
            false
        }
    }
}

/// Random search for a low-t-value digital net: draws explicit candidates
/// and keeps the best under the equidistribution figure.
pub struct RandomNetSearch {
    dimension: usize,
    m: usize,
    n_samples: usize,
    scheduler: TValueScheduler,
    observer: MinNetObserver,
    rng: Lfsr258,
    on_net_selected: Vec<Box<dyn FnMut(&ExplicitNet, Real)>>,
    on_failed_search: Vec<Box<dyn FnMut()>>,
}

impl RandomNetSearch {
    pub fn new(
        dimension: usize,
        m: usize,
        max_order: usize,
        weights: &Weights,
        n_samples: usize,
        rng: Lfsr258,
    ) -> Result<Self> {
        ensure!(dimension >= 2, "a net search needs at least two coordinates");
        ensure!(n_samples >= 1, "a random search needs at least one sample");
        Ok(RandomNetSearch {
            dimension,
            m,
            n_samples,
            scheduler: TValueScheduler::new(dimension, max_order.min(dimension), weights, None),
            observer: MinNetObserver::new(),
            rng,
            on_net_selected: Vec::new(),
            on_failed_search: Vec::new(),
        })
    }

    pub fn on_net_selected(&mut self, slot: impl FnMut(&ExplicitNet, Real) + 'static) {
        self.on_net_selected.push(Box::new(slot));
    }

    pub fn on_failed_search(&mut self, slot: impl FnMut() + 'static) {
        self.on_failed_search.push(Box::new(slot));
    }

    pub fn min_observer(&self) -> &MinNetObserver {
        &self.observer
    }

    pub fn best_net(&self) -> Option<&ExplicitNet> {
        self.observer.best_net()
    }

    pub fn best_merit_value(&self) -> Real {
        self.observer.best_merit()
    }

    pub fn reset(&mut self) {
        self.observer.reset();
    }

    pub fn execute(&mut self) -> Result<()> {
        info!(
            "random net search: dimension {}, 2^{} points, {} samples",
            self.dimension, self.m, self.n_samples
        );
        for _ in 0..self.n_samples {
            let net = ExplicitNet::random(&mut self.rng, self.dimension, self.m);
            let merit = self
                .scheduler
                .compute_figure(&net, self.observer.best_merit());
            if merit.is_finite() && self.observer.observe(net, merit) {
                self.scheduler.commit_best();
                let best = self.observer.best_net().expect("just observed").clone();
                for slot in &mut self.on_net_selected {
                    slot(&best, merit);
                }
            }
        }
        if !self.observer.has_found_net() {
            for slot in &mut self.on_failed_search {
                slot();
            }
            anyhow::bail!("the search finished without selecting a net");
        }
        Ok(())
    }
}

/// Evaluation of the equidistribution figure of one given net.
pub struct EvalNet {
    scheduler: TValueScheduler,
}

impl EvalNet {
    pub fn new(dimension: usize, max_order: usize, weights: &Weights) -> Result<Self> {
        ensure!(dimension >= 2, "a net evaluation needs at least two coordinates");
        Ok(EvalNet {
            scheduler: TValueScheduler::new(dimension, max_order.min(dimension), weights, None),
        })
    }

    pub fn execute(&mut self, net: &dyn DigitalNet) -> Real {
        self.scheduler.compute_figure(net, Real::INFINITY)
    }

    pub fn scheduler(&self) -> &TValueScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::SobolNet;
    use crate::weights::OrderDependentWeights;

    fn pair_weights() -> Weights {
        Weights::OrderDependent(OrderDependentWeights::new(vec![0.0, 1.0, 0.5], 0.0))
    }

    #[test]
    fn random_search_finds_a_net() {
        let weights = pair_weights();
        let mut search =
            RandomNetSearch::new(3, 6, 3, &weights, 20, Lfsr258::default()).unwrap();
        search.execute().unwrap();
        assert!(search.best_merit_value().is_finite());
        let net = search.best_net().unwrap();
        assert_eq!(net.dimension(), 3);
        assert_eq!(net.num_points(), 64);
    }

    #[test]
    fn better_samples_only_improve() {
        let weights = pair_weights();
        let mut search =
            RandomNetSearch::new(3, 5, 3, &weights, 5, Lfsr258::default()).unwrap();
        search.execute().unwrap();
        let final_merit = search.best_merit_value();
        // The longer run shares the short run's prefix of draws, so its
        // best merit can only improve.
        let mut longer =
            RandomNetSearch::new(3, 5, 3, &weights, 50, Lfsr258::default()).unwrap();
        longer.execute().unwrap();
        assert!(longer.best_merit_value() <= final_merit + 1e-12);
    }

    #[test]
    fn eval_scores_the_sobol_net() {
        let net = SobolNet::new(3, 6, vec![vec![], vec![1], vec![1, 3]]).unwrap();
        let weights = pair_weights();
        let mut eval = EvalNet::new(3, 3, &weights).unwrap();
        let merit = eval.execute(&net);
        assert!(merit.is_finite() && merit > 0.0);
        // The classic Sobol pair {1,2} has t-value 0.
        let tvalues = eval.scheduler().current_tvalues();
        assert_eq!(
            tvalues[&crate::weights::Coordinates::from_slice(&[0, 1])],
            0
        );
    }

    #[test]
    fn net_selected_signal_fires() {
        use std::cell::Cell;
        use std::rc::Rc;
        let count = Rc::new(Cell::new(0usize));
        let weights = pair_weights();
        let mut search =
            RandomNetSearch::new(2, 4, 2, &weights, 10, Lfsr258::default()).unwrap();
        let c = Rc::clone(&count);
        search.on_net_selected(move |_, _| c.set(c.get() + 1));
        search.execute().unwrap();
        assert!(count.get() >= 1);
    }
}
