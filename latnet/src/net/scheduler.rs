//! The t-value projection scheduler: a DAG of projection nodes evaluated in
//! an order that lets subprojection t-values serve as lower bounds, with
//! early abort against the best figure seen so far.

use hashbrown::HashMap;
use itertools::Itertools;
use latnet_gf2::BitMatrix;
use log::trace;

use crate::net::tvalue::tvalue_gauss;
use crate::net::DigitalNet;
use crate::types::Real;
use crate::weights::{Coordinates, Weights};

struct Node {
    projection: Coordinates,
    weight: Real,
    /// Indices of the `(|u|-1)`-subprojection nodes, scheduled earlier.
    mothers: Vec<usize>,
    /// Bound inherited from a previous-dimension scheduler's best net.
    lower_bound_prev: usize,
    tvalue_current: usize,
    tvalue_best: usize,
}

/// Schedules all projections of cardinality 2 up to `max_order` over
/// `dimension` coordinates, ordered by non-decreasing cardinality and, per
/// cardinality, non-increasing weight.
///
/// The lower bound of a node is the maximum of its mothers' current
/// t-values and of the bound inherited from the previous dimension; the
/// maximum (not the minimum) is what keeps `t(u) >= t(u')` for `u' ⊂ u`.
pub struct TValueScheduler {
    dimension: usize,
    max_order: usize,
    nodes: Vec<Node>,
}

impl TValueScheduler {
    pub fn new(
        dimension: usize,
        max_order: usize,
        weights: &Weights,
        previous: Option<&TValueScheduler>,
    ) -> Self {
        assert!(dimension >= 2, "a projection scheduler needs two coordinates");
        assert!(max_order >= 2, "projections of cardinality < 2 carry no t-value");

        let previous_best: HashMap<Coordinates, usize> = previous
            .map(|p| {
                p.nodes
                    .iter()
                    .map(|n| (n.projection, n.tvalue_best))
                    .collect()
            })
            .unwrap_or_default();

        let mut nodes: Vec<Node> = Vec::new();
        let mut index_of: HashMap<Coordinates, usize> = HashMap::new();

        for order in 2..=max_order.min(dimension) {
            let mut layer: Vec<(Coordinates, Real)> = (0..dimension)
                .combinations(order)
                .map(|coords| {
                    let proj = Coordinates::from_slice(&coords);
                    (proj, weights.weight(&proj))
                })
                .collect();
            layer.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("weights are not NaN"));

            for (proj, weight) in layer {
                let mothers = proj
                    .iter()
                    .map(|c| proj.without(c))
                    .filter(|sub| sub.cardinality() >= 2)
                    .map(|sub| index_of[&sub])
                    .collect();
                let lower_bound_prev = previous_best.get(&proj).copied().unwrap_or(0);
                index_of.insert(proj, nodes.len());
                nodes.push(Node {
                    projection: proj,
                    weight,
                    mothers,
                    lower_bound_prev,
                    tvalue_current: 0,
                    tvalue_best: 0,
                });
            }
        }

        TValueScheduler {
            dimension,
            max_order,
            nodes,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    pub fn projection_count(&self) -> usize {
        self.nodes.len()
    }

    /// The figure `sum_u gamma_u 2^t(u)` of `net`, walking the schedule and
    /// aborting with infinity as soon as the partial figure reaches
    /// `abort_bound`.
    pub fn compute_figure(&mut self, net: &dyn DigitalNet, abort_bound: Real) -> Real {
        assert!(net.dimension() >= self.dimension);
        let matrices: Vec<BitMatrix> = (0..self.dimension)
            .map(|c| net.generating_matrix(c))
            .collect();

        let mut acc = 0.0;
        for i in 0..self.nodes.len() {
            let lower_bound = self.lower_bound(i);
            let weight = self.nodes[i].weight;
            let projection = self.nodes[i].projection;
            if weight > 0.0 {
                let proj_mats: Vec<&BitMatrix> =
                    projection.iter().map(|c| &matrices[c]).collect();
                let t = tvalue_gauss(&proj_mats, lower_bound);
                trace!("projection {projection}: t-value {t}");
                self.nodes[i].tvalue_current = t;
                acc += weight * (2.0 as Real).powi(t as i32);
                if acc >= abort_bound {
                    return Real::INFINITY;
                }
            } else {
                self.nodes[i].tvalue_current = lower_bound;
            }
        }
        acc
    }

    fn lower_bound(&self, i: usize) -> usize {
        let node = &self.nodes[i];
        let from_mothers = node
            .mothers
            .iter()
            .map(|&m| self.nodes[m].tvalue_current)
            .max()
            .unwrap_or(0);
        from_mothers.max(node.lower_bound_prev)
    }

    /// Records the current t-values as belonging to the best net; called
    /// only when the figure strictly improved.
    pub fn commit_best(&mut self) {
        for node in &mut self.nodes {
            node.tvalue_best = node.tvalue_current;
        }
    }

    /// The best-net t-value of every scheduled projection.
    pub fn best_tvalues(&self) -> HashMap<Coordinates, usize> {
        self.nodes
            .iter()
            .map(|n| (n.projection, n.tvalue_best))
            .collect()
    }

    /// The current-net t-value of every scheduled projection.
    pub fn current_tvalues(&self) -> HashMap<Coordinates, usize> {
        self.nodes
            .iter()
            .map(|n| (n.projection, n.tvalue_current))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::net::schmid::tvalue_schmid;
    use crate::net::{ExplicitNet, SobolNet};
    use crate::weights::{OrderDependentWeights, ProductWeights};

    fn order_weights() -> Weights {
        Weights::OrderDependent(OrderDependentWeights::new(vec![0.0, 1.0, 0.5, 0.25], 0.1))
    }

    #[test]
    fn schedule_covers_all_projections() {
        let sched = TValueScheduler::new(5, 3, &order_weights(), None);
        // C(5,2) + C(5,3) = 10 + 10.
        assert_eq!(sched.projection_count(), 20);
    }

    #[test]
    fn scheduled_tvalues_match_direct_computation() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let net = ExplicitNet::random(&mut rng, 4, 7);
        let mut sched = TValueScheduler::new(4, 3, &order_weights(), None);
        let figure = sched.compute_figure(&net, Real::INFINITY);
        assert!(figure.is_finite() && figure > 0.0);

        // Replaying the walk with the reference sweep, under the same
        // mother-derived lower bounds, must reproduce every t-value.
        let mats = net.generating_matrices();
        let tvalues = sched.current_tvalues();
        for (proj, t) in &tvalues {
            let bound = proj
                .iter()
                .map(|c| proj.without(c))
                .filter(|sub| sub.cardinality() >= 2)
                .map(|sub| tvalues[&sub])
                .max()
                .unwrap_or(0);
            let proj_mats: Vec<&latnet_gf2::BitMatrix> =
                proj.iter().map(|c| &mats[c]).collect();
            assert_eq!(*t, tvalue_schmid(&proj_mats, bound), "projection {proj}");
        }
    }

    /// Invariant: the t-value of a projection dominates the t-values of its
    /// subprojections.
    #[test]
    fn tvalues_monotone_along_the_dag() {
        let net = SobolNet::new(
            5,
            8,
            vec![vec![], vec![1], vec![1, 3], vec![1, 3, 1], vec![1, 1, 1]],
        )
        .unwrap();
        let mut sched = TValueScheduler::new(5, 4, &order_weights(), None);
        sched.compute_figure(&net, Real::INFINITY);
        let tvalues = sched.current_tvalues();
        for (proj, &t) in &tvalues {
            for c in proj.iter() {
                let sub = proj.without(c);
                if let Some(&t_sub) = tvalues.get(&sub) {
                    assert!(t >= t_sub, "t({proj}) = {t} < t({sub}) = {t_sub}");
                }
            }
        }
    }

    #[test]
    fn abort_bound_truncates() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(12);
        let net = ExplicitNet::random(&mut rng, 4, 6);
        let mut sched = TValueScheduler::new(4, 3, &order_weights(), None);
        let full = sched.compute_figure(&net, Real::INFINITY);
        let truncated = sched.compute_figure(&net, full / 2.0);
        assert!(truncated.is_infinite());
    }

    #[test]
    fn previous_dimension_bounds_are_inherited() {
        let weights = Weights::Product(ProductWeights::uniform(1.0));
        let mut rng = rand::rngs::StdRng::seed_from_u64(13);
        let net = ExplicitNet::random(&mut rng, 3, 6);
        let mut prev = TValueScheduler::new(2, 2, &weights, None);
        prev.compute_figure(&net, Real::INFINITY);
        prev.commit_best();
        let next = TValueScheduler::new(3, 2, &weights, Some(&prev));
        let pair = Coordinates::from_slice(&[0, 1]);
        let idx = next
            .nodes
            .iter()
            .position(|n| n.projection == pair)
            .unwrap();
        assert_eq!(
            next.nodes[idx].lower_bound_prev,
            prev.best_tvalues()[&pair]
        );
    }
}
