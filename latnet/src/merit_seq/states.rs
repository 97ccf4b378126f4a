//! Per-weight-shape CBC states for the coordinate-uniform update rule.
//!
//! Each state holds vectors indexed like the kernel-values vector. After
//! committing generators for coordinates `1..j`, the weighted state is the
//! vector `w` such that the merit increment of a candidate `a` for
//! coordinate `j+1` is `compressed_sum(w ⊙ stride_a(kernel_values)) / n`.

use crate::types::Real;
use crate::weights::{
    Coordinates, OrderDependentWeights, PodWeights, ProductWeights, ProjectionDependentWeights,
    Weights,
};

pub trait CoordUniformState {
    fn reset(&mut self);

    /// Commits the next coordinate, whose strided kernel values are given.
    fn update(&mut self, strided: &[Real]);

    /// Adds this state's contribution to the weighted state for the next
    /// coordinate.
    fn add_weighted_state(&self, acc: &mut [Real]);
}

/// State for product weights: one running product per slot.
pub struct ProductState {
    weights: ProductWeights,
    power: Real,
    dim: usize,
    state: Vec<Real>,
}

impl ProductState {
    pub fn new(weights: ProductWeights, power: Real, size: usize) -> Self {
        ProductState {
            weights,
            power,
            dim: 0,
            state: vec![1.0; size],
        }
    }

    fn gamma(&self, coord: usize) -> Real {
        self.weights.coordinate_weight(coord).powf(self.power)
    }
}

impl CoordUniformState for ProductState {
    fn reset(&mut self) {
        self.dim = 0;
        self.state.fill(1.0);
    }

    fn update(&mut self, strided: &[Real]) {
        let gamma = self.gamma(self.dim);
        for (s, &o) in self.state.iter_mut().zip(strided) {
            *s *= 1.0 + gamma * o;
        }
        self.dim += 1;
    }

    fn add_weighted_state(&self, acc: &mut [Real]) {
        let gamma = self.gamma(self.dim);
        for (a, &s) in acc.iter_mut().zip(&self.state) {
            *a += gamma * s;
        }
    }
}

/// State for order-dependent weights: one cross-term vector per order.
///
/// `elems[k]` holds, per slot, the sum over all already-committed
/// projections of cardinality `k+1` of the product of their kernel factors.
pub struct OrderDependentState {
    weights: OrderDependentWeights,
    power: Real,
    size: usize,
    elems: Vec<Vec<Real>>,
}

impl OrderDependentState {
    pub fn new(weights: OrderDependentWeights, power: Real, size: usize) -> Self {
        OrderDependentState {
            weights,
            power,
            size,
            elems: Vec::new(),
        }
    }

    fn gamma(&self, order: usize) -> Real {
        self.weights.order_weight(order).powf(self.power)
    }
}

impl CoordUniformState for OrderDependentState {
    fn reset(&mut self) {
        self.elems.clear();
    }

    fn update(&mut self, strided: &[Real]) {
        self.elems.push(vec![0.0; self.size]);
        for k in (0..self.elems.len()).rev() {
            if k == 0 {
                for (e, &o) in self.elems[0].iter_mut().zip(strided) {
                    *e += o;
                }
            } else {
                let (lower, upper) = self.elems.split_at_mut(k);
                let prev = &lower[k - 1];
                for ((e, &p), &o) in upper[0].iter_mut().zip(prev).zip(strided) {
                    *e += p * o;
                }
            }
        }
    }

    fn add_weighted_state(&self, acc: &mut [Real]) {
        let gamma1 = self.gamma(1);
        for a in acc.iter_mut() {
            *a += gamma1;
        }
        for (k, elem) in self.elems.iter().enumerate() {
            let gamma = self.gamma(k + 2);
            if gamma == 0.0 {
                continue;
            }
            for (a, &e) in acc.iter_mut().zip(elem) {
                *a += gamma * e;
            }
        }
    }
}

/// State for explicit projection weights: one accumulator per projection of
/// committed coordinates that can still grow into a weighted projection.
pub struct ProjectionDependentState {
    weights: ProjectionDependentWeights,
    power: Real,
    size: usize,
    dim: usize,
    accumulators: Vec<(Coordinates, Vec<Real>)>,
}

impl ProjectionDependentState {
    pub fn new(weights: ProjectionDependentWeights, power: Real, size: usize) -> Self {
        let mut state = ProjectionDependentState {
            weights,
            power,
            size,
            dim: 0,
            accumulators: Vec::new(),
        };
        state.reset();
        state
    }
}

impl CoordUniformState for ProjectionDependentState {
    fn reset(&mut self) {
        self.dim = 0;
        self.accumulators = vec![(Coordinates::EMPTY, vec![1.0; self.size])];
    }

    fn update(&mut self, strided: &[Real]) {
        let coord = self.dim;
        let mut grown = Vec::new();
        for (proj, vec) in &self.accumulators {
            let extended = proj.with(coord);
            if self.weights.is_sub_projection(&extended) {
                let prod: Vec<Real> = vec.iter().zip(strided).map(|(&v, &o)| v * o).collect();
                grown.push((extended, prod));
            }
        }
        self.accumulators.extend(grown);
        self.dim += 1;
    }

    fn add_weighted_state(&self, acc: &mut [Real]) {
        let coord = self.dim;
        for (proj, vec) in &self.accumulators {
            let gamma = self.weights.weight(&proj.with(coord)).powf(self.power);
            if gamma == 0.0 {
                continue;
            }
            for (a, &v) in acc.iter_mut().zip(vec) {
                *a += gamma * v;
            }
        }
    }
}

/// State for product-and-order-dependent weights: order-dependent cross
/// terms with the coordinate weights folded into each committed factor.
pub struct PodState {
    weights: PodWeights,
    power: Real,
    size: usize,
    dim: usize,
    elems: Vec<Vec<Real>>,
}

impl PodState {
    pub fn new(weights: PodWeights, power: Real, size: usize) -> Self {
        PodState {
            weights,
            power,
            size,
            dim: 0,
            elems: Vec::new(),
        }
    }
}

impl CoordUniformState for PodState {
    fn reset(&mut self) {
        self.dim = 0;
        self.elems.clear();
    }

    fn update(&mut self, strided: &[Real]) {
        let gamma = self.weights.product.coordinate_weight(self.dim).powf(self.power);
        self.elems.push(vec![0.0; self.size]);
        for k in (0..self.elems.len()).rev() {
            if k == 0 {
                for (e, &o) in self.elems[0].iter_mut().zip(strided) {
                    *e += gamma * o;
                }
            } else {
                let (lower, upper) = self.elems.split_at_mut(k);
                let prev = &lower[k - 1];
                for ((e, &p), &o) in upper[0].iter_mut().zip(prev).zip(strided) {
                    *e += gamma * p * o;
                }
            }
        }
        self.dim += 1;
    }

    fn add_weighted_state(&self, acc: &mut [Real]) {
        let gamma_next = self.weights.product.coordinate_weight(self.dim).powf(self.power);
        let order1 = self.weights.order.order_weight(1).powf(self.power);
        for a in acc.iter_mut() {
            *a += gamma_next * order1;
        }
        for (k, elem) in self.elems.iter().enumerate() {
            let gamma_order = self.weights.order.order_weight(k + 2).powf(self.power);
            if gamma_order == 0.0 {
                continue;
            }
            for (a, &e) in acc.iter_mut().zip(elem) {
                *a += gamma_next * gamma_order * e;
            }
        }
    }
}

/// Builds the state list for a weight specification; combined weights
/// contribute one state per component.
pub fn create_states(
    weights: &Weights,
    power: Real,
    size: usize,
) -> Vec<Box<dyn CoordUniformState>> {
    match weights {
        Weights::Product(w) => vec![Box::new(ProductState::new(w.clone(), power, size))],
        Weights::OrderDependent(w) => {
            vec![Box::new(OrderDependentState::new(w.clone(), power, size))]
        }
        Weights::ProjectionDependent(w) => {
            vec![Box::new(ProjectionDependentState::new(w.clone(), power, size))]
        }
        Weights::Pod(w) => vec![Box::new(PodState::new(w.clone(), power, size))],
        Weights::Combined(list) => list
            .iter()
            .flat_map(|w| create_states(w, power, size))
            .collect(),
    }
}

/// The weighted state: the sum of every per-weight state contribution.
pub fn weighted_state(states: &[Box<dyn CoordUniformState>], size: usize) -> Vec<Real> {
    let mut acc = vec![0.0; size];
    for state in states {
        state.add_weighted_state(&mut acc);
    }
    acc
}
