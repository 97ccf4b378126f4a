//! Projection weights: how much each subset of coordinates matters.

use core::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::Real;

/// A finite set of coordinate indices (0-based internally, displayed
/// 1-based), backed by a 128-bit set.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinates(u128);

impl Coordinates {
    pub const EMPTY: Self = Coordinates(0);

    pub fn singleton(coord: usize) -> Self {
        assert!(coord < 128);
        Coordinates(1 << coord)
    }

    pub fn from_slice(coords: &[usize]) -> Self {
        coords.iter().fold(Self::EMPTY, |s, &c| s.with(c))
    }

    #[must_use]
    pub fn with(self, coord: usize) -> Self {
        assert!(coord < 128);
        Coordinates(self.0 | 1 << coord)
    }

    pub fn contains(self, coord: usize) -> bool {
        coord < 128 && self.0 >> coord & 1 == 1
    }

    pub fn cardinality(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: Self) -> Self {
        Coordinates(self.0 | other.0)
    }

    pub fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    #[must_use]
    pub fn without(self, coord: usize) -> Self {
        Coordinates(self.0 & !(1u128 << coord))
    }

    /// Largest coordinate index, if any.
    pub fn last(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(127 - self.0.leading_zeros() as usize)
        }
    }

    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..128).filter(move |&c| self.contains(c))
    }
}

impl FromIterator<usize> for Coordinates {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |s, c| s.with(c))
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (k, c) in self.iter().enumerate() {
            if k > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", c + 1)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Product weights: `gamma_u = prod_{j in u} gamma_j`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductWeights {
    default_weight: Real,
    weights: Vec<Real>,
}

impl ProductWeights {
    pub fn uniform(gamma: Real) -> Self {
        ProductWeights {
            default_weight: gamma,
            weights: Vec::new(),
        }
    }

    pub fn with_coordinate_weights(weights: Vec<Real>, default_weight: Real) -> Self {
        ProductWeights {
            default_weight,
            weights,
        }
    }

    pub fn coordinate_weight(&self, coord: usize) -> Real {
        self.weights.get(coord).copied().unwrap_or(self.default_weight)
    }

    pub fn weight(&self, projection: &Coordinates) -> Real {
        projection.iter().map(|c| self.coordinate_weight(c)).product()
    }
}

/// Order-dependent weights: `gamma_u = Gamma_{|u|}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderDependentWeights {
    default_weight: Real,
    /// `weights[k - 1]` is the weight of order `k`.
    weights: Vec<Real>,
}

impl OrderDependentWeights {
    pub fn new(weights: Vec<Real>, default_weight: Real) -> Self {
        OrderDependentWeights {
            default_weight,
            weights,
        }
    }

    pub fn order_weight(&self, order: usize) -> Real {
        if order == 0 {
            return 0.0;
        }
        self.weights.get(order - 1).copied().unwrap_or(self.default_weight)
    }

    pub fn weight(&self, projection: &Coordinates) -> Real {
        self.order_weight(projection.cardinality())
    }
}

/// Weights given explicitly per projection; unlisted projections weigh zero.
#[derive(Clone, Debug, Default)]
pub struct ProjectionDependentWeights {
    weights: HashMap<Coordinates, Real>,
}

impl ProjectionDependentWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_weight(&mut self, projection: Coordinates, weight: Real) {
        assert!(!projection.is_empty(), "the empty projection carries no weight");
        self.weights.insert(projection, weight);
    }

    pub fn weight(&self, projection: &Coordinates) -> Real {
        self.weights.get(projection).copied().unwrap_or(0.0)
    }

    pub fn projections(&self) -> impl Iterator<Item = (&Coordinates, &Real)> {
        self.weights.iter()
    }

    /// Whether some weighted projection contains `projection` as a subset.
    pub fn is_sub_projection(&self, projection: &Coordinates) -> bool {
        self.weights
            .iter()
            .any(|(p, &w)| w != 0.0 && projection.is_subset_of(*p))
    }
}

/// Product-and-order-dependent weights:
/// `gamma_u = Gamma_{|u|} prod_{j in u} gamma_j`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PodWeights {
    pub product: ProductWeights,
    pub order: OrderDependentWeights,
}

impl PodWeights {
    pub fn weight(&self, projection: &Coordinates) -> Real {
        self.order.weight(projection) * self.product.weight(projection)
    }
}

/// A weight specification of any supported shape.
#[derive(Clone, Debug)]
pub enum Weights {
    Product(ProductWeights),
    OrderDependent(OrderDependentWeights),
    ProjectionDependent(ProjectionDependentWeights),
    Pod(PodWeights),
    /// Sum of the component weights.
    Combined(Vec<Weights>),
}

impl Weights {
    pub fn weight(&self, projection: &Coordinates) -> Real {
        match self {
            Weights::Product(w) => w.weight(projection),
            Weights::OrderDependent(w) => w.weight(projection),
            Weights::ProjectionDependent(w) => w.weight(projection),
            Weights::Pod(w) => w.weight(projection),
            Weights::Combined(list) => list.iter().map(|w| w.weight(projection)).sum(),
        }
    }
}
