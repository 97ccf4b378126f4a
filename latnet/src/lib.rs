#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::needless_range_loop)]
#![deny(rustdoc::broken_intra_doc_links)]

//! A search engine for highly uniform quasi-Monte Carlo point sets.
//!
//! Given a size parameter, a figure of merit and projection weights, the
//! engine selects a rank-1 integration lattice (ordinary or polynomial) or a
//! base-2 digital net minimizing the figure. Component-by-component (CBC)
//! searches are accelerated with an FFT over the cyclic structure of the
//! candidate generator groups whenever the figure is coordinate-uniform.

pub mod capi;
pub mod fft;
pub mod figure;
pub mod filters;
pub mod genseq;
pub mod kernel;
pub mod lat_def;
pub mod lfsr258;
pub mod merit_seq;
pub mod net;
pub mod size_param;
pub mod storage;
pub mod task;
pub mod types;
pub mod weights;

pub use lat_def::LatDef;
pub use size_param::SizeParam;
pub use storage::{Compress, Storage};
pub use types::{Dimension, Integer, LatticeRules, Level, MeritValue, OrdinaryLattice,
                PolynomialLattice, Real};
