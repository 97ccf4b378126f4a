//! Merit sequences: lazy per-candidate merit values for CBC searches.

pub mod cbc;
pub mod inner_prod_fast;
pub mod lat_seq_over_cbc;
pub mod states;

pub use cbc::{CbcEngine, CoordUniformCbc, WeightedCbc};
pub use inner_prod_fast::CoordUniformFastCbc;
pub use lat_seq_over_cbc::LatSeqOverCbc;
pub use states::{create_states, weighted_state, CoordUniformState};
