//! The result object handed to external callers.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::lat_def::LatDef;
use crate::types::{Integer, LatticeRules, Real};

/// Outcome of a search: the chosen lattice, its merit, and the wall-clock
/// time the search took.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub num_points: Integer,
    pub modulus: String,
    pub dimension: usize,
    /// Generating vector through the bit-coefficient map (plain integers
    /// for ordinary lattices, coefficient bits for polynomial ones).
    pub gen: Vec<Integer>,
    pub merit: Real,
    pub cpu_seconds: Real,
}

impl SearchResult {
    pub fn from_lattice<L: LatticeRules>(lat: &LatDef<L>, merit: Real, cpu_seconds: Real) -> Self {
        SearchResult {
            num_points: lat.size_param().num_points(),
            modulus: lat.size_param().modulus().to_string(),
            dimension: lat.dimension(),
            gen: lat.gen().iter().map(L::gen_to_index).collect(),
            merit,
            cpu_seconds,
        }
    }

    /// Machine-readable rendering.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("result objects always serialize")
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, [", self.modulus, self.dimension)?;
        for (j, a) in self.gen.iter().enumerate() {
            if j > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, "]) : {}", self.merit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_param::SizeParam;
    use crate::types::OrdinaryLattice;

    #[test]
    fn renders_both_formats() {
        let lat = LatDef::<OrdinaryLattice>::with_gen(
            SizeParam::unilevel(31).unwrap(),
            vec![1, 12, 3],
        );
        let result = SearchResult::from_lattice(&lat, 0.25, 0.001);
        assert_eq!(result.to_string(), "(31, 3, [1, 12, 3]) : 0.25");
        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["num_points"], 31);
        assert_eq!(json["gen"][1], 12);
    }
}
