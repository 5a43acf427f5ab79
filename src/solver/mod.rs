//! SVR dual solver
//!
//! The dual is solved by a deflected subgradient method whose iterates are
//! kept feasible by an exact projection onto the box `[-C, C]ⁿ` intersected
//! with the hyperplane `Σ βᵢ = s`.

pub mod deflected;
pub mod projection;

pub use self::deflected::*;
pub use self::projection::*;
