//! Mesh processing algorithms.
//!
//! - **Parameterization**: spectral conformal flattening

pub mod parameterize;
