//! # Core Module
//!
//! Host-resident building blocks used by the device layer.
//!
//! - **Molecular Conformations** ([`models`]) - The hierarchical `Conf` and `Change` structures
//!   describing one ligand and zero or more flexible residues
//! - **Numeric Helpers** ([`utils`]) - Angle normalization and quaternion increments
//! - **Inverse Hessian Storage** ([`matrix`]) - Packed symmetric matrix with index-permissive access

pub mod matrix;
pub mod models;
pub mod utils;
