//! # ligopt Core Library
//!
//! Numerical state for gradient-based local optimization of flexible ligand poses:
//! a rigid-body position and orientation plus a set of torsion angles, optionally
//! extended with the torsions of flexible receptor side-chains.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Host-side molecular conformation models (`Conf`, `Change`),
//!   angle and quaternion helpers, and the packed symmetric `TriangularMatrix` that stores the
//!   approximate inverse Hessian.
//!
//! - **[`engine`]: The Device Layer.** A thin platform abstraction over device memory
//!   (`Device`), the owning `DeviceVector` handle, and the two flat vector encodings built on it:
//!   `StepVector` (length `6 + T`) and `ConfVector` (length `7 + T`). The BFGS inverse-Hessian
//!   update operates on these encodings.
//!
//! Both vector types share a single canonical flattening order: the ligand rigid body, the
//! ligand torsions, then the torsions of every flexible residue in residue order. Matrix indices
//! are only meaningful with respect to that order.

pub mod core;
pub mod engine;
