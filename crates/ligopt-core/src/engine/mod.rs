//! # Engine Module
//!
//! Device-resident optimization state and the quasi-Newton update that acts on it.
//!
//! ## Architecture
//!
//! - **Platform Layer** ([`device`]) - Allocation, transfers, memory fill and kernel launch
//!   behind the [`device::Device`] trait, with a host-emulated backend and an optional CUDA backend
//! - **Buffer Ownership** ([`buffer`]) - `DeviceVector`, the owning handle with deep-copy semantics
//! - **Step Vector** ([`change`]) - Search directions and gradients, length `6 + T`
//! - **Configuration Vector** ([`conf`]) - Poses, length `7 + T`
//! - **Inverse Hessian Update** ([`bfgs`]) - Rank-2 BFGS update with a curvature safeguard
//! - **Configuration** ([`config`]) - Backend selection and launch parameters
//! - **Error Handling** ([`error`]) - Device and engine error types
//!
//! All operations are blocking and are driven from a single host thread.

pub mod bfgs;
pub mod buffer;
pub mod change;
pub mod conf;
pub mod config;
pub mod device;
pub mod error;
