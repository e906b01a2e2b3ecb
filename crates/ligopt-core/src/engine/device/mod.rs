//! Thin platform layer over a parallel-compute device.
//!
//! Every call is blocking from the host's point of view: transfers and kernel launches
//! have completed by the time they return.

pub mod host;

#[cfg(feature = "cuda")]
pub mod cuda;

#[cfg(feature = "cuda")]
pub use cuda::CudaDevice;
pub use host::HostDevice;

use super::error::DeviceError;
use std::fmt;

/// Grid and block sizing for a one-dimensional elementwise kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid_dim: u32,
    pub block_dim: u32,
}

impl LaunchConfig {
    /// One block with one thread per element, capped at `max_threads_per_block`.
    ///
    /// Lengths beyond the cap are still covered because kernels use a grid-stride loop.
    pub fn for_elements(n: usize, max_threads_per_block: usize) -> Self {
        let threads = n.min(max_threads_per_block).max(1);
        Self {
            grid_dim: 1,
            block_dim: threads as u32,
        }
    }

    #[inline]
    pub fn total_threads(&self) -> usize {
        self.grid_dim as usize * self.block_dim as usize
    }
}

pub trait Device: Clone + fmt::Debug {
    /// Owned device allocation of `f32` elements; released when dropped.
    type Buffer;

    fn name(&self) -> &'static str;

    fn max_threads_per_block(&self) -> usize;

    fn alloc(&self, len: usize) -> Result<Self::Buffer, DeviceError>;

    fn capacity(&self, buffer: &Self::Buffer) -> usize;

    /// Host to device, into the first `src.len()` elements of `dst`.
    fn upload(&self, src: &[f32], dst: &mut Self::Buffer) -> Result<(), DeviceError>;

    /// Device to host, from the first `dst.len()` elements of `src`.
    fn download(&self, src: &Self::Buffer, dst: &mut [f32]) -> Result<(), DeviceError>;

    /// Device to device, first `len` elements.
    fn copy(&self, src: &Self::Buffer, dst: &mut Self::Buffer, len: usize)
    -> Result<(), DeviceError>;

    fn fill_zero(&self, buffer: &mut Self::Buffer, len: usize) -> Result<(), DeviceError>;

    /// Elementwise `buffer[i] *= mult` for `i < len`.
    fn scale(
        &self,
        buffer: &mut Self::Buffer,
        len: usize,
        mult: f32,
        launch: LaunchConfig,
    ) -> Result<(), DeviceError>;
}

#[inline]
pub(crate) fn check_bounds(len: usize, capacity: usize) -> Result<(), DeviceError> {
    if len > capacity {
        Err(DeviceError::OutOfBounds { len, capacity })
    } else {
        Ok(())
    }
}
