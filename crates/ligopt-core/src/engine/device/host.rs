use super::{Device, LaunchConfig, check_bounds};
use crate::engine::config::DeviceConfig;
use crate::engine::error::DeviceError;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();

#[derive(Debug)]
struct MemoryPool {
    limit: Option<usize>,
    in_use: AtomicUsize,
}

/// Device emulated in host memory.
///
/// Allocations are accounted against an optional byte limit, and kernels execute as the
/// grid-stride loop a real device would run.
#[derive(Debug, Clone)]
pub struct HostDevice {
    pool: Arc<MemoryPool>,
    max_threads_per_block: usize,
}

#[derive(Debug)]
pub struct HostBuffer {
    data: Vec<f32>,
    pool: Arc<MemoryPool>,
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        self.pool
            .in_use
            .fetch_sub(self.data.len() * ELEMENT_BYTES, Ordering::AcqRel);
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::from_config(&DeviceConfig::default())
    }
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        info!(
            max_threads_per_block = config.max_threads_per_block,
            memory_limit = ?config.memory_limit_bytes,
            "Opening host-emulated device."
        );
        Self {
            pool: Arc::new(MemoryPool {
                limit: config.memory_limit_bytes,
                in_use: AtomicUsize::new(0),
            }),
            max_threads_per_block: config.max_threads_per_block.max(1),
        }
    }

    pub fn with_memory_limit(limit_bytes: usize) -> Self {
        let config = DeviceConfig {
            memory_limit_bytes: Some(limit_bytes),
            ..DeviceConfig::default()
        };
        Self::from_config(&config)
    }

    /// Bytes currently held by live buffers of this device.
    pub fn in_use_bytes(&self) -> usize {
        self.pool.in_use.load(Ordering::Acquire)
    }
}

impl Device for HostDevice {
    type Buffer = HostBuffer;

    fn name(&self) -> &'static str {
        "host"
    }

    fn max_threads_per_block(&self) -> usize {
        self.max_threads_per_block
    }

    fn alloc(&self, len: usize) -> Result<HostBuffer, DeviceError> {
        let requested = len * ELEMENT_BYTES;
        let limit = self.pool.limit;
        self.pool
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| match limit {
                Some(limit) if current + requested > limit => None,
                _ => Some(current + requested),
            })
            .map_err(|in_use| DeviceError::Allocation {
                requested,
                limit: limit.unwrap_or(usize::MAX),
                in_use,
            })?;
        trace!(len, bytes = requested, "Allocated host buffer.");
        Ok(HostBuffer {
            data: vec![0.0; len],
            pool: Arc::clone(&self.pool),
        })
    }

    fn capacity(&self, buffer: &HostBuffer) -> usize {
        buffer.data.len()
    }

    fn upload(&self, src: &[f32], dst: &mut HostBuffer) -> Result<(), DeviceError> {
        check_bounds(src.len(), dst.data.len())?;
        dst.data[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn download(&self, src: &HostBuffer, dst: &mut [f32]) -> Result<(), DeviceError> {
        check_bounds(dst.len(), src.data.len())?;
        dst.copy_from_slice(&src.data[..dst.len()]);
        Ok(())
    }

    fn copy(&self, src: &HostBuffer, dst: &mut HostBuffer, len: usize) -> Result<(), DeviceError> {
        check_bounds(len, src.data.len())?;
        check_bounds(len, dst.data.len())?;
        dst.data[..len].copy_from_slice(&src.data[..len]);
        Ok(())
    }

    fn fill_zero(&self, buffer: &mut HostBuffer, len: usize) -> Result<(), DeviceError> {
        check_bounds(len, buffer.data.len())?;
        buffer.data[..len].fill(0.0);
        Ok(())
    }

    fn scale(
        &self,
        buffer: &mut HostBuffer,
        len: usize,
        mult: f32,
        launch: LaunchConfig,
    ) -> Result<(), DeviceError> {
        check_bounds(len, buffer.data.len())?;
        let stride = launch.total_threads();
        if stride == 0 {
            return Err(DeviceError::Launch(
                "launch configuration has no threads".to_string(),
            ));
        }
        let vals = &mut buffer.data[..len];

        // Chunk k holds the k-th grid-stride iteration of every thread.
        #[cfg(feature = "parallel")]
        vals.par_chunks_mut(stride)
            .for_each(|chunk| chunk.iter_mut().for_each(|v| *v *= mult));

        #[cfg(not(feature = "parallel"))]
        vals.chunks_mut(stride)
            .for_each(|chunk| chunk.iter_mut().for_each(|v| *v *= mult));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_zeroed_buffer_of_requested_capacity() {
        let device = HostDevice::new();
        let buffer = device.alloc(8).unwrap();
        assert_eq!(device.capacity(&buffer), 8);
        let mut out = vec![1.0; 8];
        device.download(&buffer, &mut out).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn dropping_buffer_releases_its_memory() {
        let device = HostDevice::new();
        let buffer = device.alloc(10).unwrap();
        assert_eq!(device.in_use_bytes(), 40);
        drop(buffer);
        assert_eq!(device.in_use_bytes(), 0);
    }

    #[test]
    fn alloc_beyond_memory_limit_fails_without_leaking_accounting() {
        let device = HostDevice::with_memory_limit(32);
        let first = device.alloc(6).unwrap();
        let result = device.alloc(4);
        assert_eq!(
            result.err(),
            Some(DeviceError::Allocation {
                requested: 16,
                limit: 32,
                in_use: 24
            })
        );
        assert_eq!(device.in_use_bytes(), 24);
        drop(first);
        assert!(device.alloc(8).is_ok());
    }

    #[test]
    fn upload_larger_than_capacity_is_rejected() {
        let device = HostDevice::new();
        let mut buffer = device.alloc(2).unwrap();
        let result = device.upload(&[1.0, 2.0, 3.0], &mut buffer);
        assert!(matches!(result, Err(DeviceError::OutOfBounds { .. })));
    }

    #[test]
    fn scale_covers_elements_beyond_block_size() {
        let device = HostDevice::new();
        let values: Vec<f32> = (0..37).map(|i| i as f32).collect();
        let mut buffer = device.alloc(values.len()).unwrap();
        device.upload(&values, &mut buffer).unwrap();

        let launch = LaunchConfig::for_elements(values.len(), 8);
        device.scale(&mut buffer, values.len(), -1.0, launch).unwrap();

        let mut out = vec![0.0; values.len()];
        device.download(&buffer, &mut out).unwrap();
        for (i, v) in out.iter().enumerate() {
            assert_eq!(*v, -(i as f32));
        }
    }

    #[test]
    fn scale_with_empty_launch_is_an_error() {
        let device = HostDevice::new();
        let mut buffer = device.alloc(4).unwrap();
        let launch = LaunchConfig {
            grid_dim: 0,
            block_dim: 4,
        };
        assert!(matches!(
            device.scale(&mut buffer, 4, 2.0, launch),
            Err(DeviceError::Launch(_))
        ));
    }

    #[test]
    fn copy_and_fill_zero_touch_only_the_requested_prefix() {
        let device = HostDevice::new();
        let mut src = device.alloc(4).unwrap();
        let mut dst = device.alloc(4).unwrap();
        device.upload(&[1.0, 2.0, 3.0, 4.0], &mut src).unwrap();
        device.upload(&[9.0, 9.0, 9.0, 9.0], &mut dst).unwrap();

        device.copy(&src, &mut dst, 2).unwrap();
        device.fill_zero(&mut src, 3).unwrap();

        let mut out = vec![0.0; 4];
        device.download(&dst, &mut out).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 9.0, 9.0]);
        device.download(&src, &mut out).unwrap();
        assert_eq!(out, vec![0.0, 0.0, 0.0, 4.0]);
    }
}
