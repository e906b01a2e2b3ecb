use super::{Device, LaunchConfig, check_bounds};
use crate::engine::config::DeviceConfig;
use crate::engine::error::DeviceError;
use cudarc::driver::{
    CudaContext, CudaFunction, CudaSlice, CudaStream, LaunchConfig as CudaLaunchConfig,
    PushKernelArg,
};
use cudarc::nvrtc::compile_ptx;
use std::fmt;
use std::sync::Arc;
use tracing::info;

const KERNELS_SRC: &str = r#"
extern "C" __global__ void scale_kernel(const float mult, const int n, float *vals) {
    for (int i = blockIdx.x * blockDim.x + threadIdx.x; i < n; i += blockDim.x * gridDim.x) {
        vals[i] *= mult;
    }
}
"#;

#[derive(Clone)]
pub struct CudaDevice {
    inner: Arc<CudaDeviceInner>,
}

struct CudaDeviceInner {
    ordinal: usize,
    stream: Arc<CudaStream>,
    scale_kernel: CudaFunction,
    max_threads_per_block: usize,
}

impl fmt::Debug for CudaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CudaDevice")
            .field("ordinal", &self.inner.ordinal)
            .field("max_threads_per_block", &self.inner.max_threads_per_block)
            .finish()
    }
}

fn map_driver_err(err: cudarc::driver::DriverError) -> DeviceError {
    DeviceError::Driver(format!("cuda driver error: {err}"))
}

impl CudaDevice {
    pub fn from_config(config: &DeviceConfig) -> Result<Self, DeviceError> {
        let ctx = CudaContext::new(config.device_ordinal).map_err(map_driver_err)?;
        let stream = ctx.default_stream();
        let ptx = compile_ptx(KERNELS_SRC)
            .map_err(|e| DeviceError::Driver(format!("cuda compile error: {e}")))?;
        let module = ctx.load_module(ptx).map_err(map_driver_err)?;
        let scale_kernel = module
            .load_function("scale_kernel")
            .map_err(map_driver_err)?;
        info!(
            ordinal = config.device_ordinal,
            max_threads_per_block = config.max_threads_per_block,
            "Opened CUDA device."
        );
        Ok(Self {
            inner: Arc::new(CudaDeviceInner {
                ordinal: config.device_ordinal,
                stream,
                scale_kernel,
                max_threads_per_block: config.max_threads_per_block.max(1),
            }),
        })
    }

    fn synchronize(&self) -> Result<(), DeviceError> {
        self.inner.stream.synchronize().map_err(map_driver_err)
    }
}

impl Device for CudaDevice {
    type Buffer = CudaSlice<f32>;

    fn name(&self) -> &'static str {
        "cuda"
    }

    fn max_threads_per_block(&self) -> usize {
        self.inner.max_threads_per_block
    }

    fn alloc(&self, len: usize) -> Result<CudaSlice<f32>, DeviceError> {
        self.inner
            .stream
            .alloc_zeros::<f32>(len)
            .map_err(map_driver_err)
    }

    fn capacity(&self, buffer: &CudaSlice<f32>) -> usize {
        buffer.len()
    }

    fn upload(&self, src: &[f32], dst: &mut CudaSlice<f32>) -> Result<(), DeviceError> {
        check_bounds(src.len(), dst.len())?;
        let mut view = dst.slice_mut(0..src.len());
        self.inner
            .stream
            .memcpy_htod(src, &mut view)
            .map_err(map_driver_err)?;
        self.synchronize()
    }

    fn download(&self, src: &CudaSlice<f32>, dst: &mut [f32]) -> Result<(), DeviceError> {
        check_bounds(dst.len(), src.len())?;
        let view = src.slice(0..dst.len());
        self.inner
            .stream
            .memcpy_dtoh(&view, dst)
            .map_err(map_driver_err)?;
        self.synchronize()
    }

    fn copy(
        &self,
        src: &CudaSlice<f32>,
        dst: &mut CudaSlice<f32>,
        len: usize,
    ) -> Result<(), DeviceError> {
        check_bounds(len, src.len())?;
        check_bounds(len, dst.len())?;
        let src_view = src.slice(0..len);
        let mut dst_view = dst.slice_mut(0..len);
        self.inner
            .stream
            .memcpy_dtod(&src_view, &mut dst_view)
            .map_err(map_driver_err)?;
        self.synchronize()
    }

    fn fill_zero(&self, buffer: &mut CudaSlice<f32>, len: usize) -> Result<(), DeviceError> {
        check_bounds(len, buffer.len())?;
        let mut view = buffer.slice_mut(0..len);
        self.inner
            .stream
            .memset_zeros(&mut view)
            .map_err(map_driver_err)?;
        self.synchronize()
    }

    fn scale(
        &self,
        buffer: &mut CudaSlice<f32>,
        len: usize,
        mult: f32,
        launch: LaunchConfig,
    ) -> Result<(), DeviceError> {
        check_bounds(len, buffer.len())?;
        let cfg = CudaLaunchConfig {
            grid_dim: (launch.grid_dim, 1, 1),
            block_dim: (launch.block_dim, 1, 1),
            shared_mem_bytes: 0,
        };
        let n = len as i32;
        let mut view = buffer.slice_mut(0..len);
        // SAFETY: argument order and types match `scale_kernel`, and `view` covers the
        // `n` elements the kernel writes.
        unsafe {
            let mut builder = self.inner.stream.launch_builder(&self.inner.scale_kernel);
            builder.arg(&mult);
            builder.arg(&n);
            builder.arg(&mut view);
            builder
                .launch(cfg)
                .map_err(|e| DeviceError::Launch(e.to_string()))?;
        }
        self.synchronize()
    }
}
