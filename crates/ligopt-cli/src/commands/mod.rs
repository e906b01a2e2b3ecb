use crate::error::{CliError, Result};
use ligopt::engine::config::{Backend, DeviceConfig};
use ligopt::engine::device::{Device, HostDevice};
use tracing::info;

pub mod bfgs;
pub mod step;

/// Work that can run on any device backend.
pub trait DeviceTask {
    type Output;

    fn run<D: Device>(self, device: &D) -> Result<Self::Output>;
}

/// Opens the backend selected by `config` and runs `task` on it.
pub fn dispatch<T: DeviceTask>(config: &DeviceConfig, task: T) -> Result<T::Output> {
    match config.backend {
        Backend::Host => {
            let device = HostDevice::from_config(config);
            info!("Running on device '{}'.", device.name());
            task.run(&device)
        }
        #[cfg(feature = "cuda")]
        Backend::Cuda => {
            let device = ligopt::engine::device::CudaDevice::from_config(config)
                .map_err(ligopt::engine::error::EngineError::from)?;
            info!("Running on device '{}'.", device.name());
            task.run(&device)
        }
        #[cfg(not(feature = "cuda"))]
        Backend::Cuda => Err(CliError::Argument(
            "the CUDA backend is not available in this build (rebuild with `--features cuda`)"
                .to_string(),
        )),
    }
}
