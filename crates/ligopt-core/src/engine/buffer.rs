use super::device::{Device, LaunchConfig};
use super::error::EngineError;
use std::fmt;
use tracing::trace;

/// Exclusive owner of one device buffer holding `len` meaningful `f32` values.
///
/// Copies are always deep. The underlying allocation may be larger than `len` after an
/// assignment from a shorter vector; it is released when the vector is dropped.
pub struct DeviceVector<D: Device> {
    device: D,
    buffer: D::Buffer,
    len: usize,
}

impl<D: Device> DeviceVector<D> {
    pub fn from_host(device: &D, values: &[f32]) -> Result<Self, EngineError> {
        let mut buffer = device.alloc(values.len())?;
        device.upload(values, &mut buffer)?;
        Ok(Self {
            device: device.clone(),
            buffer,
            len: values.len(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.device.capacity(&self.buffer)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn try_clone(&self) -> Result<Self, EngineError> {
        let mut buffer = self.device.alloc(self.len)?;
        self.device.copy(&self.buffer, &mut buffer, self.len)?;
        Ok(Self {
            device: self.device.clone(),
            buffer,
            len: self.len,
        })
    }

    /// Deep-copies `src` into `self`, reusing the current allocation when it is large enough.
    pub fn assign_from(&mut self, src: &Self) -> Result<&mut Self, EngineError> {
        if self.capacity() < src.len {
            trace!(
                from = self.capacity(),
                to = src.len,
                "Reallocating device vector for assignment."
            );
            // Allocate before releasing so a failure leaves the old buffer intact.
            self.buffer = self.device.alloc(src.len)?;
        }
        self.device.copy(&src.buffer, &mut self.buffer, src.len)?;
        self.len = src.len;
        Ok(self)
    }

    pub fn clear(&mut self) -> Result<(), EngineError> {
        self.device.fill_zero(&mut self.buffer, self.len)?;
        Ok(())
    }

    pub fn scale(&mut self, mult: f32) -> Result<(), EngineError> {
        if self.len == 0 {
            return Ok(());
        }
        let launch = LaunchConfig::for_elements(self.len, self.device.max_threads_per_block());
        self.device.scale(&mut self.buffer, self.len, mult, launch)?;
        Ok(())
    }

    pub fn get_data(&self) -> Result<Vec<f32>, EngineError> {
        let mut data = vec![0.0; self.len];
        self.device.download(&self.buffer, &mut data)?;
        Ok(data)
    }

    pub fn set_data(&mut self, data: &[f32]) -> Result<(), EngineError> {
        if data.len() != self.len {
            return Err(EngineError::LengthMismatch {
                operation: "set_data",
                expected: self.len,
                found: data.len(),
            });
        }
        self.device.upload(data, &mut self.buffer)?;
        Ok(())
    }
}

impl<D: Device> fmt::Debug for DeviceVector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceVector")
            .field("device", &self.device.name())
            .field("len", &self.len)
            .finish()
    }
}

impl<D: Device> fmt::Display for DeviceVector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.get_data().map_err(|_| fmt::Error)?;
        for (i, v) in data.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Returns the only ligand of a model, rejecting zero or several.
pub(crate) fn single_ligand<T>(ligands: &[T]) -> Result<&T, EngineError> {
    match ligands {
        [ligand] => Ok(ligand),
        _ => Err(EngineError::LigandCount {
            found: ligands.len(),
        }),
    }
}
