use super::{DeviceTask, dispatch};
use crate::cli::StepArgs;
use crate::config::{PoseSection, StepInput, ensure_finite};
use crate::error::Result;
use ligopt::core::models::change::Change;
use ligopt::core::models::conf::Conf;
use ligopt::engine::change::StepVector;
use ligopt::engine::conf::ConfVector;
use ligopt::engine::config::DeviceConfig;
use ligopt::engine::device::Device;
use serde::Serialize;
use tracing::{debug, info};

const DEFAULT_FACTOR: f64 = 1.0;

struct StepTask {
    pose: Conf,
    step: Change,
    factor: f64,
}

impl DeviceTask for StepTask {
    type Output = Conf;

    fn run<D: Device>(self, device: &D) -> Result<Conf> {
        let mut conf = ConfVector::from_conf(device, &self.pose)?;
        let step = StepVector::from_change(device, &self.step)?;
        debug!("Pose before increment: {}", conf);

        conf.increment(&step, self.factor)?;
        debug!("Pose after increment: {}", conf);

        let mut result = self.pose;
        conf.set_cpu(&mut result)?;
        Ok(result)
    }
}

#[derive(Serialize)]
struct PoseOutput {
    pose: PoseSection,
}

/// Applies the step in `args.input` to its pose and renders the new pose as TOML.
pub fn apply(args: &StepArgs, config: &DeviceConfig) -> Result<String> {
    info!("Loading pose and step from {:?}", &args.input);
    let input = StepInput::from_file(&args.input)?;
    let factor = ensure_finite("factor", args.factor.or(input.factor).unwrap_or(DEFAULT_FACTOR))?;
    info!("Applying step with factor {}.", factor);

    let task = StepTask {
        pose: Conf::try_from(input.pose)?,
        step: Change::try_from(input.step)?,
        factor,
    };
    let pose = dispatch(config, task)?;

    let output = PoseOutput {
        pose: PoseSection::from_conf(&pose)?,
    };
    Ok(toml::to_string(&output)?)
}

pub fn run(args: StepArgs, config: &DeviceConfig) -> Result<()> {
    let rendered = apply(&args, config)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            println!("Updated pose written to: {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
