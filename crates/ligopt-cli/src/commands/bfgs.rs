use super::{DeviceTask, dispatch};
use crate::cli::BfgsArgs;
use crate::config::{BfgsInput, ensure_finite};
use crate::error::Result;
use ligopt::core::matrix::{SymmetricMatrix, TriangularMatrix};
use ligopt::core::models::size::ConfSize;
use ligopt::engine::bfgs::{UpdateOutcome, bfgs_update};
use ligopt::engine::change::{RIGID_DOF, StepVector};
use ligopt::engine::config::DeviceConfig;
use ligopt::engine::device::Device;
use std::fmt::Write;
use tracing::{info, warn};

const DEFAULT_ALPHA: f64 = 1.0;
const DEFAULT_INITIAL_DIAGONAL: f64 = 1.0;

struct BfgsTask {
    p: Vec<f32>,
    y: Vec<f32>,
    alpha: f64,
    initial_diagonal: f64,
}

impl DeviceTask for BfgsTask {
    type Output = (UpdateOutcome, TriangularMatrix);

    fn run<D: Device>(self, device: &D) -> Result<Self::Output> {
        let n = self.p.len();
        let shape = ConfSize::single_ligand(n.saturating_sub(RIGID_DOF), vec![]).zero_change();

        let mut p = StepVector::from_change(device, &shape)?;
        p.set_data(&self.p)?;
        let mut y = StepVector::from_change(device, &shape)?;
        y.set_data(&self.y)?;

        let mut h = TriangularMatrix::new(n, 0.0);
        h.set_diagonal(self.initial_diagonal);

        let outcome = bfgs_update(&mut h, &p, &y, self.alpha)?;
        Ok((outcome, h))
    }
}

/// Renders the full symmetric matrix, one row per line.
fn format_matrix<M: SymmetricMatrix>(m: &M) -> String {
    let mut out = String::new();
    for i in 0..m.dim() {
        let row: Vec<String> = (0..m.dim())
            .map(|j| format!("{:>12.6}", m.get(i, j)))
            .collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    out
}

pub fn apply(args: &BfgsArgs, config: &DeviceConfig) -> Result<(UpdateOutcome, TriangularMatrix)> {
    info!("Loading step and gradient difference from {:?}", &args.input);
    let input = BfgsInput::from_file(&args.input)?;
    let task = BfgsTask {
        alpha: ensure_finite("alpha", args.alpha.or(input.alpha).unwrap_or(DEFAULT_ALPHA))?,
        initial_diagonal: ensure_finite(
            "initial-diagonal",
            input.initial_diagonal.unwrap_or(DEFAULT_INITIAL_DIAGONAL),
        )?,
        p: input.p,
        y: input.y,
    };
    info!(
        "Updating a {}x{} inverse Hessian with alpha = {}.",
        task.p.len(),
        task.p.len(),
        task.alpha
    );
    dispatch(config, task)
}

pub fn run(args: BfgsArgs, config: &DeviceConfig) -> Result<()> {
    let (outcome, h) = apply(&args, config)?;
    match outcome {
        UpdateOutcome::Applied => println!("Update applied."),
        UpdateOutcome::CurvatureRejected { curvature } => {
            warn!("Update rejected: alpha * y.p = {:e}", curvature);
            println!("Update skipped: curvature {curvature:e} is not positive.");
        }
    }
    print!("{}", format_matrix(&h));
    Ok(())
}
