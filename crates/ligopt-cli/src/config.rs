use crate::cli::Cli;
use crate::error::{CliError, Result};
use ligopt::core::models::change::{Change, LigandChange, ResidueChange, RigidChange};
use ligopt::core::models::conf::{Conf, LigandConf, ResidueConf, RigidConf};
use ligopt::core::utils::quaternion::to_components;
use ligopt::engine::config::DeviceConfig;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub fn resolve_device_config(cli: &Cli) -> Result<DeviceConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            debug!("Loading device configuration from file: {:?}", path);
            DeviceConfig::load(path)?
        }
        None => DeviceConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    Ok(config)
}

/// Rejects NaN and infinite values before they reach the device.
pub fn ensure_finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CliError::Argument(format!("`{name}` must be finite, got {value}")))
    }
}

fn ensure_all_finite<'a>(name: &str, values: impl IntoIterator<Item = &'a f64>) -> Result<()> {
    for &value in values {
        ensure_finite(name, value)?;
    }
    Ok(())
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    debug!("Reading input file: {:?}", path);
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoseSection {
    pub position: [f64; 3],
    /// Scalar-first unit quaternion.
    pub orientation: [f64; 4],
    #[serde(default)]
    pub torsions: Vec<f64>,
    #[serde(default)]
    pub flex: Vec<Vec<f64>>,
}

impl TryFrom<PoseSection> for Conf {
    type Error = CliError;

    fn try_from(p: PoseSection) -> Result<Self> {
        ensure_all_finite("pose.position", &p.position)?;
        ensure_all_finite("pose.orientation", &p.orientation)?;
        ensure_all_finite("pose.torsions", p.torsions.iter().chain(p.flex.iter().flatten()))?;

        let [w, x, y, z] = p.orientation;
        let orientation = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), f64::EPSILON)
            .ok_or_else(|| {
                CliError::Argument("`pose.orientation` must be a non-zero quaternion".to_string())
            })?;

        Ok(Conf::new(
            vec![LigandConf {
                rigid: RigidConf::new(Vector3::from(p.position), orientation),
                torsions: p.torsions,
            }],
            p.flex
                .into_iter()
                .map(|torsions| ResidueConf { torsions })
                .collect(),
        ))
    }
}

impl PoseSection {
    /// Expects the single-ligand shape produced by the device writeback.
    pub fn from_conf(conf: &Conf) -> Result<Self> {
        let ligand = match conf.ligands.as_slice() {
            [ligand] => ligand,
            other => {
                return Err(CliError::Argument(format!(
                    "expected exactly one ligand in pose, found {}",
                    other.len()
                )));
            }
        };
        Ok(Self {
            position: ligand.rigid.position.into(),
            orientation: to_components(&ligand.rigid.orientation),
            torsions: ligand.torsions.clone(),
            flex: conf.flex.iter().map(|r| r.torsions.clone()).collect(),
        })
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StepSection {
    #[serde(default)]
    pub position: [f64; 3],
    /// Rotation vector in radians.
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default)]
    pub torsions: Vec<f64>,
    #[serde(default)]
    pub flex: Vec<Vec<f64>>,
}

impl TryFrom<StepSection> for Change {
    type Error = CliError;

    fn try_from(s: StepSection) -> Result<Self> {
        ensure_all_finite("step.position", &s.position)?;
        ensure_all_finite("step.rotation", &s.rotation)?;
        ensure_all_finite("step.torsions", s.torsions.iter().chain(s.flex.iter().flatten()))?;

        Ok(Change::new(
            vec![LigandChange {
                rigid: RigidChange::new(Vector3::from(s.position), Vector3::from(s.rotation)),
                torsions: s.torsions,
            }],
            s.flex
                .into_iter()
                .map(|torsions| ResidueChange { torsions })
                .collect(),
        ))
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct StepInput {
    pub factor: Option<f64>,
    pub pose: PoseSection,
    pub step: StepSection,
}

impl StepInput {
    pub fn from_file(path: &Path) -> Result<Self> {
        read_toml(path)
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BfgsInput {
    pub alpha: Option<f64>,
    pub initial_diagonal: Option<f64>,
    pub p: Vec<f32>,
    pub y: Vec<f32>,
}

impl BfgsInput {
    pub fn from_file(path: &Path) -> Result<Self> {
        let input: Self = read_toml(path)?;
        if input.p.len() != input.y.len() {
            return Err(CliError::Argument(format!(
                "`p` has {} entries but `y` has {}",
                input.p.len(),
                input.y.len()
            )));
        }
        if input.p.len() < 6 {
            return Err(CliError::Argument(format!(
                "step vectors need at least 6 entries, found {}",
                input.p.len()
            )));
        }
        if let Some(v) = input.p.iter().chain(&input.y).find(|v| !v.is_finite()) {
            return Err(CliError::Argument(format!(
                "`p` and `y` must be finite, found {v}"
            )));
        }
        Ok(input)
    }
}
