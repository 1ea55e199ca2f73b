//! Run configuration for an SSH band sweep, read from a flat TOML table.
//!
//! Recognized keys, all optional:
//! ```toml
//! t = 1.0                     # intracell hopping
//! tp = 1.1                    # intercell hopping
//! delta = 0.0                 # on-site imbalance
//! kpoints = 50                # number of momenta in [0, 2π]
//! outdir = "output/ssh_bloch" # where output files are written
//! parallel = false            # diagonalize momenta in parallel
//! ```

use std::path::{ Path, PathBuf };
use crate::{
    bands::{ BandStructure, HBuilderSSH, HSSHParams, k_grid, sweep_par_with, sweep_with },
    error::{ ConfigError, SpectralResult },
};

#[derive(Clone, Debug, PartialEq)]
pub struct SweepConfig {
    pub params: HSSHParams,
    pub kpoints: usize,
    pub outdir: PathBuf,
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            params: HSSHParams { t: 1.0, tp: 1.1, delta: 0.0 },
            kpoints: 50,
            outdir: PathBuf::from("output/ssh_bloch"),
            parallel: false,
        }
    }
}

fn get_float(key: &str, value: &toml::Value) -> Result<f64, ConfigError> {
    let x: f64
        = match value {
            toml::Value::Float(f) => *f,
            toml::Value::Integer(i) => *i as f64,
            _ => { return Err(ConfigError::BadType(key.to_string())); },
        };
    if x.is_finite() {
        Ok(x)
    } else {
        Err(ConfigError::BadValue {
            key: key.to_string(),
            reason: "must be finite".to_string(),
        })
    }
}

fn get_count(key: &str, value: &toml::Value) -> Result<usize, ConfigError> {
    let i: i64
        = value.as_integer()
        .ok_or_else(|| ConfigError::BadType(key.to_string()))?;
    usize::try_from(i)
        .map_err(|_| ConfigError::BadValue {
            key: key.to_string(),
            reason: "must be non-negative".to_string(),
        })
}

impl SweepConfig {
    /// Parse from a TOML string, filling in missing keys with their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = s.parse()?;
        let mut config = Self::default();
        for (key, value) in table.iter() {
            match key.as_str() {
                "t" => { config.params.t = get_float(key, value)?; },
                "tp" => { config.params.tp = get_float(key, value)?; },
                "delta" => { config.params.delta = get_float(key, value)?; },
                "kpoints" => { config.kpoints = get_count(key, value)?; },
                "outdir" => {
                    config.outdir
                        = value.as_str()
                        .ok_or_else(|| ConfigError::BadType(key.clone()))?
                        .into();
                },
                "parallel" => {
                    config.parallel
                        = value.as_bool()
                        .ok_or_else(|| ConfigError::BadType(key.clone()))?;
                },
                _ => { return Err(ConfigError::UnknownKey(key.clone())); },
            }
        }
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load<P>(path: P) -> Result<Self, ConfigError>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_toml_str(&s)
    }

    /// Return a Hamiltonian builder for the configured parameters.
    pub fn builder(&self) -> HBuilderSSH { HBuilderSSH::new(self.params) }

    /// Run the configured sweep.
    pub fn run(&self) -> SpectralResult<BandStructure> {
        let h = self.builder();
        let k = k_grid(self.kpoints);
        if self.parallel {
            sweep_par_with(&h, &k)
        } else {
            sweep_with(&h, &k)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_is_default() {
        assert_eq!(SweepConfig::from_toml_str("").unwrap(), SweepConfig::default());
    }

    #[test]
    fn full_table() {
        let s = r#"
            t = 1
            tp = 2.5
            delta = -0.25
            kpoints = 101
            outdir = "out/run0"
            parallel = true
        "#;
        let config = SweepConfig::from_toml_str(s).unwrap();
        assert_eq!(config.params, HSSHParams { t: 1.0, tp: 2.5, delta: -0.25 });
        assert_eq!(config.kpoints, 101);
        assert_eq!(config.outdir, PathBuf::from("out/run0"));
        assert!(config.parallel);

        let bands = config.run().unwrap();
        assert_eq!(bands.evals().shape(), &[101, 2]);
    }

    #[test]
    fn bad_values() {
        assert!(matches!(
            SweepConfig::from_toml_str("kpoints = -3"),
            Err(ConfigError::BadValue { .. })
        ));
        assert!(matches!(
            SweepConfig::from_toml_str("kpoints = 3.5"),
            Err(ConfigError::BadType(_))
        ));
        assert!(matches!(
            SweepConfig::from_toml_str("t = inf"),
            Err(ConfigError::BadValue { .. })
        ));
        assert!(matches!(
            SweepConfig::from_toml_str("tp = \"big\""),
            Err(ConfigError::BadType(_))
        ));
        assert!(matches!(
            SweepConfig::from_toml_str("hopping = 1.0"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            SweepConfig::from_toml_str("t = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            SweepConfig::load("/nonexistent/ssh_bloch.toml"),
            Err(ConfigError::Io(..))
        ));
    }
}
