//! Engine configuration read from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::YieldError;
use crate::io::PROGRAM_COUNT;

/// Which whole-stem volume the stand computation starts from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMode {
    /// Use the whole-stem volume supplied with each species.
    ByUtilization,
    /// Estimate whole-stem volume from TPH and per-tree volume.
    #[default]
    EstimateWholeStem,
}

/// Locations of the control files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFiles {
    /// Base directory for relative paths. Defaults to the config file's directory.
    pub directory: Option<PathBuf>,

    #[serde(default = "default_bec_definitions")]
    pub bec_definitions: PathBuf,

    #[serde(default = "default_genus_definitions")]
    pub genus_definitions: PathBuf,

    #[serde(default = "default_volume_groups")]
    pub volume_groups: PathBuf,

    #[serde(default = "default_decay_groups")]
    pub decay_groups: PathBuf,

    #[serde(default = "default_breakage_groups")]
    pub breakage_groups: PathBuf,

    #[serde(default = "default_ba_util_components")]
    pub ba_util_components: PathBuf,

    #[serde(default = "default_dq_util_components")]
    pub dq_util_components: PathBuf,

    #[serde(default = "default_whole_stem_util")]
    pub whole_stem_util: PathBuf,

    #[serde(default = "default_close_utilization")]
    pub close_utilization: PathBuf,

    #[serde(default = "default_net_decay")]
    pub net_decay: PathBuf,

    #[serde(default = "default_net_decay_waste")]
    pub net_decay_waste: PathBuf,

    #[serde(default = "default_net_breakage")]
    pub net_breakage: PathBuf,

    #[serde(default = "default_total_stand_whole_stem")]
    pub total_stand_whole_stem: PathBuf,

    /// Species/region modifiers. Neutral modifiers are used when absent.
    pub modifiers: Option<PathBuf>,
}

fn default_bec_definitions() -> PathBuf {
    PathBuf::from("Becdef.dat")
}

fn default_genus_definitions() -> PathBuf {
    PathBuf::from("SP0DEF_v0.dat")
}

fn default_volume_groups() -> PathBuf {
    PathBuf::from("VGRPDEF1.DAT")
}

fn default_decay_groups() -> PathBuf {
    PathBuf::from("DGRP.DAT")
}

fn default_breakage_groups() -> PathBuf {
    PathBuf::from("BGRP.DAT")
}

fn default_ba_util_components() -> PathBuf {
    PathBuf::from("REGBAC.DAT")
}

fn default_dq_util_components() -> PathBuf {
    PathBuf::from("REGDQC.DAT")
}

fn default_whole_stem_util() -> PathBuf {
    PathBuf::from("REGVU.COE")
}

fn default_close_utilization() -> PathBuf {
    PathBuf::from("REGVCU.COE")
}

fn default_net_decay() -> PathBuf {
    PathBuf::from("REGVDU.COE")
}

fn default_net_decay_waste() -> PathBuf {
    PathBuf::from("REGVWU.COE")
}

fn default_net_breakage() -> PathBuf {
    PathBuf::from("REGBREAK.COE")
}

fn default_total_stand_whole_stem() -> PathBuf {
    PathBuf::from("VTOTREG4.COE")
}

impl Default for ControlFiles {
    fn default() -> Self {
        Self {
            directory: None,
            bec_definitions: default_bec_definitions(),
            genus_definitions: default_genus_definitions(),
            volume_groups: default_volume_groups(),
            decay_groups: default_decay_groups(),
            breakage_groups: default_breakage_groups(),
            ba_util_components: default_ba_util_components(),
            dq_util_components: default_dq_util_components(),
            whole_stem_util: default_whole_stem_util(),
            close_utilization: default_close_utilization(),
            net_decay: default_net_decay(),
            net_decay_waste: default_net_decay_waste(),
            net_breakage: default_net_breakage(),
            total_stand_whole_stem: default_total_stand_whole_stem(),
            modifiers: None,
        }
    }
}

impl ControlFiles {
    /// Resolve `file` against the control directory.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        match &self.directory {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Number of genus definitions expected in the genus file.
    #[serde(default = "default_species_count")]
    pub species_count: usize,

    /// Program column (1 to 6) of the modifier file that applies to this run.
    #[serde(default = "default_modifier_program")]
    pub modifier_program: usize,

    #[serde(default)]
    pub volume_mode: VolumeMode,
}

fn default_species_count() -> usize {
    16
}

fn default_modifier_program() -> usize {
    1
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            species_count: default_species_count(),
            modifier_program: default_modifier_program(),
            volume_mode: VolumeMode::default(),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub control: ControlFiles,

    #[serde(default)]
    pub processing: ProcessingOptions,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Without an explicit `directory`, control files resolve against the
    /// directory holding the config file.
    pub fn from_file(path: &Path) -> Result<Self, YieldError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.control.directory = Some(match config.control.directory.take() {
            Some(dir) if dir.is_relative() => base.join(dir),
            Some(dir) => dir,
            None => base.to_path_buf(),
        });
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self, YieldError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), YieldError> {
        if self.processing.species_count == 0 {
            return Err(YieldError::Validation(
                "species_count must be greater than 0".to_string(),
            ));
        }
        if !(1..=PROGRAM_COUNT).contains(&self.processing.modifier_program) {
            return Err(YieldError::Validation(format!(
                "modifier_program must be 1 to {PROGRAM_COUNT}, got {}",
                self.processing.modifier_program
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.processing.species_count, 16);
        assert_eq!(config.processing.modifier_program, 1);
        assert_eq!(config.processing.volume_mode, VolumeMode::EstimateWholeStem);
        assert_eq!(config.control.bec_definitions, PathBuf::from("Becdef.dat"));
        assert!(config.control.modifiers.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_toml(
            r#"
            [control]
            directory = "/data/coe"
            modifiers = "mod19813.prm"
            net_breakage = "/elsewhere/BREAK.COE"

            [processing]
            species_count = 3
            modifier_program = 4
            volume_mode = "by_utilization"
            "#,
        )
        .unwrap();
        assert_eq!(config.processing.species_count, 3);
        assert_eq!(config.processing.volume_mode, VolumeMode::ByUtilization);
        assert_eq!(
            config.control.resolve(&config.control.genus_definitions),
            PathBuf::from("/data/coe/SP0DEF_v0.dat")
        );
        assert_eq!(
            config.control.resolve(&config.control.net_breakage),
            PathBuf::from("/elsewhere/BREAK.COE")
        );
    }

    #[test]
    fn test_invalid_program() {
        let err = EngineConfig::from_toml("[processing]\nmodifier_program = 7\n").unwrap_err();
        assert!(matches!(err, YieldError::Validation(_)));
        let err = EngineConfig::from_toml("[processing]\nspecies_count = 0\n").unwrap_err();
        assert!(err.to_string().contains("species_count"));
    }

    #[test]
    fn test_from_file_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[processing]\nspecies_count = 2\n").unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(
            config.control.resolve(&config.control.volume_groups),
            dir.path().join("VGRPDEF1.DAT")
        );
    }

    #[test]
    fn test_malformed_toml() {
        let err = EngineConfig::from_toml("[processing\n").unwrap_err();
        assert!(matches!(err, YieldError::Config(_)));
    }
}
