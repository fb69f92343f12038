//! Fighter, weapon, and script file handling

use anyhow::{Context, Result};
use poser_animation::{LayerOptions, PRIMARY_LAYER};
use poser_core::{FighterConfig, Pose};
use poser_rig::WeaponRig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// On-disk document format, picked by file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// `.toml` is TOML, anything else is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn parse_fighter(source: &str, format: Format) -> Result<FighterConfig> {
    let config = match format {
        Format::Json => FighterConfig::from_json_str(source)?,
        Format::Toml => FighterConfig::from_toml_str(source)?,
    };
    Ok(config)
}

/// Load a fighter configuration
pub fn load_fighter(path: &Path) -> Result<FighterConfig> {
    let source = read(path)?;
    parse_fighter(&source, Format::from_path(path))
        .with_context(|| format!("Failed to parse fighter config {}", path.display()))
}

pub fn parse_rig(source: &str, format: Format) -> Result<WeaponRig> {
    let rig = match format {
        Format::Json => WeaponRig::from_json_str(source)?,
        Format::Toml => toml::from_str::<WeaponRig>(source)?.validated()?,
    };
    Ok(rig)
}

/// Load a weapon rig definition
pub fn load_rig(path: &Path) -> Result<WeaponRig> {
    let source = read(path)?;
    parse_rig(&source, Format::from_path(path))
        .with_context(|| format!("Failed to parse weapon rig {}", path.display()))
}

/// Timed layer pushes replayed during a simulation
#[derive(Debug, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub pushes: Vec<ScriptedPush>,
}

/// One layer push in a script
#[derive(Debug, Deserialize)]
pub struct ScriptedPush {
    /// Simulation time of the push
    #[serde(default)]
    pub at_ms: f64,
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub pose: Pose,
    /// Bare duration or an options object
    #[serde(default)]
    pub options: serde_json::Value,
}

fn default_layer() -> String {
    PRIMARY_LAYER.to_string()
}

impl ScriptedPush {
    pub fn layer_options(&self) -> LayerOptions {
        LayerOptions::from_json(&self.options)
    }
}

impl Script {
    pub fn parse(source: &str, format: Format) -> Result<Self> {
        let mut script: Script = match format {
            Format::Json => serde_json::from_str(source)?,
            Format::Toml => toml::from_str(source)?,
        };
        script.pushes.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = read(path)?;
        Self::parse(&source, Format::from_path(path))
            .with_context(|| format!("Failed to parse script {}", path.display()))
    }
}
