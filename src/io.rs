//! Loading of element descriptions and settings from JSON.
use crate::ir::ElementIr;
use crate::settings::CodegenSettings;
use eyre::{eyre, Context};
use log::debug;
use std::fs;
use std::path::Path;

/// Parses and validates an element IR from a JSON string.
pub fn parse_element_ir_json(json: &str) -> eyre::Result<ElementIr> {
    serde_json::from_str(json).wrap_err("failed to parse element IR")
}

/// Loads a validated element IR from a JSON file.
pub fn load_element_ir_json(path: impl AsRef<Path>) -> eyre::Result<ElementIr> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).wrap_err_with(|| format!("failed to read element IR from {}", path.display()))?;
    let ir = parse_element_ir_json(&json).wrap_err_with(|| format!("invalid element IR in {}", path.display()))?;
    debug!(
        "Loaded element {:?} with {} dofs from {}.",
        ir.metadata().factory_name,
        ir.num_dofs(),
        path.display()
    );
    Ok(ir)
}

/// Loads a list of element IRs from a JSON file containing an array.
pub fn load_element_irs_json(path: impl AsRef<Path>) -> eyre::Result<Vec<ElementIr>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).wrap_err_with(|| format!("failed to read element IRs from {}", path.display()))?;
    let irs: Vec<ElementIr> =
        serde_json::from_str(&json).wrap_err_with(|| format!("invalid element IRs in {}", path.display()))?;
    if irs.is_empty() {
        return Err(eyre!("no elements in {}", path.display()));
    }
    Ok(irs)
}

/// Loads code generation settings from a JSON file. Missing fields take their defaults.
pub fn load_settings_json(path: impl AsRef<Path>) -> eyre::Result<CodegenSettings> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).wrap_err_with(|| format!("failed to read settings from {}", path.display()))?;
    serde_json::from_str(&json).wrap_err_with(|| format!("invalid settings in {}", path.display()))
}
