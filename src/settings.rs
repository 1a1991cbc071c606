use serde::{Deserialize, Serialize};

/// Options controlling the shape of generated code.
///
/// Settings never change the numerical result of a kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenSettings {
    /// Type name used for integer declarations and loop indices.
    pub index_type: String,
    /// Print a warning instead of raising an error in stubs for unavailable functions.
    pub convert_exceptions_to_warnings: bool,
    /// Significant digits of rendered floating-point literals.
    pub float_precision: usize,
}

impl Default for CodegenSettings {
    fn default() -> Self {
        Self {
            index_type: "int64_t".to_string(),
            convert_exceptions_to_warnings: false,
            float_precision: 17,
        }
    }
}
