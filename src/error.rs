//! Error types for element IR validation and kernel generation.
use crate::ir::MappingKind;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// An element IR violates one of its construction-time invariants.
///
/// Generation never starts for an IR that fails validation, so no partial statement tree
/// is ever produced alongside this error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Topological or geometric dimension outside `1 ..= 3`, or `tdim > gdim`.
    InvalidDimensions { tdim: usize, gdim: usize },
    /// The dof at `position` carries a different `id`.
    DofIdMismatch { position: usize, id: usize },
    /// A mapping label that does not name one of the supported mappings.
    UnknownMapping(String),
    /// The number of reference components does not match the arity of the mapping.
    ReferenceComponentMismatch {
        dof: Option<usize>,
        mapping: MappingKind,
        expected: usize,
        actual: usize,
    },
    /// A reference or physical value size too large for the integer type of generated code.
    ValueSizeTooLarge { value_size: usize },
    /// `reference_offset + num_reference_components` exceeds the reference value size.
    ReferenceOffsetOutOfBounds {
        dof: usize,
        end: usize,
        reference_value_size: usize,
    },
    /// `physical_offset + num_physical_components` exceeds the physical value size.
    PhysicalOffsetOutOfBounds {
        dof: usize,
        end: usize,
        physical_value_size: usize,
    },
    /// Reference dof coordinates are not one point of `tdim` coordinates per dof.
    InvalidDofCoordinates {
        num_dofs: usize,
        tdim: usize,
        num_points: usize,
        num_entries: usize,
    },
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { tdim, gdim } => write!(
                f,
                "Invalid element dimensions (tdim = {tdim}, gdim = {gdim}). \
                 Require 1 <= tdim <= gdim <= 3."
            ),
            Self::DofIdMismatch { position, id } => {
                write!(f, "Dof at position {position} has id {id}. Dof ids must match their position.")
            }
            Self::UnknownMapping(label) => write!(f, "Unknown mapping: {label}"),
            Self::ValueSizeTooLarge { value_size } => {
                write!(f, "Value size {value_size} exceeds the largest representable index.")
            }
            Self::ReferenceComponentMismatch {
                dof,
                mapping,
                expected,
                actual,
            } => {
                match dof {
                    Some(dof) => write!(f, "Dof {dof} uses {mapping} mapping, ")?,
                    None => write!(f, "The {mapping} mapping was selected, ")?,
                }
                write!(
                    f,
                    "which requires {expected} reference components, but {actual} were declared."
                )
            }
            Self::ReferenceOffsetOutOfBounds {
                dof,
                end,
                reference_value_size,
            } => write!(
                f,
                "Reference components of dof {dof} end at {end}, \
                 beyond the reference value size {reference_value_size}."
            ),
            Self::PhysicalOffsetOutOfBounds {
                dof,
                end,
                physical_value_size,
            } => write!(
                f,
                "Physical components of dof {dof} end at {end}, \
                 beyond the physical value size {physical_value_size}."
            ),
            Self::InvalidDofCoordinates {
                num_dofs,
                tdim,
                num_points,
                num_entries,
            } => write!(
                f,
                "Expected one reference dof coordinate point with {tdim} entries for each of the \
                 {num_dofs} dofs, got {num_points} points with {num_entries} entries in total."
            ),
        }
    }
}

impl Error for ConfigurationError {}

/// A requested function is not available for an element.
///
/// This is not a failure of generation: the kernel for such a function is emitted as a
/// documented stub which returns `-1` when called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFeature {
    pub function: String,
    pub reason: String,
}

impl Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.function, self.reason)
    }
}

impl Error for UnsupportedFeature {}

/// Failure to render a formatting template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references a field that the record does not provide.
    UnknownField(String),
    /// A `{` without a matching `}`.
    UnterminatedPlaceholder { position: usize },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField(name) => write!(f, "Template references unknown field `{name}`."),
            Self::UnterminatedPlaceholder { position } => {
                write!(f, "Unterminated template placeholder starting at byte {position}.")
            }
        }
    }
}

impl Error for TemplateError {}
