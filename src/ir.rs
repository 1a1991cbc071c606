//! Intermediate representation of a finite element, as consumed by the kernel generators.
//!
//! An [`ElementIr`] is validated once, at construction, and is immutable afterwards. All
//! generators in this crate trust a constructed IR and never re-check its invariants.
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// The pullback used to map the values of a basis function from the reference cell to
/// the physical cell.
///
/// Tensor-valued mappings (the two double Piola variants) assume that tensor components
/// are flattened in row-major order: component `(a, b)` of a reference `tdim x tdim` tensor
/// is stored at `a * tdim + b`, and of a physical `gdim x gdim` tensor at `a * gdim + b`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MappingKind {
    Affine,
    ContravariantPiola,
    CovariantPiola,
    DoubleCovariantPiola,
    DoubleContravariantPiola,
}

impl MappingKind {
    pub const ALL: [MappingKind; 5] = [
        MappingKind::Affine,
        MappingKind::ContravariantPiola,
        MappingKind::CovariantPiola,
        MappingKind::DoubleCovariantPiola,
        MappingKind::DoubleContravariantPiola,
    ];

    /// The canonical label of the mapping. Dof groups are ordered by this label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Affine => "affine",
            Self::ContravariantPiola => "contravariant piola",
            Self::CovariantPiola => "covariant piola",
            Self::DoubleCovariantPiola => "double covariant piola",
            Self::DoubleContravariantPiola => "double contravariant piola",
        }
    }

    /// Number of reference components a basis function with this mapping must have.
    pub fn num_reference_components(&self, tdim: usize) -> usize {
        match self {
            Self::Affine => 1,
            Self::ContravariantPiola | Self::CovariantPiola => tdim,
            Self::DoubleCovariantPiola | Self::DoubleContravariantPiola => tdim * tdim,
        }
    }

    /// Number of physical components produced by this mapping.
    pub fn num_physical_components(&self, gdim: usize) -> usize {
        match self {
            Self::Affine => 1,
            Self::ContravariantPiola | Self::CovariantPiola => gdim,
            Self::DoubleCovariantPiola | Self::DoubleContravariantPiola => gdim * gdim,
        }
    }
}

impl Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for MappingKind {
    type Err = ConfigurationError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == label)
            .ok_or_else(|| ConfigurationError::UnknownMapping(label.to_string()))
    }
}

impl TryFrom<String> for MappingKind {
    type Error = ConfigurationError;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        label.parse()
    }
}

impl From<MappingKind> for String {
    fn from(kind: MappingKind) -> Self {
        kind.label().to_string()
    }
}

/// Describes how a single degree of freedom maps from reference to physical values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DofDescriptor {
    pub id: usize,
    pub mapping: MappingKind,
    pub num_reference_components: usize,
    pub reference_offset: usize,
    pub physical_offset: usize,
}

impl DofDescriptor {
    pub fn new(
        id: usize,
        mapping: MappingKind,
        num_reference_components: usize,
        reference_offset: usize,
        physical_offset: usize,
    ) -> Self {
        Self {
            id,
            mapping,
            num_reference_components,
            reference_offset,
            physical_offset,
        }
    }
}

/// Whether reference basis values can be evaluated for the element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisEvaluation {
    #[default]
    Available,
    /// Evaluation is not available, with a human-readable reason that ends up in the
    /// generated stub.
    Unavailable(String),
}

/// Descriptive data of an element that does not influence the transformation kernel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementMetadata {
    pub factory_name: String,
    pub signature: String,
    pub family: String,
    pub degree: usize,
    /// Reference coordinates of the dofs, one point of `tdim` coordinates per dof.
    pub reference_dof_coordinates: Option<Vec<Vec<f64>>>,
}

/// The unvalidated parts of an [`ElementIr`].
///
/// This is the shape in which an IR arrives from an external producer. Convert it with
/// [`ElementIr::try_from`] to obtain a validated IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElementIr {
    pub tdim: usize,
    pub gdim: usize,
    pub max_order: usize,
    pub reference_value_size: usize,
    pub physical_value_size: usize,
    pub dofs: Vec<DofDescriptor>,
    #[serde(default)]
    pub basis_evaluation: BasisEvaluation,
    #[serde(default)]
    pub metadata: ElementMetadata,
}

/// A validated element description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawElementIr", into = "RawElementIr")]
pub struct ElementIr {
    raw: RawElementIr,
}

impl ElementIr {
    pub fn tdim(&self) -> usize {
        self.raw.tdim
    }

    pub fn gdim(&self) -> usize {
        self.raw.gdim
    }

    /// The maximum derivative order the generated kernels support.
    pub fn max_order(&self) -> usize {
        self.raw.max_order
    }

    pub fn reference_value_size(&self) -> usize {
        self.raw.reference_value_size
    }

    pub fn physical_value_size(&self) -> usize {
        self.raw.physical_value_size
    }

    pub fn dofs(&self) -> &[DofDescriptor] {
        &self.raw.dofs
    }

    pub fn num_dofs(&self) -> usize {
        self.raw.dofs.len()
    }

    pub fn basis_evaluation(&self) -> &BasisEvaluation {
        &self.raw.basis_evaluation
    }

    pub fn metadata(&self) -> &ElementMetadata {
        &self.raw.metadata
    }

    /// Whether reference and physical derivative directions coincide.
    pub fn is_volumetric(&self) -> bool {
        self.raw.tdim == self.raw.gdim
    }
}

impl TryFrom<RawElementIr> for ElementIr {
    type Error = ConfigurationError;

    fn try_from(raw: RawElementIr) -> Result<Self, Self::Error> {
        let RawElementIr { tdim, gdim, .. } = raw;
        if tdim == 0 || gdim > 3 || tdim > gdim {
            return Err(ConfigurationError::InvalidDimensions { tdim, gdim });
        }

        for value_size in [raw.reference_value_size, raw.physical_value_size] {
            if i64::try_from(value_size).is_err() {
                return Err(ConfigurationError::ValueSizeTooLarge { value_size });
            }
        }

        for (position, dof) in raw.dofs.iter().enumerate() {
            if dof.id != position {
                return Err(ConfigurationError::DofIdMismatch { position, id: dof.id });
            }

            let expected = dof.mapping.num_reference_components(tdim);
            if dof.num_reference_components != expected {
                return Err(ConfigurationError::ReferenceComponentMismatch {
                    dof: Some(dof.id),
                    mapping: dof.mapping,
                    expected,
                    actual: dof.num_reference_components,
                });
            }

            // An end that overflows cannot lie within the value size either
            let reference_end = dof.reference_offset.checked_add(dof.num_reference_components);
            if reference_end.map_or(true, |end| end > raw.reference_value_size) {
                return Err(ConfigurationError::ReferenceOffsetOutOfBounds {
                    dof: dof.id,
                    end: reference_end.unwrap_or(usize::MAX),
                    reference_value_size: raw.reference_value_size,
                });
            }

            let physical_end = dof
                .physical_offset
                .checked_add(dof.mapping.num_physical_components(gdim));
            if physical_end.map_or(true, |end| end > raw.physical_value_size) {
                return Err(ConfigurationError::PhysicalOffsetOutOfBounds {
                    dof: dof.id,
                    end: physical_end.unwrap_or(usize::MAX),
                    physical_value_size: raw.physical_value_size,
                });
            }
        }

        if let Some(points) = &raw.metadata.reference_dof_coordinates {
            if points.len() != raw.dofs.len() || points.iter().any(|point| point.len() != tdim) {
                return Err(ConfigurationError::InvalidDofCoordinates {
                    num_dofs: raw.dofs.len(),
                    tdim,
                    num_points: points.len(),
                    num_entries: points.iter().map(Vec::len).sum(),
                });
            }
        }

        Ok(Self { raw })
    }
}

impl From<ElementIr> for RawElementIr {
    fn from(ir: ElementIr) -> Self {
        ir.raw
    }
}
