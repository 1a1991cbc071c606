//! Pullbacks of reference basis values to physical values, one physical component at a time.
use crate::ast::{Expr, FlattenedArray};
use crate::error::ConfigurationError;
use crate::ir::MappingKind;
use itertools::iproduct;

/// Read access to the geometry of a single point inside generated code.
///
/// The arrays are the flattened kernel arguments with layouts `J[point][gdim][tdim]`,
/// `detJ[point]` and `K[point][tdim][gdim]`.
#[derive(Debug, Clone, Copy)]
pub struct PointGeometryAccess<'a> {
    pub jacobian: &'a FlattenedArray,
    pub det: &'a FlattenedArray,
    pub inverse: &'a FlattenedArray,
    pub point: &'a Expr,
}

impl<'a> PointGeometryAccess<'a> {
    pub fn j(&self, row: impl Into<Expr>, col: impl Into<Expr>) -> Expr {
        self.jacobian
            .at(vec![self.point.clone(), row.into(), col.into()])
    }

    pub fn det_j(&self) -> Expr {
        self.det.at(vec![self.point.clone()])
    }

    pub fn k(&self, row: impl Into<Expr>, col: impl Into<Expr>) -> Expr {
        self.inverse
            .at(vec![self.point.clone(), row.into(), col.into()])
    }
}

/// The linear map producing one physical component from the reference components of a
/// basis function.
///
/// Physical component `i` equals `scale * sum_j row[j] * reference[reference_offset + j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingKernel {
    pub scale: Expr,
    pub row: Vec<Expr>,
    pub num_physical_components: usize,
}

impl MappingKernel {
    /// Applies the map to reference components given by `reference(j)`.
    pub fn apply(&self, reference: impl Fn(usize) -> Expr) -> Expr {
        let weighted = self
            .row
            .iter()
            .enumerate()
            .map(|(j, coefficient)| coefficient.clone() * reference(j));
        self.scale.clone() * Expr::sum(weighted)
    }
}

/// Selects the mapping kernel for physical component `i` of a basis function.
///
/// `i` is usually a loop variable of the generated code, but any expression will do.
///
/// # Errors
///
/// Returns [`ConfigurationError::ReferenceComponentMismatch`] if
/// `num_reference_components` does not match the arity the mapping requires.
pub fn select_mapping_kernel(
    mapping: MappingKind,
    i: &Expr,
    num_reference_components: usize,
    tdim: usize,
    gdim: usize,
    geometry: &PointGeometryAccess,
) -> Result<MappingKernel, ConfigurationError> {
    let expected = mapping.num_reference_components(tdim);
    if num_reference_components != expected {
        return Err(ConfigurationError::ReferenceComponentMismatch {
            dof: None,
            mapping,
            expected,
            actual: num_reference_components,
        });
    }
    let num_physical_components = mapping.num_physical_components(gdim);

    let (scale, row) = match mapping {
        MappingKind::Affine => (Expr::int(1), vec![Expr::int(1)]),
        MappingKind::ContravariantPiola => {
            let scale = Expr::float(1.0) / geometry.det_j();
            let row = (0..tdim).map(|j| geometry.j(i.clone(), j)).collect();
            (scale, row)
        }
        MappingKind::CovariantPiola => {
            let row = (0..tdim).map(|j| geometry.k(j, i.clone())).collect();
            (Expr::float(1.0), row)
        }
        MappingKind::DoubleCovariantPiola => {
            // g_il = K_ji G_jk K_kl
            let (i0, i1) = split_tensor_index(i, gdim);
            let row = tensor_indices(tdim)
                .map(|(j, k)| geometry.k(j, i0.clone()) * geometry.k(k, i1.clone()))
                .collect();
            (Expr::float(1.0), row)
        }
        MappingKind::DoubleContravariantPiola => {
            // g_il = (det J)^(-2) J_ij G_jk J_lk
            let (i0, i1) = split_tensor_index(i, gdim);
            let det = geometry.det_j();
            let scale = Expr::float(1.0) / (det.clone() * det);
            let row = tensor_indices(tdim)
                .map(|(j, k)| geometry.j(i0.clone(), j) * geometry.j(i1.clone(), k))
                .collect();
            (scale, row)
        }
    };

    Ok(MappingKernel {
        scale,
        row,
        num_physical_components,
    })
}

/// Row-major split of a flattened `dim x dim` tensor component index.
fn split_tensor_index(i: &Expr, dim: usize) -> (Expr, Expr) {
    (i.clone() / dim, i.clone() % dim)
}

fn tensor_indices(tdim: usize) -> impl Iterator<Item = (usize, usize)> {
    iproduct!(0..tdim, 0..tdim)
}
