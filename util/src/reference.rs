//! Straightforward dense-matrix versions of the transformations performed by generated kernels.
use fenris_codegen::geometry::{GeometryBundle, PointGeometry};
use fenris_codegen::ir::{ElementIr, MappingKind};
use nalgebra::{DMatrix, DVector};

/// Physical components of one basis function from its reference components.
///
/// Tensors are stored row-major.
pub fn pullback(mapping: MappingKind, geometry: &PointGeometry, reference: &[f64]) -> DVector<f64> {
    let j = geometry.jacobian();
    let k = geometry.inverse();
    let det = geometry.det();
    let tdim = geometry.tdim();
    let gdim = geometry.gdim();
    let tensor = || DMatrix::from_row_slice(tdim, tdim, reference);
    let flatten = |m: DMatrix<f64>| DVector::from_iterator(gdim * gdim, m.transpose().iter().copied());

    match mapping {
        MappingKind::Affine => DVector::from_element(1, reference[0]),
        MappingKind::ContravariantPiola => j * DVector::from_column_slice(reference) / det,
        MappingKind::CovariantPiola => k.transpose() * DVector::from_column_slice(reference),
        MappingKind::DoubleCovariantPiola => flatten(k.transpose() * tensor() * k),
        MappingKind::DoubleContravariantPiola => flatten(j * tensor() * j.transpose() / (det * det)),
    }
}

/// The digits of `index` in base `dim`, most significant first.
fn directions(index: usize, dim: usize, order: usize) -> Vec<usize> {
    let mut digits = vec![0; order];
    let mut rest = index;
    for digit in digits.iter_mut().rev() {
        *digit = rest % dim;
        rest /= dim;
    }
    digits
}

/// The `gdim^order x tdim^order` matrix taking reference derivatives to physical derivatives.
pub fn derivative_transform(geometry: &PointGeometry, order: usize) -> DMatrix<f64> {
    let tdim = geometry.tdim();
    let gdim = geometry.gdim();
    let k = geometry.inverse();
    DMatrix::from_fn(gdim.pow(order as u32), tdim.pow(order as u32), |r, s| {
        let physical = directions(r, gdim, order);
        let reference = directions(s, tdim, order);
        reference
            .iter()
            .zip(&physical)
            .map(|(&q, &p)| k[(q, p)])
            .product()
    })
}

/// The expected output of a transformation kernel, in the layout
/// `[point][dof][physical derivative][physical component]`.
pub fn transform_values(
    ir: &ElementIr,
    geometry: &GeometryBundle,
    order: usize,
    reference_values: &[f64],
) -> Vec<f64> {
    let num_dofs = ir.num_dofs();
    let rvs = ir.reference_value_size();
    let pvs = ir.physical_value_size();
    let nt = ir.tdim().pow(order as u32);
    let ng = ir.gdim().pow(order as u32);

    let mut values = vec![0.0; geometry.num_points() * num_dofs * ng * pvs];
    for (ip, point) in geometry.points().iter().enumerate() {
        let transform = derivative_transform(point, order);
        for (d, dof) in ir.dofs().iter().enumerate() {
            let mapped: Vec<DVector<f64>> = (0..nt)
                .map(|s| {
                    let begin = ((ip * num_dofs + d) * nt + s) * rvs + dof.reference_offset;
                    pullback(
                        dof.mapping,
                        point,
                        &reference_values[begin..begin + dof.num_reference_components],
                    )
                })
                .collect();
            for r in 0..ng {
                for (c, _) in mapped[0].iter().enumerate() {
                    let value: f64 = (0..nt).map(|s| transform[(r, s)] * mapped[s][c]).sum();
                    values[((ip * num_dofs + d) * ng + r) * pvs + dof.physical_offset + c] = value;
                }
            }
        }
    }
    values
}
