//! Element descriptions and geometries shared by the tests and benchmarks.
use fenris_codegen::geometry::PointGeometry;
use fenris_codegen::ir::{
    BasisEvaluation, DofDescriptor, ElementIr, ElementMetadata, MappingKind, RawElementIr,
};
use nalgebra::DMatrix;

use MappingKind::*;

/// Builds a raw IR whose dofs are given as `(mapping, reference_offset, physical_offset)`.
pub fn raw_element(
    name: &str,
    tdim: usize,
    gdim: usize,
    max_order: usize,
    reference_value_size: usize,
    physical_value_size: usize,
    dofs: &[(MappingKind, usize, usize)],
) -> RawElementIr {
    let dofs = dofs
        .iter()
        .enumerate()
        .map(|(id, &(mapping, reference_offset, physical_offset))| {
            DofDescriptor::new(
                id,
                mapping,
                mapping.num_reference_components(tdim),
                reference_offset,
                physical_offset,
            )
        })
        .collect();
    RawElementIr {
        tdim,
        gdim,
        max_order,
        reference_value_size,
        physical_value_size,
        dofs,
        basis_evaluation: BasisEvaluation::Available,
        metadata: ElementMetadata {
            factory_name: name.to_string(),
            signature: format!("FiniteElement('{name}')"),
            family: name.to_string(),
            degree: 1,
            reference_dof_coordinates: None,
        },
    }
}

fn validated(raw: RawElementIr) -> ElementIr {
    ElementIr::try_from(raw).expect("Fixture must be a valid element")
}

/// The same element with a different maximum derivative order.
pub fn with_max_order(ir: &ElementIr, max_order: usize) -> ElementIr {
    let mut raw = RawElementIr::from(ir.clone());
    raw.max_order = max_order;
    validated(raw)
}

/// Scalar P1 on triangles.
pub fn lagrange_triangle(max_order: usize) -> ElementIr {
    let mut raw = raw_element("lagrange_triangle", 2, 2, max_order, 1, 1, &[(Affine, 0, 0); 3]);
    raw.metadata.reference_dof_coordinates = Some(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
    validated(raw)
}

/// Scalar P1 on an interval embedded in the plane.
pub fn lagrange_interval_in_2d(max_order: usize) -> ElementIr {
    let mut raw = raw_element("lagrange_interval_in_2d", 1, 2, max_order, 1, 1, &[(Affine, 0, 0); 2]);
    raw.metadata.reference_dof_coordinates = Some(vec![vec![0.0], vec![1.0]]);
    validated(raw)
}

/// Lowest order Raviart-Thomas on triangles.
pub fn raviart_thomas_triangle(max_order: usize) -> ElementIr {
    validated(raw_element(
        "raviart_thomas_triangle",
        2,
        2,
        max_order,
        2,
        2,
        &[(ContravariantPiola, 0, 0); 3],
    ))
}

/// Lowest order Raviart-Thomas on a triangle embedded in space.
pub fn raviart_thomas_triangle_in_3d(max_order: usize) -> ElementIr {
    validated(raw_element(
        "raviart_thomas_triangle_in_3d",
        2,
        3,
        max_order,
        2,
        3,
        &[(ContravariantPiola, 0, 0); 3],
    ))
}

/// Lowest order Nedelec (first kind) on tetrahedra.
pub fn nedelec_tetrahedron(max_order: usize) -> ElementIr {
    validated(raw_element(
        "nedelec_tetrahedron",
        3,
        3,
        max_order,
        3,
        3,
        &[(CovariantPiola, 0, 0); 6],
    ))
}

/// Lowest order Regge on triangles.
pub fn regge_triangle(max_order: usize) -> ElementIr {
    validated(raw_element(
        "regge_triangle",
        2,
        2,
        max_order,
        4,
        4,
        &[(DoubleCovariantPiola, 0, 0); 3],
    ))
}

/// Lowest order Hellan-Herrmann-Johnson on triangles.
pub fn hhj_triangle(max_order: usize) -> ElementIr {
    validated(raw_element(
        "hhj_triangle",
        2,
        2,
        max_order,
        4,
        4,
        &[(DoubleContravariantPiola, 0, 0); 3],
    ))
}

/// Raviart-Thomas velocity and piecewise constant pressure on triangles.
///
/// Components are `(u_0, u_1, p)` both in the reference and in the physical values.
pub fn mixed_rt_p0_triangle(max_order: usize) -> ElementIr {
    let mut dofs = vec![(ContravariantPiola, 0, 0); 3];
    dofs.push((Affine, 2, 2));
    validated(raw_element("mixed_rt_p0_triangle", 2, 2, max_order, 3, 3, &dofs))
}

/// Covariant and affine dofs interleaved, so that neither group is a contiguous range.
pub fn interleaved_nedelec_lagrange_triangle(max_order: usize) -> ElementIr {
    validated(raw_element(
        "interleaved_nedelec_lagrange_triangle",
        2,
        2,
        max_order,
        3,
        3,
        &[
            (CovariantPiola, 0, 0),
            (Affine, 2, 2),
            (CovariantPiola, 0, 0),
            (Affine, 2, 2),
            (CovariantPiola, 0, 0),
        ],
    ))
}

/// One dof of every mapping kind, in 2D, with components packed one after another.
pub fn all_mappings_triangle(max_order: usize) -> ElementIr {
    validated(raw_element(
        "all_mappings_triangle",
        2,
        2,
        max_order,
        13,
        13,
        &[
            (Affine, 0, 0),
            (ContravariantPiola, 1, 1),
            (CovariantPiola, 3, 3),
            (DoubleCovariantPiola, 5, 5),
            (DoubleContravariantPiola, 9, 9),
        ],
    ))
}

/// An element whose reference basis cannot be evaluated.
pub fn unavailable_element() -> ElementIr {
    let mut raw = raw_element("quadrature_element", 2, 2, 1, 1, 1, &[(Affine, 0, 0); 3]);
    raw.basis_evaluation = BasisEvaluation::Unavailable("Function not supported for quadrature elements.".to_string());
    validated(raw)
}

/// Every fixture that can be generated, each with the given maximum order.
pub fn all_elements(max_order: usize) -> Vec<ElementIr> {
    vec![
        lagrange_triangle(max_order),
        lagrange_interval_in_2d(max_order),
        raviart_thomas_triangle(max_order),
        raviart_thomas_triangle_in_3d(max_order),
        nedelec_tetrahedron(max_order),
        regge_triangle(max_order),
        hhj_triangle(max_order),
        mixed_rt_p0_triangle(max_order),
        interleaved_nedelec_lagrange_triangle(max_order),
        all_mappings_triangle(max_order),
    ]
}

/// A non-symmetric, non-diagonal Jacobian with a positive determinant.
pub fn skewed_jacobian(gdim: usize, tdim: usize) -> DMatrix<f64> {
    #[rustfmt::skip]
    let entries = [
        2.0, 0.5, 0.25,
        -0.75, 1.5, 0.5,
        0.3, -0.2, 1.25,
    ];
    DMatrix::from_fn(gdim, tdim, |i, j| entries[3 * i + j])
}

/// A symmetric Jacobian, so that the inverse Jacobian is symmetric too.
pub fn symmetric_jacobian(dim: usize) -> DMatrix<f64> {
    #[rustfmt::skip]
    let entries = [
        2.0, 0.5, 0.25,
        0.5, 1.5, -0.3,
        0.25, -0.3, 1.25,
    ];
    DMatrix::from_fn(dim, dim, |i, j| entries[3 * i + j])
}

pub fn skewed_geometry(gdim: usize, tdim: usize) -> PointGeometry {
    PointGeometry::from_jacobian(skewed_jacobian(gdim, tdim)).expect("Fixture Jacobian must be invertible")
}

pub fn identity_geometry(dim: usize) -> PointGeometry {
    PointGeometry::from_jacobian(DMatrix::identity(dim, dim)).expect("Identity is invertible")
}

/// Deterministic reference values in `[-1, 1)` for the layout
/// `[point][dof][reference derivative][reference component]`.
pub fn sample_reference_values(ir: &ElementIr, num_points: usize, order: usize) -> Vec<f64> {
    let len = num_points * ir.num_dofs() * ir.tdim().pow(order as u32) * ir.reference_value_size();
    (0..len)
        .map(|i| ((i * 7919 + 13) % 101) as f64 / 50.5 - 1.0)
        .collect()
}
