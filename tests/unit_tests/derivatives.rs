use fenris_codegen::ast::{Expr, FlattenedArray, Statement, Symbol};
use fenris_codegen::derivatives::DerivativeTransform;
use fenris_codegen::geometry::{GeometryBundle, PointGeometry};
use fenris_codegen::interpret::{Interpreter, Value};
use fenris_codegen::OdometerCombinations;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::DMatrix;
use util::fixtures::{skewed_geometry, symmetric_jacobian};
use util::reference;

fn order_symbol() -> Expr {
    Expr::from(Symbol::new("order"))
}

/// Executes the transform construction for a single point and returns the
/// `gdim^order x tdim^order` block of the transform matrix.
fn evaluate_transform(geometry: &PointGeometry, max_order: usize, order: usize) -> DMatrix<f64> {
    let tdim = geometry.tdim();
    let gdim = geometry.gdim();
    let transform = DerivativeTransform::new(tdim, gdim, max_order, &order_symbol(), &OdometerCombinations);
    let inverse = FlattenedArray::new(
        Symbol::new("K"),
        vec![Expr::int(1), Expr::from(tdim), Expr::from(gdim)],
    );
    let statements: Vec<Statement> = [transform.declarations(), transform.build(&inverse, &Expr::int(0))].concat();

    let bundle = GeometryBundle::uniform(geometry.clone(), 1);
    let mut interpreter = Interpreter::new();
    interpreter.bind_scalar("order", Value::Int(order as i64));
    interpreter.bind_array("K", &bundle.flat_inverses());
    interpreter
        .execute(&statements)
        .expect("Transform construction must execute");

    let max_cols = tdim.pow(max_order as u32);
    let flat = interpreter.array("transform").expect("Transform must be declared");
    DMatrix::from_fn(gdim.pow(order as u32), tdim.pow(order as u32), |r, s| flat[r * max_cols + s])
}

#[test]
fn counts_are_literal_one_without_derivatives() {
    let transform = DerivativeTransform::new(2, 3, 0, &order_symbol(), &OdometerCombinations);
    assert_eq!(transform.num_reference_derivatives(), &Expr::int(1));
    assert_eq!(transform.num_physical_derivatives(), &Expr::int(1));
    assert!(transform.declarations().is_empty());
}

#[test]
fn volumetric_transform_shares_one_table() {
    let transform = DerivativeTransform::new(3, 3, 2, &order_symbol(), &OdometerCombinations);
    assert_eq!(transform.num_reference_derivatives(), &Expr::from(Symbol::new("num_derivatives")));
    assert_eq!(transform.num_reference_derivatives(), transform.num_physical_derivatives());

    let rendered = crate::render(&transform.declarations());
    assert!(rendered.contains("const int64_t num_derivatives = pow(3, order);"));
    assert!(rendered.contains("const int64_t combinations[2][9][2] = {"));
    assert!(!rendered.contains("combinations_t"));
}

#[test]
fn manifold_transform_uses_separate_tables() {
    let transform = DerivativeTransform::new(2, 3, 1, &order_symbol(), &OdometerCombinations);
    let rendered = crate::render(&transform.declarations());
    assert!(rendered.contains("const int64_t num_derivatives_t = pow(2, order);"));
    assert!(rendered.contains("const int64_t num_derivatives_g = pow(3, order);"));
    assert!(rendered.contains("const int64_t combinations_t[1][2][1] = {0, 1};"));
    assert!(rendered.contains("const int64_t combinations_g[1][3][1] = {0, 1, 2};"));
}

#[test]
fn order_zero_transform_is_trivial() {
    for (gdim, tdim) in [(1, 1), (2, 2), (3, 3), (2, 1), (3, 2)] {
        let geometry = skewed_geometry(gdim, tdim);
        for max_order in 0..=2 {
            let transform = evaluate_transform(&geometry, max_order, 0);
            assert_eq!(transform, DMatrix::from_element(1, 1, 1.0));
        }
    }
}

#[test]
fn first_order_transform_of_symmetric_inverse_equals_inverse() {
    for dim in 1..=3 {
        let geometry = PointGeometry::from_jacobian(symmetric_jacobian(dim)).unwrap();
        let transform = evaluate_transform(&geometry, 1, 1);
        assert_matrix_eq!(transform, geometry.inverse().clone(), comp = abs, tol = 1e-14);
    }
}

#[test]
fn first_order_transform_is_transposed_inverse() {
    // transform[r][s] = dX_s / dx_r = K[s][r]
    for (gdim, tdim) in [(2, 2), (3, 3), (3, 2), (2, 1)] {
        let geometry = skewed_geometry(gdim, tdim);
        let transform = evaluate_transform(&geometry, 2, 1);
        assert_eq!(transform, geometry.inverse().transpose());
    }
}

#[test]
fn higher_order_transform_matches_chain_rule() {
    for (gdim, tdim) in [(2, 2), (3, 3), (3, 2)] {
        let geometry = skewed_geometry(gdim, tdim);
        for order in 0..=3 {
            let transform = evaluate_transform(&geometry, 3, order);
            let expected = reference::derivative_transform(&geometry, order);
            assert_eq!(transform.shape(), expected.shape());
            for (a, b) in transform.iter().zip(expected.iter()) {
                assert_scalar_eq!(*a, *b, comp = abs, tol = 1e-14);
            }
        }
    }
}
