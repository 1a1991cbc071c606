use crate::{render, rendered_lines};
use fenris_codegen::ast::{Expr, Statement, Symbol};
use fenris_codegen::error::UnsupportedFeature;
use fenris_codegen::kernel::{
    transform_reference_basis_derivatives, transform_reference_basis_derivatives_par, GeneratedKernel,
};
use fenris_codegen::OdometerCombinations;
use util::fixtures::*;

fn generate(ir: &fenris_codegen::ir::ElementIr) -> Vec<Statement> {
    match transform_reference_basis_derivatives(ir, &OdometerCombinations).unwrap() {
        GeneratedKernel::Complete(statements) => statements,
        GeneratedKernel::Unsupported(feature) => panic!("Unexpected unsupported kernel: {feature}"),
    }
}

#[test]
fn kernel_is_guarded_by_maximum_order() {
    let statements = generate(&lagrange_triangle(2));
    assert_eq!(
        statements.first(),
        Some(&Statement::If {
            condition: Expr::from(Symbol::new("order")).greater(2usize),
            body: vec![Statement::Return(Expr::int(-1))],
        })
    );
    assert_eq!(statements.last(), Some(&Statement::Return(Expr::int(0))));
}

#[test]
fn lagrange_kernel_statements() {
    let lines = rendered_lines(&generate(&lagrange_triangle(1)));
    let expected_lines = [
        "if (order > 1)",
        "return -1;",
        "const int64_t num_derivatives = pow(2, order);",
        "// Precomputed combinations",
        "const int64_t combinations[1][2][1] = {0, 1};",
        "for (int64_t l = 0; l < num_points * 3 * num_derivatives; ++l)",
        "values[l] = 0.0;",
        "const int64_t reference_offsets[3] = {0, 0, 0};",
        "const int64_t physical_offsets[3] = {0, 0, 0};",
        "for (int64_t ip = 0; ip < num_points; ++ip)",
        "double transform[2][2];",
        "transform[r][s] = 1.0;",
        "for (int64_t k = 0; k < order; ++k)",
        "transform[r][s] *= K[(ip * 2 + combinations[order - 1][s][k]) * 2 + combinations[order - 1][r][k]];",
        "for (int64_t d = 0; d < 3; ++d)",
        "for (int64_t s = 0; s < num_derivatives; ++s)",
        "for (int64_t i = 0; i < 1; ++i)",
        "// Using affine transform to map values back to the physical element.",
        "const double mapped_value = reference_values[(ip * 3 + d) * num_derivatives + s + reference_offsets[d]];",
        "// Mapping derivatives back to the physical element",
        "for (int64_t r = 0; r < num_derivatives; ++r)",
        "values[(ip * 3 + d) * num_derivatives + r + physical_offsets[d] + i] += transform[r][s] * mapped_value;",
        "return 0;",
    ];
    // The expected lines appear in this order
    let mut remaining = lines.iter();
    for expected in expected_lines {
        assert!(
            remaining.any(|line| line == expected),
            "Missing or misplaced line `{expected}` in\n{}",
            lines.join("\n")
        );
    }
}

#[test]
fn zeroth_order_kernel_has_no_tables() {
    let rendered = render(&generate(&lagrange_triangle(0)));
    assert!(rendered.contains("if (order > 0)"));
    assert!(rendered.contains("double transform[1][1];"));
    assert!(rendered.contains("for (int64_t l = 0; l < num_points * 3; ++l)"));
    assert!(!rendered.contains("combinations"));
    assert!(!rendered.contains("num_derivatives"));
}

#[test]
fn piola_comments_are_capitalized() {
    let rendered = render(&generate(&all_mappings_triangle(1)));
    for label in [
        "affine",
        "contravariant Piola",
        "covariant Piola",
        "double covariant Piola",
        "double contravariant Piola",
    ] {
        let comment = format!("// Using {label} transform to map values back to the physical element.");
        assert!(rendered.contains(&comment), "Missing comment `{comment}`");
    }
}

#[test]
fn contravariant_kernel_scales_by_determinant() {
    let rendered = render(&generate(&raviart_thomas_triangle(1)));
    assert!(rendered.contains("const double mapped_value = 1.0 / detJ[ip] * ("));
    assert!(rendered.contains("for (int64_t i = 0; i < 2; ++i)"));
}

#[test]
fn manifold_kernel_uses_separate_derivative_counts() {
    let rendered = render(&generate(&raviart_thomas_triangle_in_3d(1)));
    assert!(rendered.contains("double transform[3][2];"));
    assert!(rendered.contains("for (int64_t s = 0; s < num_derivatives_t; ++s)"));
    assert!(rendered.contains("for (int64_t r = 0; r < num_derivatives_g; ++r)"));
    assert!(rendered.contains("for (int64_t i = 0; i < 3; ++i)"));
    assert!(rendered.contains("combinations_t[order - 1][s][k]"));
    assert!(rendered.contains("combinations_g[order - 1][r][k]"));
}

#[test]
fn scattered_dofs_are_read_through_tables() {
    let rendered = render(&generate(&interleaved_nedelec_lagrange_triangle(1)));
    assert!(rendered.contains("const int64_t affine_dofs[2] = {1, 3};"));
    assert!(rendered.contains("const int64_t covariant_piola_dofs[3] = {0, 2, 4};"));
    assert!(rendered.contains("reference_offsets[affine_dofs[d]]"));
    assert!(rendered.contains("physical_offsets[covariant_piola_dofs[d]]"));
}

#[test]
fn element_without_dofs_only_zero_fills() {
    let raw = raw_element("empty", 2, 2, 1, 1, 1, &[]);
    let ir = fenris_codegen::ir::ElementIr::try_from(raw).unwrap();
    let rendered = render(&generate(&ir));
    assert!(!rendered.contains("reference_offsets"));
    assert!(!rendered.contains("mapped_value"));
    assert!(rendered.contains("return 0;"));
}

#[test]
fn unavailable_basis_gives_stub() {
    let kernel = transform_reference_basis_derivatives(&unavailable_element(), &OdometerCombinations).unwrap();
    assert!(!kernel.is_complete());
    assert_eq!(
        kernel,
        GeneratedKernel::Unsupported(UnsupportedFeature {
            function: "transform_reference_basis_derivatives".to_string(),
            reason: "Function not supported for quadrature elements.".to_string(),
        })
    );
    insta::assert_snapshot!(render(&kernel.statements()).trim_end(), @r###"
    // transform_reference_basis_derivatives: Function not supported for quadrature elements.
    return -1;
    "###);
}

#[test]
fn generation_is_deterministic() {
    for ir in all_elements(2) {
        assert_eq!(render(&generate(&ir)), render(&generate(&ir)));
    }
}

#[test]
fn parallel_generation_matches_serial() {
    let mut elements = all_elements(1);
    elements.extend(all_elements(3));
    elements.push(unavailable_element());

    let parallel = transform_reference_basis_derivatives_par(&elements, &OdometerCombinations);
    let serial: Vec<_> = elements
        .iter()
        .map(|ir| transform_reference_basis_derivatives(ir, &OdometerCombinations))
        .collect();
    assert_eq!(parallel, serial);
}
