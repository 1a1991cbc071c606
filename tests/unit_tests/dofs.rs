use fenris_codegen::ast::{Expr, Symbol};
use fenris_codegen::dofs::{group_dofs, DofIteration};
use fenris_codegen::ir::MappingKind;
use fenris_codegen::ir::MappingKind::*;
use proptest::prelude::*;
use util::fixtures::{interleaved_nedelec_lagrange_triangle, mixed_rt_p0_triangle, raw_element};

#[test]
fn groups_are_sorted_by_label() {
    let ir = util::fixtures::all_mappings_triangle(1);
    let labels: Vec<_> = group_dofs(ir.dofs())
        .iter()
        .map(|group| group.mapping().label())
        .collect();
    assert_eq!(
        labels,
        vec![
            "affine",
            "contravariant piola",
            "covariant piola",
            "double contravariant piola",
            "double covariant piola"
        ]
    );
}

#[test]
fn contiguous_groups_iterate_ranges() {
    let ir = mixed_rt_p0_triangle(1);
    let groups = group_dofs(ir.dofs());
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0].mapping(), Affine);
    assert_eq!(groups[0].iteration(), &DofIteration::Range { begin: 3, end: 4 });
    assert_eq!(groups[1].mapping(), ContravariantPiola);
    assert_eq!(groups[1].iteration(), &DofIteration::Range { begin: 0, end: 3 });
    assert!(groups.iter().all(|group| group.declarations().is_empty()));

    let d = Symbol::new("d");
    assert_eq!(groups[0].loop_bounds(), (Expr::int(3), Expr::int(4)));
    assert_eq!(groups[0].dof_index(&d), Expr::from(&d));
}

#[test]
fn scattered_groups_iterate_tables() {
    let ir = interleaved_nedelec_lagrange_triangle(1);
    let groups = group_dofs(ir.dofs());
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0].dofs(), &[1, 3]);
    assert_eq!(
        groups[0].iteration(),
        &DofIteration::Table {
            symbol: Symbol::new("affine_dofs")
        }
    );
    assert_eq!(groups[1].dofs(), &[0, 2, 4]);
    assert_eq!(groups[1].loop_bounds(), (Expr::int(0), Expr::int(3)));

    let d = Symbol::new("d");
    assert_eq!(groups[1].dof_index(&d), Symbol::new("covariant_piola_dofs").at([&d]));
    assert_eq!(
        crate::rendered_lines(&groups[1].declarations()),
        vec!["const int64_t covariant_piola_dofs[3] = {0, 2, 4};"]
    );
}

#[test]
fn element_without_dofs_has_no_groups() {
    let raw = raw_element("empty", 2, 2, 1, 1, 1, &[]);
    assert!(group_dofs(&raw.dofs).is_empty());
}

fn mapping_strategy() -> impl Strategy<Value = MappingKind> {
    prop::sample::select(MappingKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn groups_partition_dofs(mappings in prop::collection::vec(mapping_strategy(), 0..12)) {
        let dofs: Vec<_> = mappings.iter().map(|&mapping| (mapping, 0, 0)).collect();
        // Sizes large enough for every mapping in 2D
        let raw = raw_element("arbitrary", 2, 2, 1, 4, 4, &dofs);

        let groups = group_dofs(&raw.dofs);
        let mut seen: Vec<usize> = groups.iter().flat_map(|group| group.dofs().to_vec()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..mappings.len()).collect::<Vec<_>>());

        for group in &groups {
            prop_assert!(group.dofs().iter().all(|&dof| mappings[dof] == group.mapping()));
            prop_assert!(group.dofs().windows(2).all(|pair| pair[0] < pair[1]));
            let contiguous = group.dofs().windows(2).all(|pair| pair[1] == pair[0] + 1);
            prop_assert_eq!(contiguous, matches!(group.iteration(), DofIteration::Range { .. }));
        }

        // Grouping is a pure function of the dofs
        prop_assert_eq!(group_dofs(&raw.dofs), groups);
    }
}
