//! Partitioning of dofs by mapping kind.
use crate::ast::{Expr, Statement, Symbol};
use crate::ir::{DofDescriptor, MappingKind};
use std::collections::BTreeMap;

/// How generated code iterates over the dofs of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DofIteration {
    /// The dofs are exactly `begin .. end`.
    Range { begin: usize, end: usize },
    /// The dofs are stored in a constant index table.
    Table { symbol: Symbol },
}

/// All dofs sharing one mapping kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofGroup {
    mapping: MappingKind,
    dofs: Vec<usize>,
    iteration: DofIteration,
}

impl DofGroup {
    pub fn mapping(&self) -> MappingKind {
        self.mapping
    }

    /// Dof indices in ascending order.
    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    pub fn iteration(&self) -> &DofIteration {
        &self.iteration
    }

    /// Declarations required before iterating the group, i.e. the index table if any.
    pub fn declarations(&self) -> Vec<Statement> {
        match &self.iteration {
            DofIteration::Range { .. } => Vec::new(),
            DofIteration::Table { symbol } => vec![Statement::index_table(symbol.clone(), &self.dofs)],
        }
    }

    /// Loop bounds for the loop variable `d`.
    pub fn loop_bounds(&self) -> (Expr, Expr) {
        match &self.iteration {
            DofIteration::Range { begin, end } => (Expr::from(*begin), Expr::from(*end)),
            DofIteration::Table { .. } => (Expr::int(0), Expr::from(self.dofs.len())),
        }
    }

    /// The dof index corresponding to loop variable `d`.
    pub fn dof_index(&self, d: &Symbol) -> Expr {
        match &self.iteration {
            DofIteration::Range { .. } => Expr::from(d),
            DofIteration::Table { symbol } => symbol.at([d]),
        }
    }
}

/// Partitions the dofs by mapping kind.
///
/// Groups are ordered by mapping label so that the same dofs always produce the same groups,
/// in the same order. A group whose dofs form a contiguous ascending run iterates a range,
/// any other group iterates a table named after its mapping (`"covariant piola"` gives
/// `covariant_piola_dofs`).
pub fn group_dofs(dofs: &[DofDescriptor]) -> Vec<DofGroup> {
    let mut by_label: BTreeMap<&'static str, (MappingKind, Vec<usize>)> = BTreeMap::new();
    for (index, dof) in dofs.iter().enumerate() {
        by_label
            .entry(dof.mapping.label())
            .or_insert_with(|| (dof.mapping, Vec::new()))
            .1
            .push(index);
    }

    by_label
        .into_iter()
        .map(|(label, (mapping, dofs))| {
            let iteration = if is_contiguous(&dofs) {
                DofIteration::Range {
                    begin: dofs[0],
                    end: dofs[dofs.len() - 1] + 1,
                }
            } else {
                DofIteration::Table {
                    symbol: Symbol::new(format!("{}_dofs", label.replace(' ', "_"))),
                }
            };
            DofGroup {
                mapping,
                dofs,
                iteration,
            }
        })
        .collect()
}

fn is_contiguous(indices: &[usize]) -> bool {
    indices.windows(2).all(|pair| pair[1] == pair[0] + 1)
}
