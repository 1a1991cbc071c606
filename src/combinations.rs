//! Tables of derivative direction combinations.
//!
//! A derivative of order `n` in `dim` dimensions is identified by the ordered sequence of the
//! `n` coordinate directions that are differentiated, so there are `dim^n` of them. Derivative
//! `s` differentiates along the base-`dim` digits of `s`, most significant digit first.
use crate::ast::{Expr, Literal, ScalarType, Statement, Storage, Symbol};
use itertools::Itertools;

/// The direction lookup for one dimension, as usable from generated code.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationTable {
    declarations: Vec<Statement>,
    symbol: Symbol,
    order: Expr,
}

impl CombinationTable {
    pub fn new(declarations: Vec<Statement>, symbol: Symbol, order: Expr) -> Self {
        Self {
            declarations,
            symbol,
            order,
        }
    }

    /// Statements that must precede any use of [`Self::direction`].
    pub fn declarations(&self) -> &[Statement] {
        &self.declarations
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// The coordinate direction differentiated in step `step` of derivative `derivative`.
    pub fn direction(&self, derivative: impl Into<Expr>, step: impl Into<Expr>) -> Expr {
        self.symbol
            .at([self.order.clone() - 1usize, derivative.into(), step.into()])
    }
}

/// Supplies combination tables to the kernel generators.
pub trait CombinationTableProvider {
    /// Generates the table for derivatives in `dim` dimensions, of any order up to
    /// `max_order`, selecting the table for the (run-time) `order`.
    ///
    /// Identical arguments must produce identical tables. The `label` distinguishes
    /// tables of different dimensions within the same kernel.
    fn generate(
        &self,
        dim: usize,
        max_order: usize,
        order: &Expr,
        num_derivatives: &Expr,
        label: &str,
    ) -> CombinationTable;
}

/// Precomputes the combinations of every order into one constant table.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct OdometerCombinations;

impl CombinationTableProvider for OdometerCombinations {
    fn generate(
        &self,
        dim: usize,
        max_order: usize,
        order: &Expr,
        _num_derivatives: &Expr,
        label: &str,
    ) -> CombinationTable {
        let symbol = Symbol::new(format!("combinations{label}"));
        let max_num_derivatives = dim.pow(max_order as u32);

        let mut values = Vec::with_capacity(max_order * max_num_derivatives * max_order);
        for q in 1..=max_order {
            let combinations = derivative_combinations(dim, q);
            for row in 0..max_num_derivatives {
                let combination = &combinations[row % combinations.len()];
                values.extend(
                    (0..max_order).map(|col| Literal::Int(combination.get(col).copied().unwrap_or(0) as i64)),
                );
            }
        }

        let declarations = vec![
            Statement::comment("Precomputed combinations"),
            Statement::ArrayDecl {
                ty: ScalarType::Index,
                storage: Storage::Const,
                symbol: symbol.clone(),
                shape: vec![max_order, max_num_derivatives, max_order],
                values: Some(values),
            },
        ];
        CombinationTable::new(declarations, symbol, order.clone())
    }
}

/// All derivative direction sequences of the given order, in derivative index order.
///
/// Order zero has the single, empty combination.
pub fn derivative_combinations(dim: usize, order: usize) -> Vec<Vec<usize>> {
    if order == 0 {
        return vec![Vec::new()];
    }
    (0..order)
        .map(|_| 0..dim)
        .multi_cartesian_product()
        .collect()
}
