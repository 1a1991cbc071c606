//! The chain-rule matrix mapping reference derivatives to physical derivatives.
//!
//! A physical derivative of order $n$ along directions $(p_0, \dots, p_{n-1})$ decomposes into
//! reference derivatives along $(q_0, \dots, q_{n-1})$ with coefficient
//! $\prod_k K_{q_k p_k}$, where $K = \partial X / \partial x$ is the inverse Jacobian.
//! Hence `transform[r][s]` is the product of `K[ref(s, k)][phys(r, k)]` over all steps `k`,
//! and for order 0 the matrix is the trivial `[[1]]`.
use crate::ast::{for_ranges, Expr, FlattenedArray, ScalarType, Statement, Storage, Symbol};
use crate::combinations::{CombinationTable, CombinationTableProvider};

/// Builds the derivative transform of an element for a run-time derivative order.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeTransform {
    symbol: Symbol,
    max_shape: (usize, usize),
    order: Expr,
    num_reference_derivatives: Expr,
    num_physical_derivatives: Expr,
    count_declarations: Vec<Statement>,
    tables: Option<(CombinationTable, Option<CombinationTable>)>,
}

impl DerivativeTransform {
    /// Sets up derivative counts and combination tables for derivatives up to `max_order`.
    ///
    /// When `tdim == gdim` a single combination table serves both reference and physical
    /// directions, otherwise one table per dimension is requested, labelled `_t` and `_g`.
    /// With `max_order == 0` no tables are needed and both derivative counts are `1`.
    pub fn new<P>(tdim: usize, gdim: usize, max_order: usize, order: &Expr, provider: &P) -> Self
    where
        P: CombinationTableProvider + ?Sized,
    {
        let max_shape = (gdim.pow(max_order as u32), tdim.pow(max_order as u32));
        let pow = |dim: usize| Expr::call("pow", vec![Expr::from(dim), order.clone()]);
        let count_decl = |symbol: &Symbol, dim: usize| Statement::VariableDecl {
            ty: ScalarType::Index,
            storage: Storage::Const,
            symbol: symbol.clone(),
            value: pow(dim),
        };

        let (num_reference_derivatives, num_physical_derivatives, count_declarations, tables) = if max_order == 0 {
            (Expr::int(1), Expr::int(1), Vec::new(), None)
        } else if tdim == gdim {
            let num_derivatives = Symbol::new("num_derivatives");
            let n = Expr::from(&num_derivatives);
            let table = provider.generate(tdim, max_order, order, &n, "");
            (n.clone(), n, vec![count_decl(&num_derivatives, tdim)], Some((table, None)))
        } else {
            let num_derivatives_t = Symbol::new("num_derivatives_t");
            let num_derivatives_g = Symbol::new("num_derivatives_g");
            let n_t = Expr::from(&num_derivatives_t);
            let n_g = Expr::from(&num_derivatives_g);
            let table_t = provider.generate(tdim, max_order, order, &n_t, "_t");
            let table_g = provider.generate(gdim, max_order, order, &n_g, "_g");
            let declarations = vec![
                count_decl(&num_derivatives_t, tdim),
                count_decl(&num_derivatives_g, gdim),
            ];
            (n_t, n_g, declarations, Some((table_t, Some(table_g))))
        };

        Self {
            symbol: Symbol::new("transform"),
            max_shape,
            order: order.clone(),
            num_reference_derivatives,
            num_physical_derivatives,
            count_declarations,
            tables,
        }
    }

    /// Number of reference derivatives, `tdim^order`.
    pub fn num_reference_derivatives(&self) -> &Expr {
        &self.num_reference_derivatives
    }

    /// Number of physical derivatives, `gdim^order`.
    pub fn num_physical_derivatives(&self) -> &Expr {
        &self.num_physical_derivatives
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Derivative counts and combination tables, independent of the point.
    pub fn declarations(&self) -> Vec<Statement> {
        let mut declarations = self.count_declarations.clone();
        if let Some((reference, physical)) = &self.tables {
            declarations.extend_from_slice(reference.declarations());
            if let Some(physical) = physical {
                declarations.extend_from_slice(physical.declarations());
            }
        }
        declarations
    }

    /// Statements computing the transform matrix at `point`, reading the flattened inverse
    /// Jacobians `K[point][tdim][gdim]`.
    pub fn build(&self, inverse: &FlattenedArray, point: &Expr) -> Vec<Statement> {
        let r = Symbol::new("r");
        let s = Symbol::new("s");
        let k = Symbol::new("k");

        let mut statements = vec![Statement::ArrayDecl {
            ty: ScalarType::Double,
            storage: Storage::Mutable,
            symbol: self.symbol.clone(),
            shape: vec![self.max_shape.0, self.max_shape.1],
            values: None,
        }];
        statements.extend(for_ranges(
            vec![
                (r.clone(), Expr::int(0), self.num_physical_derivatives.clone()),
                (s.clone(), Expr::int(0), self.num_reference_derivatives.clone()),
            ],
            vec![Statement::assign(self.entry(&r, &s), 1.0)],
        ));

        if let Some((reference, physical)) = &self.tables {
            let physical = physical.as_ref().unwrap_or(reference);
            let factor = inverse.at(vec![
                point.clone(),
                reference.direction(&s, &k),
                physical.direction(&r, &k),
            ]);
            statements.extend(for_ranges(
                vec![
                    (r.clone(), Expr::int(0), self.num_physical_derivatives.clone()),
                    (s.clone(), Expr::int(0), self.num_reference_derivatives.clone()),
                    (k.clone(), Expr::int(0), self.order.clone()),
                ],
                vec![Statement::assign_mul(self.entry(&r, &s), factor)],
            ));
        }
        statements
    }

    /// The entry `transform[r][s]`.
    pub fn entry(&self, r: impl Into<Expr>, s: impl Into<Expr>) -> Expr {
        self.symbol.at([r.into(), s.into()])
    }
}
