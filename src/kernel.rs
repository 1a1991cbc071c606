//! Generation of the kernel transforming reference basis derivatives to physical ones.
//!
//! The generated code is the body of
//!
//! ```text
//! int transform_reference_basis_derivatives(
//!     double* values, int64_t order, int64_t num_points,
//!     const double* reference_values, const double* X, const double* J,
//!     const double* detJ, const double* K, int cell_orientation)
//! ```
//!
//! with the array layouts
//!
//! - `values[num_points][num_dofs][gdim^order][physical_value_size]` (output),
//! - `reference_values[num_points][num_dofs][tdim^order][reference_value_size]`,
//! - `J[num_points][gdim][tdim]`, `detJ[num_points]`, `K[num_points][tdim][gdim]`.
//!
//! The kernel returns `0` on success and `-1` without touching `values` if `order` exceeds
//! the maximum order of the element.
use crate::ast::{for_ranges, zero_fill, Expr, FlattenedArray, ScalarType, Statement, Storage, Symbol};
use crate::combinations::CombinationTableProvider;
use crate::derivatives::DerivativeTransform;
use crate::dofs::group_dofs;
use crate::error::{ConfigurationError, UnsupportedFeature};
use crate::ir::{BasisEvaluation, ElementIr};
use crate::mapping::{select_mapping_kernel, PointGeometryAccess};
use log::{debug, warn};
use rayon::prelude::*;

pub const TRANSFORM_FUNCTION: &str = "transform_reference_basis_derivatives";

/// Names of the kernel arguments.
pub mod arguments {
    pub const VALUES: &str = "values";
    pub const ORDER: &str = "order";
    pub const NUM_POINTS: &str = "num_points";
    pub const REFERENCE_VALUES: &str = "reference_values";
    pub const JACOBIAN: &str = "J";
    pub const DET_JACOBIAN: &str = "detJ";
    pub const INVERSE_JACOBIAN: &str = "K";
}

/// The outcome of generating a kernel for an element.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedKernel {
    Complete(Vec<Statement>),
    /// The kernel cannot be generated for the element. Renders as a stub returning `-1`.
    Unsupported(UnsupportedFeature),
}

impl GeneratedKernel {
    pub fn is_complete(&self) -> bool {
        matches!(self, GeneratedKernel::Complete(_))
    }

    /// The statements of the kernel body, or of the stub.
    pub fn statements(&self) -> Vec<Statement> {
        match self {
            GeneratedKernel::Complete(statements) => statements.clone(),
            GeneratedKernel::Unsupported(feature) => unsupported_stub(feature),
        }
    }
}

/// The documented no-op body of a function that is not available.
pub fn unsupported_stub(feature: &UnsupportedFeature) -> Vec<Statement> {
    vec![Statement::comment(feature.to_string()), Statement::Return(Expr::int(-1))]
}

/// Generates the body of `transform_reference_basis_derivatives` for the element.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the dofs of the element cannot be mapped. This cannot
/// happen for an IR that passed validation, and no statements are returned in that case.
pub fn transform_reference_basis_derivatives<P>(
    ir: &ElementIr,
    provider: &P,
) -> Result<GeneratedKernel, ConfigurationError>
where
    P: CombinationTableProvider + ?Sized,
{
    if let BasisEvaluation::Unavailable(reason) = ir.basis_evaluation() {
        warn!(
            "Reference basis evaluation not available for element {:?}, emitting stub.",
            ir.metadata().factory_name
        );
        return Ok(GeneratedKernel::Unsupported(UnsupportedFeature {
            function: TRANSFORM_FUNCTION.to_string(),
            reason: reason.clone(),
        }));
    }

    let tdim = ir.tdim();
    let gdim = ir.gdim();
    let num_dofs = ir.num_dofs();

    let values_symbol = Symbol::new(arguments::VALUES);
    let order = Expr::from(Symbol::new(arguments::ORDER));
    let num_points = Expr::from(Symbol::new(arguments::NUM_POINTS));

    // Loop variables: point, dof, reference derivative, physical component
    let ip = Symbol::new("ip");
    let d = Symbol::new("d");
    let s = Symbol::new("s");
    let i = Symbol::new("i");
    let r = Symbol::new("r");
    let point = Expr::from(&ip);

    let transform = DerivativeTransform::new(tdim, gdim, ir.max_order(), &order, provider);
    let num_derivatives_t = transform.num_reference_derivatives().clone();
    let num_derivatives_g = transform.num_physical_derivatives().clone();

    let jacobian = FlattenedArray::new(
        Symbol::new(arguments::JACOBIAN),
        vec![num_points.clone(), gdim.into(), tdim.into()],
    );
    let det = FlattenedArray::new(Symbol::new(arguments::DET_JACOBIAN), vec![num_points.clone()]);
    let inverse = FlattenedArray::new(
        Symbol::new(arguments::INVERSE_JACOBIAN),
        vec![num_points.clone(), tdim.into(), gdim.into()],
    );
    let values = FlattenedArray::new(
        values_symbol.clone(),
        vec![
            num_points.clone(),
            num_dofs.into(),
            num_derivatives_g.clone(),
            ir.physical_value_size().into(),
        ],
    );
    let reference_values = FlattenedArray::new(
        Symbol::new(arguments::REFERENCE_VALUES),
        vec![
            num_points.clone(),
            num_dofs.into(),
            num_derivatives_t.clone(),
            ir.reference_value_size().into(),
        ],
    );

    let guard = vec![Statement::If {
        condition: order.clone().greater(ir.max_order()),
        body: vec![Statement::Return(Expr::int(-1))],
    }];
    let values_init = vec![zero_fill(&values_symbol, values.len(), Symbol::new("l"))];

    let reference_offsets = Symbol::new("reference_offsets");
    let physical_offsets = Symbol::new("physical_offsets");
    let groups = group_dofs(ir.dofs());
    let mut dof_attributes = Vec::new();
    if num_dofs > 0 {
        let offsets: Vec<_> = ir.dofs().iter().map(|dof| dof.reference_offset).collect();
        dof_attributes.push(Statement::index_table(reference_offsets.clone(), &offsets));
        let offsets: Vec<_> = ir.dofs().iter().map(|dof| dof.physical_offset).collect();
        dof_attributes.push(Statement::index_table(physical_offsets.clone(), &offsets));
    }
    dof_attributes.extend(groups.iter().flat_map(|group| group.declarations()));

    let geometry = PointGeometryAccess {
        jacobian: &jacobian,
        det: &det,
        inverse: &inverse,
        point: &point,
    };
    let mapped_value = Symbol::new("mapped_value");
    let mut transform_apply = Vec::new();
    for group in &groups {
        let mapping = group.mapping();
        let idof = group.dof_index(&d);
        let reference_offset = reference_offsets.at([idof.clone()]);
        let physical_offset = physical_offsets.at([idof.clone()]);

        let kernel = select_mapping_kernel(
            mapping,
            &Expr::from(&i),
            mapping.num_reference_components(tdim),
            tdim,
            gdim,
            &geometry,
        )?;
        debug!(
            "Mapping dofs {:?} with {} transform ({} physical components).",
            group.dofs(),
            mapping,
            kernel.num_physical_components
        );

        let mapped = kernel.apply(|j| {
            reference_values.at(vec![
                point.clone(),
                idof.clone(),
                Expr::from(&s),
                reference_offset.clone() + j,
            ])
        });
        let apply_derivatives = for_ranges(
            vec![(r.clone(), Expr::int(0), num_derivatives_g.clone())],
            vec![Statement::assign_add(
                values.at(vec![
                    point.clone(),
                    idof.clone(),
                    Expr::from(&r),
                    physical_offset.clone() + Expr::from(&i),
                ]),
                transform.entry(&r, &s) * Expr::from(&mapped_value),
            )],
        );

        let (begin, end) = group.loop_bounds();
        let mut body = vec![
            Statement::comment(format!(
                "Using {} transform to map values back to the physical element.",
                mapping.label().replace("piola", "Piola")
            )),
            Statement::VariableDecl {
                ty: ScalarType::Double,
                storage: Storage::Const,
                symbol: mapped_value.clone(),
                value: mapped,
            },
            Statement::comment("Mapping derivatives back to the physical element"),
        ];
        body.extend(apply_derivatives);
        transform_apply.extend(for_ranges(
            vec![
                (d.clone(), begin, end),
                (s.clone(), Expr::int(0), num_derivatives_t.clone()),
                (i.clone(), Expr::int(0), Expr::from(kernel.num_physical_components)),
            ],
            body,
        ));
    }

    let mut point_body = transform.build(&inverse, &point);
    point_body.extend(transform_apply);
    let point_loop = for_ranges(vec![(ip, Expr::int(0), num_points)], point_body);

    debug!(
        "Generated {TRANSFORM_FUNCTION} for element {:?} ({} dofs in {} mapping groups).",
        ir.metadata().factory_name,
        num_dofs,
        groups.len()
    );

    let statements = [
        guard,
        transform.declarations(),
        values_init,
        dof_attributes,
        point_loop,
        vec![Statement::Return(Expr::int(0))],
    ]
    .concat();
    Ok(GeneratedKernel::Complete(statements))
}

/// Generates the transformation kernels of many elements in parallel.
///
/// The results are in the order of `elements` and identical to those of serial generation.
pub fn transform_reference_basis_derivatives_par<P>(
    elements: &[ElementIr],
    provider: &P,
) -> Vec<Result<GeneratedKernel, ConfigurationError>>
where
    P: CombinationTableProvider + Sync + ?Sized,
{
    elements
        .par_iter()
        .map(|ir| transform_reference_basis_derivatives(ir, provider))
        .collect()
}
