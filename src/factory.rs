//! Assembly of the complete generated source of an element.
//!
//! The source is produced by a single render step: an [`ElementFactory`] record holds one
//! value per placeholder of [`ELEMENT_FACTORY_TEMPLATE`] and is substituted into it.
use crate::ast::{Expr, Literal, ScalarType, Statement, Storage, Symbol};
use crate::combinations::CombinationTableProvider;
use crate::error::{ConfigurationError, TemplateError};
use crate::ir::ElementIr;
use crate::kernel::transform_reference_basis_derivatives;
use crate::render::CRenderer;
use crate::settings::CodegenSettings;
use std::collections::BTreeSet;

/// Source template of a generated element. Placeholders are `{name}`, literal braces are
/// written `{{` and `}}`.
pub const ELEMENT_FACTORY_TEMPLATE: &str = r#"class {factory_name}: public ufc::finite_element
{{
public:
    const char * signature() const final override
    {{
        return {signature};
    }}

    const char * family() const final override
    {{
        return {family};
    }}

    int degree() const final override
    {{
        return {degree};
    }}

    int topological_dimension() const final override
    {{
        return {topological_dimension};
    }}

    int geometric_dimension() const final override
    {{
        return {geometric_dimension};
    }}

    int space_dimension() const final override
    {{
        return {space_dimension};
    }}

    int value_size() const final override
    {{
        return {value_size};
    }}

    int reference_value_size() const final override
    {{
        return {reference_value_size};
    }}

    int transform_reference_basis_derivatives(double * values,
                                              int64_t order,
                                              int64_t num_points,
                                              const double * reference_values,
                                              const double * X,
                                              const double * J,
                                              const double * detJ,
                                              const double * K,
                                              int cell_orientation) const final override
    {{
{transform_reference_basis_derivatives}    }}

    void tabulate_reference_dof_coordinates(double * reference_dof_coordinates) const final override
    {{
{tabulate_reference_dof_coordinates}    }}
}};
"#;

/// The values substituted into [`ELEMENT_FACTORY_TEMPLATE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFactory {
    pub factory_name: String,
    pub signature: String,
    pub family: String,
    pub degree: usize,
    pub topological_dimension: usize,
    pub geometric_dimension: usize,
    pub space_dimension: usize,
    pub value_size: usize,
    pub reference_value_size: usize,
    /// Rendered function body.
    pub transform_reference_basis_derivatives: String,
    /// Rendered function body.
    pub tabulate_reference_dof_coordinates: String,
}

impl ElementFactory {
    /// Names of all fields of the record, each expected as a template placeholder.
    pub const FIELD_NAMES: [&'static str; 11] = [
        "factory_name",
        "signature",
        "family",
        "degree",
        "topological_dimension",
        "geometric_dimension",
        "space_dimension",
        "value_size",
        "reference_value_size",
        "transform_reference_basis_derivatives",
        "tabulate_reference_dof_coordinates",
    ];

    /// Generates all function bodies of the element and collects the record.
    pub fn from_element<P>(
        ir: &ElementIr,
        settings: &CodegenSettings,
        provider: &P,
    ) -> Result<Self, ConfigurationError>
    where
        P: CombinationTableProvider + ?Sized,
    {
        let renderer = CRenderer::new(settings);
        let body_level = 2;
        let transform = transform_reference_basis_derivatives(ir, provider)?;
        let metadata = ir.metadata();

        Ok(Self {
            factory_name: metadata.factory_name.clone(),
            signature: metadata.signature.clone(),
            family: metadata.family.clone(),
            degree: metadata.degree,
            topological_dimension: ir.tdim(),
            geometric_dimension: ir.gdim(),
            space_dimension: ir.num_dofs(),
            value_size: ir.physical_value_size(),
            reference_value_size: ir.reference_value_size(),
            transform_reference_basis_derivatives: renderer.render_statements(&transform.statements(), body_level),
            tabulate_reference_dof_coordinates: renderer
                .render_statements(&tabulate_reference_dof_coordinates(ir, settings), body_level),
        })
    }

    /// The rendered value of a field, `None` for names that are not fields.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "factory_name" => self.factory_name.clone(),
            "signature" => quoted(&self.signature),
            "family" => quoted(&self.family),
            "degree" => self.degree.to_string(),
            "topological_dimension" => self.topological_dimension.to_string(),
            "geometric_dimension" => self.geometric_dimension.to_string(),
            "space_dimension" => self.space_dimension.to_string(),
            "value_size" => self.value_size.to_string(),
            "reference_value_size" => self.reference_value_size.to_string(),
            "transform_reference_basis_derivatives" => self.transform_reference_basis_derivatives.clone(),
            "tabulate_reference_dof_coordinates" => self.tabulate_reference_dof_coordinates.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Renders the element source from [`ELEMENT_FACTORY_TEMPLATE`].
    pub fn render(&self) -> Result<String, TemplateError> {
        format_template(ELEMENT_FACTORY_TEMPLATE, |name| self.field(name))
    }
}

/// Body of `tabulate_reference_dof_coordinates`, or an error stub if the element has no
/// reference dof coordinates.
pub fn tabulate_reference_dof_coordinates(ir: &ElementIr, settings: &CodegenSettings) -> Vec<Statement> {
    let points = match &ir.metadata().reference_dof_coordinates {
        Some(points) => points,
        None => {
            return vec![Statement::Raise {
                message: "tabulate_reference_dof_coordinates is not defined for this element".to_string(),
                warning_only: settings.convert_exceptions_to_warnings,
            }]
        }
    };

    let dof_x = Symbol::new("dof_X");
    let values: Vec<_> = points.iter().flatten().map(|&x| Literal::Float(x)).collect();
    let count = values.len();
    vec![
        Statement::ArrayDecl {
            ty: ScalarType::Double,
            storage: Storage::StaticConst,
            symbol: dof_x.clone(),
            shape: vec![count],
            values: Some(values),
        },
        Statement::MemCopy {
            ty: ScalarType::Double,
            source: dof_x,
            destination: Symbol::new("reference_dof_coordinates"),
            count: Expr::from(count),
        },
    ]
}

/// The set of placeholder names in a template.
pub fn template_placeholders(template: &str) -> Result<BTreeSet<String>, TemplateError> {
    let mut names = BTreeSet::new();
    format_template(template, |name| {
        names.insert(name.to_string());
        Some(String::new())
    })?;
    Ok(names)
}

/// Substitutes every `{name}` in the template by `lookup(name)`.
pub fn format_template(template: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    let mut position = 0;
    while let Some(start) = rest.find(['{', '}']) {
        output.push_str(&rest[..start]);
        let tail = &rest[start..];
        if tail.starts_with("{{") {
            output.push('{');
            rest = &tail[2..];
            position += start + 2;
        } else if tail.starts_with("}}") {
            output.push('}');
            rest = &tail[2..];
            position += start + 2;
        } else if tail.starts_with('{') {
            let end = tail
                .find('}')
                .ok_or(TemplateError::UnterminatedPlaceholder { position: position + start })?;
            let name = &tail[1..end];
            let value = lookup(name).ok_or_else(|| TemplateError::UnknownField(name.to_string()))?;
            output.push_str(&value);
            rest = &tail[end + 1..];
            position += start + end + 1;
        } else {
            // A lone closing brace is kept as is
            output.push('}');
            rest = &tail[1..];
            position += start + 1;
        }
    }
    output.push_str(rest);
    Ok(output)
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
