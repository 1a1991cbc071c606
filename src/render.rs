//! Rendering of statement trees as C/C++ source text.
use crate::ast::{AssignOp, BinaryOp, Expr, Literal, ScalarType, Statement, Storage};
use crate::settings::CodegenSettings;
use itertools::Itertools;
use std::fmt;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Renders statements with the conventions given by a [`CodegenSettings`].
///
/// Rendering is a pure function of the tree and the settings.
#[derive(Debug, Clone, Copy)]
pub struct CRenderer<'a> {
    settings: &'a CodegenSettings,
}

impl<'a> CRenderer<'a> {
    pub fn new(settings: &'a CodegenSettings) -> Self {
        Self { settings }
    }

    /// Renders the statements, one per line, indented by `level` levels.
    pub fn render_statements(&self, statements: &[Statement], level: usize) -> String {
        let mut output = String::new();
        for statement in statements {
            self.render_statement(&mut output, statement, level)
                .expect("Writing to a String cannot fail");
        }
        output
    }

    fn render_statement(&self, out: &mut String, statement: &Statement, level: usize) -> fmt::Result {
        let indent = INDENT.repeat(level);
        match statement {
            Statement::Comment(text) => writeln!(out, "{indent}// {text}"),
            Statement::VariableDecl {
                ty,
                storage,
                symbol,
                value,
            } => writeln!(
                out,
                "{indent}{}{} {symbol} = {};",
                storage_prefix(*storage),
                self.type_name(*ty),
                self.render_expr(value)
            ),
            Statement::ArrayDecl {
                ty,
                storage,
                symbol,
                shape,
                values,
            } => {
                let dims: String = shape.iter().map(|n| format!("[{n}]")).collect();
                let prefix = format!("{indent}{}{} {symbol}{dims}", storage_prefix(*storage), self.type_name(*ty));
                match values {
                    Some(values) => {
                        let values = values.iter().map(|v| self.render_literal(*v)).join(", ");
                        writeln!(out, "{prefix} = {{{values}}};")
                    }
                    None => writeln!(out, "{prefix};"),
                }
            }
            Statement::Assign { op, target, value } => {
                let op = match op {
                    AssignOp::Set => "=",
                    AssignOp::Add => "+=",
                    AssignOp::Mul => "*=",
                };
                writeln!(out, "{indent}{} {op} {};", self.render_expr(target), self.render_expr(value))
            }
            Statement::ForRange { index, begin, end, body } => {
                writeln!(
                    out,
                    "{indent}for ({} {index} = {}; {index} < {}; ++{index})",
                    self.settings.index_type,
                    self.render_expr(begin),
                    self.render_expr(end)
                )?;
                self.render_block(out, body, level)
            }
            Statement::If { condition, body } => {
                writeln!(out, "{indent}if ({})", self.render_expr(condition))?;
                self.render_block(out, body, level)
            }
            Statement::Return(value) => writeln!(out, "{indent}return {};", self.render_expr(value)),
            Statement::MemCopy {
                source,
                destination,
                count,
                ..
            } => writeln!(
                out,
                "{indent}std::copy_n({source}, {}, {destination});",
                self.render_expr(count)
            ),
            Statement::Raise { message, warning_only } => {
                let message = escape(message);
                if *warning_only {
                    writeln!(out, "{indent}std::cerr << \"*** warning: {message}\" << std::endl;")
                } else {
                    writeln!(out, "{indent}throw std::runtime_error(\"{message}\");")
                }
            }
        }
    }

    fn render_block(&self, out: &mut String, body: &[Statement], level: usize) -> fmt::Result {
        let indent = INDENT.repeat(level);
        writeln!(out, "{indent}{{")?;
        for statement in body {
            self.render_statement(out, statement, level + 1)?;
        }
        writeln!(out, "{indent}}}")
    }

    pub fn render_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => self.render_literal(*literal),
            Expr::Symbol(symbol) => symbol.to_string(),
            Expr::Subscript { array, indices } => {
                let indices: String = indices
                    .iter()
                    .map(|index| format!("[{}]", self.render_expr(index)))
                    .collect();
                format!("{array}{indices}")
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs_text = self.render_operand(lhs, |p, _| p < op.precedence());
                let rhs_text = self.render_operand(rhs, |p, rhs_op| {
                    let associative = rhs_op == *op && matches!(op, BinaryOp::Add | BinaryOp::Mul);
                    p < op.precedence() || (p == op.precedence() && !associative)
                });
                format!("{lhs_text} {} {rhs_text}", op.symbol())
            }
            Expr::Call { function, args } => {
                format!("{function}({})", args.iter().map(|arg| self.render_expr(arg)).join(", "))
            }
        }
    }

    fn render_operand(&self, operand: &Expr, needs_parens: impl Fn(u8, BinaryOp) -> bool) -> String {
        let text = self.render_expr(operand);
        match operand {
            Expr::Binary { op, .. } if needs_parens(op.precedence(), *op) => format!("({text})"),
            _ => text,
        }
    }

    fn render_literal(&self, literal: Literal) -> String {
        match literal {
            Literal::Int(i) => i.to_string(),
            Literal::Float(x) => format_float(x, self.settings.float_precision),
        }
    }

    fn type_name(&self, ty: ScalarType) -> &str {
        match ty {
            ScalarType::Double => "double",
            ScalarType::Index => &self.settings.index_type,
        }
    }
}

fn storage_prefix(storage: Storage) -> &'static str {
    match storage {
        Storage::Mutable => "",
        Storage::Const => "const ",
        Storage::StaticConst => "static const ",
    }
}

/// Shortest representation of `x` rounded to `precision` significant digits.
pub fn format_float(x: f64, precision: usize) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let rounded: f64 = format!("{:.*e}", precision.max(1) - 1, x)
        .parse()
        .unwrap_or(x);
    format!("{rounded:?}")
}

fn escape(message: &str) -> String {
    message.replace('\\', "\\\\").replace('"', "\\\"")
}
