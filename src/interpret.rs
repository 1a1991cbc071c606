//! In-memory execution of statement trees.
//!
//! The interpreter follows C semantics where they matter for generated kernels: integer
//! division truncates, integer and floating-point values are distinct, and declarations
//! convert values to the declared type. Unlike C, every array access is bounds-checked
//! and reading an unwritten local array entry yields NaN.
use crate::ast::{AssignOp, BinaryOp, Expr, Literal, ScalarType, Statement, Symbol};
use crate::geometry::GeometryBundle;
use crate::ir::ElementIr;
use crate::kernel::arguments;
use log::warn;
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int(i) => i as f64,
            Value::Float(x) => x,
        }
    }

    fn as_index(&self) -> Result<i64, ExecutionError> {
        match *self {
            Value::Int(i) => Ok(i),
            Value::Float(x) => Err(ExecutionError::NonIntegerIndex(x)),
        }
    }

    fn convert(self, ty: ScalarType) -> Value {
        match (ty, self) {
            (ScalarType::Double, value) => Value::Float(value.as_f64()),
            (ScalarType::Index, Value::Float(x)) => Value::Int(x as i64),
            (ScalarType::Index, value) => value,
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Float(x) => Value::Float(x),
            Literal::Int(i) => Value::Int(i),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    UnknownSymbol(String),
    NotAnArray(String),
    IndexOutOfBounds { array: String, index: i64, len: usize },
    WrongNumberOfIndices { array: String, expected: usize, actual: usize },
    NonIntegerIndex(f64),
    DivisionByZero,
    UnknownFunction(String),
    InvalidTarget,
    /// The executed code raised an error.
    Raised(String),
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(name) => write!(f, "Unknown symbol `{name}`."),
            Self::NotAnArray(name) => write!(f, "`{name}` is not an array."),
            Self::IndexOutOfBounds { array, index, len } => {
                write!(f, "Index {index} out of bounds for dimension of length {len} of `{array}`.")
            }
            Self::WrongNumberOfIndices { array, expected, actual } => {
                write!(f, "`{array}` has {expected} dimensions but was indexed with {actual} indices.")
            }
            Self::NonIntegerIndex(x) => write!(f, "Non-integer value {x} used as an index."),
            Self::DivisionByZero => write!(f, "Integer division by zero."),
            Self::UnknownFunction(name) => write!(f, "Unknown function `{name}`."),
            Self::InvalidTarget => write!(f, "Assignment target is neither a symbol nor an array entry."),
            Self::Raised(message) => write!(f, "Raised: {message}"),
        }
    }
}

impl Error for ExecutionError {}

#[derive(Debug, Clone)]
struct Array {
    ty: ScalarType,
    shape: Vec<usize>,
    data: Vec<Value>,
}

/// Executes statement trees over bound scalars and arrays.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    scalars: FxHashMap<String, Value>,
    arrays: FxHashMap<String, Array>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_scalar(&mut self, name: &str, value: Value) {
        self.scalars.insert(name.to_string(), value);
    }

    /// Binds a flat `double` array, as passed through a pointer argument.
    pub fn bind_array(&mut self, name: &str, data: &[f64]) {
        let array = Array {
            ty: ScalarType::Double,
            shape: vec![data.len()],
            data: data.iter().map(|&x| Value::Float(x)).collect(),
        };
        self.arrays.insert(name.to_string(), array);
    }

    pub fn scalar(&self, name: &str) -> Option<Value> {
        self.scalars.get(name).copied()
    }

    /// The flat contents of an array.
    pub fn array(&self, name: &str) -> Option<Vec<f64>> {
        self.arrays
            .get(name)
            .map(|array| array.data.iter().map(Value::as_f64).collect())
    }

    /// Executes the statements, returning the value of an executed `return`, if any.
    pub fn execute(&mut self, statements: &[Statement]) -> Result<Option<Value>, ExecutionError> {
        for statement in statements {
            if let Some(value) = self.execute_statement(statement)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<Option<Value>, ExecutionError> {
        match statement {
            Statement::Comment(_) => {}
            Statement::VariableDecl { ty, symbol, value, .. } => {
                let value = self.evaluate(value)?.convert(*ty);
                self.scalars.insert(symbol.name().to_string(), value);
            }
            Statement::ArrayDecl {
                ty,
                symbol,
                shape,
                values,
                ..
            } => {
                let len = shape.iter().product();
                let data = match values {
                    Some(values) => {
                        let mut data: Vec<_> = values.iter().map(|&v| Value::from(v).convert(*ty)).collect();
                        data.resize(len, Value::Int(0).convert(*ty));
                        data
                    }
                    None => vec![Value::Float(f64::NAN).convert(*ty); len],
                };
                let array = Array {
                    ty: *ty,
                    shape: shape.clone(),
                    data,
                };
                self.arrays.insert(symbol.name().to_string(), array);
            }
            Statement::Assign { op, target, value } => {
                let value = self.evaluate(value)?;
                self.assign(*op, target, value)?;
            }
            Statement::ForRange { index, begin, end, body } => {
                let begin = self.evaluate(begin)?.as_index()?;
                let end = self.evaluate(end)?.as_index()?;
                let shadowed = self.scalars.get(index.name()).copied();
                for i in begin..end {
                    self.bind_scalar(index.name(), Value::Int(i));
                    if let Some(value) = self.execute(body)? {
                        return Ok(Some(value));
                    }
                }
                match shadowed {
                    Some(value) => self.bind_scalar(index.name(), value),
                    None => {
                        self.scalars.remove(index.name());
                    }
                }
            }
            Statement::If { condition, body } => {
                if self.evaluate(condition)?.as_f64() != 0.0 {
                    return self.execute(body);
                }
            }
            Statement::Return(value) => return Ok(Some(self.evaluate(value)?)),
            Statement::MemCopy {
                source,
                destination,
                count,
                ..
            } => {
                let count = self.evaluate(count)?.as_index()?;
                let source_data = self.array_ref(source)?.data.clone();
                let destination_array = self
                    .arrays
                    .get_mut(destination.name())
                    .ok_or_else(|| ExecutionError::UnknownSymbol(destination.name().to_string()))?;
                let count = usize::try_from(count).unwrap_or(0);
                for (target, value) in destination_array
                    .data
                    .iter_mut()
                    .zip(source_data)
                    .take(count)
                {
                    *target = value;
                }
            }
            Statement::Raise { message, warning_only } => {
                if *warning_only {
                    warn!("{message}");
                } else {
                    return Err(ExecutionError::Raised(message.clone()));
                }
            }
        }
        Ok(None)
    }

    fn assign(&mut self, op: AssignOp, target: &Expr, value: Value) -> Result<(), ExecutionError> {
        let combine = |old: Value| match op {
            AssignOp::Set => Ok(value),
            AssignOp::Add => arithmetic(BinaryOp::Add, old, value),
            AssignOp::Mul => arithmetic(BinaryOp::Mul, old, value),
        };
        match target {
            Expr::Symbol(symbol) => {
                let old = self.scalars.get(symbol.name()).copied().unwrap_or(Value::Int(0));
                let new = combine(old)?;
                self.scalars.insert(symbol.name().to_string(), new);
            }
            Expr::Subscript { array, indices } => {
                let indices = indices
                    .iter()
                    .map(|index| self.evaluate(index)?.as_index())
                    .collect::<Result<Vec<_>, _>>()?;
                let offset = self.offset(array, &indices)?;
                let entry = self
                    .arrays
                    .get_mut(array.name())
                    .ok_or_else(|| ExecutionError::UnknownSymbol(array.name().to_string()))?;
                let ty = entry.ty;
                entry.data[offset] = combine(entry.data[offset])?.convert(ty);
            }
            _ => return Err(ExecutionError::InvalidTarget),
        }
        Ok(())
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<Value, ExecutionError> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(*literal)),
            Expr::Symbol(symbol) => self
                .scalars
                .get(symbol.name())
                .copied()
                .ok_or_else(|| ExecutionError::UnknownSymbol(symbol.name().to_string())),
            Expr::Subscript { array, indices } => {
                let indices = indices
                    .iter()
                    .map(|index| self.evaluate(index)?.as_index())
                    .collect::<Result<Vec<_>, _>>()?;
                let offset = self.offset(array, &indices)?;
                Ok(self.array_ref(array)?.data[offset])
            }
            Expr::Binary { op, lhs, rhs } => arithmetic(*op, self.evaluate(lhs)?, self.evaluate(rhs)?),
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match (function.as_str(), args.as_slice()) {
                    ("pow", [Value::Int(base), Value::Int(exponent)]) if *exponent >= 0 => {
                        Ok(Value::Int(base.pow(*exponent as u32)))
                    }
                    ("pow", [base, exponent]) => Ok(Value::Float(base.as_f64().powf(exponent.as_f64()))),
                    _ => Err(ExecutionError::UnknownFunction(function.clone())),
                }
            }
        }
    }

    fn array_ref(&self, symbol: &Symbol) -> Result<&Array, ExecutionError> {
        self.arrays.get(symbol.name()).ok_or_else(|| {
            if self.scalars.contains_key(symbol.name()) {
                ExecutionError::NotAnArray(symbol.name().to_string())
            } else {
                ExecutionError::UnknownSymbol(symbol.name().to_string())
            }
        })
    }

    /// Row-major offset of a multi-index, checked against every dimension.
    fn offset(&self, symbol: &Symbol, indices: &[i64]) -> Result<usize, ExecutionError> {
        let array = self.array_ref(symbol)?;
        if indices.len() != array.shape.len() {
            return Err(ExecutionError::WrongNumberOfIndices {
                array: symbol.name().to_string(),
                expected: array.shape.len(),
                actual: indices.len(),
            });
        }
        let mut offset = 0;
        for (&index, &len) in indices.iter().zip(&array.shape) {
            if index < 0 || index as usize >= len {
                return Err(ExecutionError::IndexOutOfBounds {
                    array: symbol.name().to_string(),
                    index,
                    len,
                });
            }
            offset = offset * len + index as usize;
        }
        Ok(offset)
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ExecutionError> {
    use Value::{Float, Int};
    let value = match (op, lhs, rhs) {
        (BinaryOp::Greater, a, b) => Int((a.as_f64() > b.as_f64()) as i64),
        (BinaryOp::Add, Int(a), Int(b)) => Int(a + b),
        (BinaryOp::Sub, Int(a), Int(b)) => Int(a - b),
        (BinaryOp::Mul, Int(a), Int(b)) => Int(a * b),
        (BinaryOp::Div | BinaryOp::Rem, Int(_), Int(0)) => return Err(ExecutionError::DivisionByZero),
        (BinaryOp::Div, Int(a), Int(b)) => Int(a / b),
        (BinaryOp::Rem, Int(a), Int(b)) => Int(a % b),
        (BinaryOp::Add, a, b) => Float(a.as_f64() + b.as_f64()),
        (BinaryOp::Sub, a, b) => Float(a.as_f64() - b.as_f64()),
        (BinaryOp::Mul, a, b) => Float(a.as_f64() * b.as_f64()),
        (BinaryOp::Div, a, b) => Float(a.as_f64() / b.as_f64()),
        (BinaryOp::Rem, a, b) => Float(a.as_f64() % b.as_f64()),
    };
    Ok(value)
}

/// The result of running a transformation kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelOutcome {
    /// The value returned by the kernel, `0` on success.
    pub status: i64,
    /// The output array `values[point][dof][physical derivative][physical component]`.
    pub values: Vec<f64>,
}

/// Runs a `transform_reference_basis_derivatives` body generated for `ir`.
///
/// `reference_values` must have the layout
/// `[point][dof][reference derivative][reference component]` for the given `order`.
/// The output array is allocated for `order` and initially filled with NaN, so entries
/// the kernel never writes are easy to spot.
pub fn run_transform_kernel(
    ir: &ElementIr,
    body: &[Statement],
    order: usize,
    reference_values: &[f64],
    geometry: &GeometryBundle,
) -> Result<KernelOutcome, ExecutionError> {
    let num_points = geometry.num_points();
    let num_derivatives_g = ir.gdim().pow(order as u32);
    let output_len = num_points * ir.num_dofs() * num_derivatives_g * ir.physical_value_size();

    let mut interpreter = Interpreter::new();
    interpreter.bind_array(arguments::VALUES, &vec![f64::NAN; output_len]);
    interpreter.bind_scalar(arguments::ORDER, Value::Int(order as i64));
    interpreter.bind_scalar(arguments::NUM_POINTS, Value::Int(num_points as i64));
    interpreter.bind_array(arguments::REFERENCE_VALUES, reference_values);
    interpreter.bind_array(arguments::JACOBIAN, &geometry.flat_jacobians());
    interpreter.bind_array(arguments::DET_JACOBIAN, &geometry.flat_determinants());
    interpreter.bind_array(arguments::INVERSE_JACOBIAN, &geometry.flat_inverses());

    let status = match interpreter.execute(body)? {
        Some(value) => value.as_index()?,
        None => 0,
    };
    let values = interpreter
        .array(arguments::VALUES)
        .ok_or_else(|| ExecutionError::UnknownSymbol(arguments::VALUES.to_string()))?;
    Ok(KernelOutcome { status, values })
}
