//! A small, backend-agnostic statement tree for imperative numeric kernels.
//!
//! Generators build trees out of immutable fragments (`Vec<Statement>`) and compose them by
//! concatenation. Rendering to text is done by [`crate::render`], evaluation in memory by
//! [`crate::interpret`].
//!
//! The arithmetic operators on [`Expr`] fold literal zeros and ones, so that for example the
//! scale factor `1` of an affine mapping disappears from the emitted code entirely.
use std::fmt;
use std::ops::{Add, Div, Mul, Rem, Sub};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Literal {
    Float(f64),
    Int(i64),
}

impl Literal {
    fn is_zero(&self) -> bool {
        match *self {
            Literal::Float(x) => x == 0.0,
            Literal::Int(i) => i == 0,
        }
    }

    fn is_one(&self) -> bool {
        match *self {
            Literal::Float(x) => x == 1.0,
            Literal::Int(i) => i == 1,
        }
    }
}

/// A named variable, array or function argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Subscripts the symbol, one index per array dimension.
    pub fn at<I>(&self, indices: I) -> Expr
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        Expr::Subscript {
            array: self.clone(),
            indices: indices.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Greater,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Greater => ">",
        }
    }

    /// Binding strength, higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 3,
            BinaryOp::Add | BinaryOp::Sub => 2,
            BinaryOp::Greater => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Symbol(Symbol),
    Subscript { array: Symbol, indices: Vec<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Call { function: String, args: Vec<Expr> },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            function: function.into(),
            args,
        }
    }

    pub fn greater(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Greater, self, rhs.into())
    }

    /// Sum of all terms, `0` for no terms.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        terms.into_iter().fold(Expr::int(0), |acc, term| acc + term)
    }

    /// Product of all factors, `1` for no factors.
    pub fn product(factors: impl IntoIterator<Item = Expr>) -> Self {
        factors
            .into_iter()
            .fold(Expr::int(1), |acc, factor| acc * factor)
    }

    pub fn as_literal(&self) -> Option<Literal> {
        match self {
            Expr::Literal(literal) => Some(*literal),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        self.as_literal().map_or(false, |l| l.is_zero())
    }

    fn is_one(&self) -> bool {
        self.as_literal().map_or(false, |l| l.is_one())
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn int_pair(lhs: &Expr, rhs: &Expr) -> Option<(i64, i64)> {
        match (lhs.as_literal()?, rhs.as_literal()?) {
            (Literal::Int(a), Literal::Int(b)) => Some((a, b)),
            _ => None,
        }
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::Symbol(symbol)
    }
}

impl From<&Symbol> for Expr {
    fn from(symbol: &Symbol) -> Self {
        Expr::Symbol(symbol.clone())
    }
}

/// # Panics
///
/// Panics if `value` does not fit in an `i64`. Sizes and offsets of a validated
/// [`ElementIr`](crate::ir::ElementIr) always do.
impl From<usize> for Expr {
    fn from(value: usize) -> Self {
        Expr::int(i64::try_from(value).expect("Integer literal must fit in i64"))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::int(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::float(value)
    }
}

impl<T: Into<Expr>> Add<T> for Expr {
    type Output = Expr;

    fn add(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        if let Some((a, b)) = Expr::int_pair(&self, &rhs) {
            Expr::int(a + b)
        } else if self.is_zero() {
            rhs
        } else if rhs.is_zero() {
            self
        } else {
            Expr::binary(BinaryOp::Add, self, rhs)
        }
    }
}

impl<T: Into<Expr>> Sub<T> for Expr {
    type Output = Expr;

    fn sub(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        if let Some((a, b)) = Expr::int_pair(&self, &rhs) {
            Expr::int(a - b)
        } else if rhs.is_zero() {
            self
        } else {
            Expr::binary(BinaryOp::Sub, self, rhs)
        }
    }
}

impl<T: Into<Expr>> Mul<T> for Expr {
    type Output = Expr;

    fn mul(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        if let Some((a, b)) = Expr::int_pair(&self, &rhs) {
            Expr::int(a * b)
        } else if self.is_zero() {
            self
        } else if rhs.is_zero() {
            rhs
        } else if self.is_one() {
            rhs
        } else if rhs.is_one() {
            self
        } else {
            Expr::binary(BinaryOp::Mul, self, rhs)
        }
    }
}

impl<T: Into<Expr>> Div<T> for Expr {
    type Output = Expr;

    fn div(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        match Expr::int_pair(&self, &rhs) {
            Some((a, b)) if b != 0 => Expr::int(a / b),
            _ if rhs.is_one() => self,
            _ => Expr::binary(BinaryOp::Div, self, rhs),
        }
    }
}

impl<T: Into<Expr>> Rem<T> for Expr {
    type Output = Expr;

    fn rem(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        match Expr::int_pair(&self, &rhs) {
            Some((a, b)) if b != 0 => Expr::int(a % b),
            _ => Expr::binary(BinaryOp::Rem, self, rhs),
        }
    }
}

/// A pointer argument interpreted as a multi-dimensional, row-major array.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedArray {
    symbol: Symbol,
    dims: Vec<Expr>,
}

impl FlattenedArray {
    pub fn new(symbol: Symbol, dims: Vec<Expr>) -> Self {
        Self { symbol, dims }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Total number of entries.
    pub fn len(&self) -> Expr {
        Expr::product(self.dims.iter().cloned())
    }

    /// Accesses the entry at the given multi-index.
    ///
    /// # Panics
    ///
    /// Panics if the number of indices differs from the number of dimensions.
    pub fn at(&self, indices: Vec<Expr>) -> Expr {
        assert_eq!(indices.len(), self.dims.len(), "Index count must match array dimensions.");
        let mut flat = Expr::int(0);
        for (index, dim) in indices.into_iter().zip(&self.dims) {
            flat = flat * dim.clone() + index;
        }
        self.symbol.at([flat])
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScalarType {
    Double,
    /// The integer type used for sizes and indices, configured by
    /// [`CodegenSettings::index_type`](crate::CodegenSettings::index_type).
    Index,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Storage {
    Mutable,
    Const,
    StaticConst,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Mul,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Comment(String),
    VariableDecl {
        ty: ScalarType,
        storage: Storage,
        symbol: Symbol,
        value: Expr,
    },
    /// A local array. Without initial values the contents are unspecified until written.
    ArrayDecl {
        ty: ScalarType,
        storage: Storage,
        symbol: Symbol,
        shape: Vec<usize>,
        values: Option<Vec<Literal>>,
    },
    Assign {
        op: AssignOp,
        target: Expr,
        value: Expr,
    },
    /// Loop over `index` in `begin .. end`.
    ForRange {
        index: Symbol,
        begin: Expr,
        end: Expr,
        body: Vec<Statement>,
    },
    If {
        condition: Expr,
        body: Vec<Statement>,
    },
    Return(Expr),
    MemCopy {
        ty: ScalarType,
        source: Symbol,
        destination: Symbol,
        count: Expr,
    },
    /// Signals a runtime error, or only prints a warning if `warning_only` is set.
    Raise {
        message: String,
        warning_only: bool,
    },
}

impl Statement {
    pub fn comment(text: impl Into<String>) -> Self {
        Statement::Comment(text.into())
    }

    pub fn assign(target: Expr, value: impl Into<Expr>) -> Self {
        Statement::Assign {
            op: AssignOp::Set,
            target,
            value: value.into(),
        }
    }

    pub fn assign_add(target: Expr, value: impl Into<Expr>) -> Self {
        Statement::Assign {
            op: AssignOp::Add,
            target,
            value: value.into(),
        }
    }

    pub fn assign_mul(target: Expr, value: impl Into<Expr>) -> Self {
        Statement::Assign {
            op: AssignOp::Mul,
            target,
            value: value.into(),
        }
    }

    /// A constant integer table, `const index_type name[len] = { values };`.
    pub fn index_table(symbol: Symbol, values: &[usize]) -> Self {
        Statement::ArrayDecl {
            ty: ScalarType::Index,
            storage: Storage::Const,
            symbol,
            shape: vec![values.len()],
            values: Some(values.iter().map(|&v| Literal::Int(v as i64)).collect()),
        }
    }
}

/// A loop range `(index, begin, end)`.
pub type Range = (Symbol, Expr, Expr);

pub fn for_range(index: Symbol, begin: impl Into<Expr>, end: impl Into<Expr>, body: Vec<Statement>) -> Statement {
    Statement::ForRange {
        index,
        begin: begin.into(),
        end: end.into(),
        body,
    }
}

/// Perfectly nested loops, the first range outermost.
pub fn for_ranges(ranges: Vec<Range>, body: Vec<Statement>) -> Vec<Statement> {
    ranges
        .into_iter()
        .rev()
        .fold(body, |body, (index, begin, end)| vec![for_range(index, begin, end, body)])
}

/// Sets the `len` first entries of `array` to zero.
pub fn zero_fill(array: &Symbol, len: Expr, index: Symbol) -> Statement {
    let target = array.at([&index]);
    for_range(index, 0usize, len, vec![Statement::assign(target, 0.0)])
}
