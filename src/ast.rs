//! Abstract Syntax Tree for mathematical expressions

use std::collections::BTreeSet;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
}

impl Deref for Expr {
    type Target = ExprKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Constant number (e.g., 3.14, 1e10)
    Number(f64),

    /// Variable or named constant (e.g., "x", "theta", "Pi")
    Symbol(String),

    /// Elementary function call, stored under its canonical name
    FunctionCall { name: String, args: Vec<Expr> },

    /// Addition
    Add(Arc<Expr>, Arc<Expr>),

    /// Subtraction
    Sub(Arc<Expr>, Arc<Expr>),

    /// Multiplication
    Mul(Arc<Expr>, Arc<Expr>),

    /// Division
    Div(Arc<Expr>, Arc<Expr>),

    /// Exponentiation
    Pow(Arc<Expr>, Arc<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr { kind }
    }

    // Accessor methods

    /// Check if expression is a constant number and return its value
    pub fn as_number(&self) -> Option<f64> {
        match &self.kind {
            ExprKind::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Check if this expression is exactly the number zero
    ///
    /// Small coefficients such as `6.67e-11` are not zero.
    #[inline]
    pub fn is_zero_num(&self) -> bool {
        self.as_number() == Some(0.0)
    }

    /// Check if this expression is exactly the number one
    #[inline]
    pub fn is_one_num(&self) -> bool {
        self.as_number() == Some(1.0)
    }

    /// Check if this expression is exactly the number negative one
    #[inline]
    pub fn is_neg_one_num(&self) -> bool {
        self.as_number() == Some(-1.0)
    }

    // Convenience constructors

    /// Create a number expression
    pub fn number(n: f64) -> Self {
        Expr::new(ExprKind::Number(n))
    }

    /// Create a symbol expression
    pub fn symbol(s: impl Into<String>) -> Self {
        Expr::new(ExprKind::Symbol(s.into()))
    }

    fn binary(node: fn(Arc<Expr>, Arc<Expr>) -> ExprKind, left: Expr, right: Expr) -> Self {
        Expr::new(node(Arc::new(left), Arc::new(right)))
    }

    pub fn add_expr(left: Expr, right: Expr) -> Self {
        Self::binary(ExprKind::Add, left, right)
    }

    pub fn sub_expr(left: Expr, right: Expr) -> Self {
        Self::binary(ExprKind::Sub, left, right)
    }

    pub fn mul_expr(left: Expr, right: Expr) -> Self {
        Self::binary(ExprKind::Mul, left, right)
    }

    pub fn div_expr(left: Expr, right: Expr) -> Self {
        Self::binary(ExprKind::Div, left, right)
    }

    /// Create a power expression `base^exponent`
    pub fn pow(base: Expr, exponent: Expr) -> Self {
        Self::binary(ExprKind::Pow, base, exponent)
    }

    /// Create a single-argument call; `name` should be the canonical function name
    pub fn func(name: impl Into<String>, content: Expr) -> Self {
        Self::func_multi(name, vec![content])
    }

    /// Create a multi-argument function call expression
    pub fn func_multi(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::new(ExprKind::FunctionCall {
            name: name.into(),
            args,
        })
    }

    // Analysis methods

    /// Direct subexpressions, left to right
    fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Number(_) | ExprKind::Symbol(_) => Vec::new(),
            ExprKind::FunctionCall { args, .. } => args.iter().collect(),
            ExprKind::Add(l, r)
            | ExprKind::Sub(l, r)
            | ExprKind::Mul(l, r)
            | ExprKind::Div(l, r)
            | ExprKind::Pow(l, r) => vec![l.as_ref(), r.as_ref()],
        }
    }

    /// Total number of nodes, checked against the node limit before differentiation
    pub fn node_count(&self) -> usize {
        1 + self.children().into_iter().map(Expr::node_count).sum::<usize>()
    }

    /// Nesting depth; a leaf has depth 1
    ///
    /// A run of `+`/`-` or of `*`/`/` nodes counts as a single level, so a sum of
    /// 200 terms is as deep as `a + b`.
    pub fn max_depth(&self) -> usize {
        self.depth_below(None)
    }

    fn chain(&self) -> Option<Chain> {
        match self.kind {
            ExprKind::Add(..) | ExprKind::Sub(..) => Some(Chain::Additive),
            ExprKind::Mul(..) | ExprKind::Div(..) => Some(Chain::Multiplicative),
            _ => None,
        }
    }

    fn depth_below(&self, parent: Option<Chain>) -> usize {
        let chain = self.chain();
        let own = usize::from(chain.is_none() || chain != parent);
        own + self
            .children()
            .into_iter()
            .map(|c| c.depth_below(chain))
            .max()
            .unwrap_or(0)
    }

    /// Whether the symbol `var` occurs anywhere in the expression
    pub fn contains_var(&self, var: &str) -> bool {
        match &self.kind {
            ExprKind::Symbol(s) => s == var,
            _ => self.children().into_iter().any(|c| c.contains_var(var)),
        }
    }

    /// Every symbol name referenced by the expression, sorted and without repeats
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        if let ExprKind::Symbol(s) = &self.kind {
            out.insert(s.clone());
        }
        for child in self.children() {
            child.collect_symbols(out);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Chain {
    Additive,
    Multiplicative,
}

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::add_expr(self, rhs)
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::sub_expr(self, rhs)
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::mul_expr(self, rhs)
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::div_expr(self, rhs)
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::mul_expr(Expr::number(-1.0), self)
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::number(n)
    }
}
