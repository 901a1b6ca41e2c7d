use std::ops;

use crate::bytecode::{GlobalId, builtins};

/// Body of a function under construction.
///
/// Trees are built with the free constructors in this module ([`arg`],
/// [`lit`], [`call`], [`if_`]) plus the arithmetic helpers, then handed to
/// the compiler, which consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Apply a supercombinator to zero or more arguments, curried left to right.
    Call { global: GlobalId, args: Vec<Expr> },

    /// An integer constant.
    Literal(i64),

    /// Parameter `n` (0-indexed) of the function being compiled.
    Arg(usize),
}

/// Reference to parameter `n` of the function being compiled.
pub fn arg(n: usize) -> Expr {
    Expr::Arg(n)
}

pub fn lit(value: i64) -> Expr {
    Expr::Literal(value)
}

/// Call `global` with `args`.
pub fn call(global: GlobalId, args: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Call {
        global,
        args: args.into_iter().collect(),
    }
}

/// The builtin conditional: `cond` nonzero selects `then`, zero selects `otherwise`.
/// Only the selected branch is evaluated.
pub fn if_(cond: impl Into<Expr>, then: impl Into<Expr>, otherwise: impl Into<Expr>) -> Expr {
    call(builtins::IF, [cond.into(), then.into(), otherwise.into()])
}

impl Expr {
    pub fn add(self, rhs: impl Into<Expr>) -> Expr {
        call(builtins::ADD, [self, rhs.into()])
    }

    pub fn sub(self, rhs: impl Into<Expr>) -> Expr {
        call(builtins::SUB, [self, rhs.into()])
    }

    pub fn mul(self, rhs: impl Into<Expr>) -> Expr {
        call(builtins::MUL, [self, rhs.into()])
    }

    pub fn div(self, rhs: impl Into<Expr>) -> Expr {
        call(builtins::DIV, [self, rhs.into()])
    }

    /// `1` if both sides are equal, `0` otherwise.
    pub fn equals(self, rhs: impl Into<Expr>) -> Expr {
        call(builtins::EQU, [self, rhs.into()])
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Literal(value)
    }
}

// unsuffixed integer literals fall back to i32
impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Literal(i64::from(value))
    }
}

macro_rules! binop_impl {
    ($trait:ident, $method:ident) => {
        impl<R: Into<Expr>> ops::$trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::$method(self, rhs)
            }
        }
    };
}

binop_impl!(Add, add);
binop_impl!(Sub, sub);
binop_impl!(Mul, mul);
binop_impl!(Div, div);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_build_builtin_calls() {
        let e = arg(0) + 1;
        assert_eq!(
            e,
            Expr::Call {
                global: builtins::ADD,
                args: vec![Expr::Arg(0), Expr::Literal(1)],
            }
        );

        let e = arg(0) * (arg(1) - 2);
        let Expr::Call { global, args } = e else {
            panic!("expected a call");
        };
        assert_eq!(global, builtins::MUL);
        assert!(matches!(&args[1], Expr::Call { global, .. } if *global == builtins::SUB));
    }

    #[test]
    fn test_named_and_operator_forms_agree() {
        assert_eq!(arg(0) / 2, arg(0).div(2));
        assert_eq!(arg(0).equals(lit(3)), call(builtins::EQU, [arg(0), lit(3)]));
    }

    #[test]
    fn test_if_argument_order() {
        let e = if_(arg(0), 1, arg(1));
        assert_eq!(
            e,
            Expr::Call {
                global: builtins::IF,
                args: vec![Expr::Arg(0), Expr::Literal(1), Expr::Arg(1)],
            }
        );
    }
}
