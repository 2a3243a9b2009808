//! Operator-implementation helpers for transparent numeric newtypes.

/// Implements a std::ops trait for a single-field tuple struct by delegating to the inner value.
///
/// `binary` covers `Add`-style traits, `inplace` covers `AddAssign`-style traits, and `unary`
/// covers `Neg`-style traits. The trait must be in scope at the expansion site.
#[macro_export]
macro_rules! op {
    (binary $t:ident, $op:ident, $f:ident) => {
        impl $op for $t {
            type Output = Self;

            fn $f(self, rhs: Self) -> Self::Output {
                Self(self.0.$f(rhs.0))
            }
        }
    };
    (inplace $t:ident, $op:ident, $f:ident) => {
        impl $op for $t {
            fn $f(&mut self, rhs: Self) {
                self.0.$f(rhs.0);
            }
        }
    };
    (unary $t:ident, $op:ident, $f:ident) => {
        impl $op for $t {
            type Output = Self;

            fn $f(self) -> Self::Output {
                Self(self.0.$f())
            }
        }
    };
}
