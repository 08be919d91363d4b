/// Generates the std::ops boilerplate for single-field tuple newtypes.
///
/// `binary` covers `Add`-style traits, `inplace` covers the `*Assign`
/// variants and `unary` covers `Neg`. The wrapped field must itself
/// implement the named trait.
#[macro_export]
macro_rules! op {
    (binary $ty:ident, $op:ident, $method:ident) => {
        impl $op for $ty {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(self.0.$method(rhs.0))
            }
        }
    };
    (inplace $ty:ident, $op:ident, $method:ident) => {
        impl $op for $ty {
            fn $method(&mut self, rhs: Self) {
                self.0.$method(rhs.0);
            }
        }
    };
    (unary $ty:ident, $op:ident, $method:ident) => {
        impl $op for $ty {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(self.0.$method())
            }
        }
    };
}
