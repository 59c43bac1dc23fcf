/// A trait that allows to check, if a number is in the normal spectrum or any
pub trait IsNormalNumber: Copy {
    /// Returns true if the number is a normal number and not something like Infinity or NaN.
    fn is_normal_number(self) -> bool;

    /// Returns true if the number can be used as a probability mass, i.e. it is
    /// a normal number and strictly greater than zero.
    fn is_positive_mass(self) -> bool;
}

macro_rules! impl_is_normal_number {
    (for unsigned: $($t:ident),*) => {
        $(
            impl IsNormalNumber for $t {
                #[inline(always)]
                fn is_normal_number(self) -> bool {
                    true
                }

                #[inline(always)]
                fn is_positive_mass(self) -> bool {
                    self > 0
                }
            }
        )*
    };
    (for float: $($t:ident),*) => {
        $(
            impl IsNormalNumber for $t {
                #[inline(always)]
                fn is_normal_number(self) -> bool {
                    self.is_normal()
                }

                #[inline(always)]
                fn is_positive_mass(self) -> bool {
                    self.is_normal() && self.is_sign_positive()
                }
            }
        )*
    };
}

impl_is_normal_number!(for unsigned: u8, u16, u32, u64, u128, usize);
impl_is_normal_number!(for float: f32, f64);
