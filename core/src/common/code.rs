use thiserror::Error;

/// An integer code that does not map onto any variant of a coded enum.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u8,
}

impl UnknownCode {
    pub fn new(kind: &'static str, code: u8) -> Self {
        Self { kind, code }
    }
}

/// Declares a fieldless enum whose variants carry stable integer codes.
///
/// Generates `code()`, an `ALL` table in declaration order and a
/// `TryFrom<u8>` that fails with [`UnknownCode`] for unmapped codes.
#[macro_export]
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $code ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(self) -> u8 {
                self as u8
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = $crate::common::code::UnknownCode;

            fn try_from(code: u8) -> ::core::result::Result<Self, Self::Error> {
                match code {
                    $( $code => Ok($name::$variant), )+
                    _ => Err($crate::common::code::UnknownCode::new($kind, code)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::coded_enum! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Fruit: "fruit" {
            Apple = 0,
            Pear = 1,
            Plum = 4,
        }
    }

    #[test]
    fn codes_round_trip() {
        for fruit in Fruit::ALL {
            assert_eq!(Fruit::try_from(fruit.code()), Ok(*fruit));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = Fruit::try_from(2).unwrap_err();
        assert_eq!(err.kind, "fruit");
        assert_eq!(err.code, 2);
        assert_eq!(err.to_string(), "Unknown fruit code 2");
    }
}
