//! Conversions between field values and attribute/text strings.

use std::borrow::Cow;

/// Why a string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextError {
    Number,
    Enum,
}

/// A value that lives in an attribute or in an element's text.
///
/// Parsing is strict: numbers are plain ASCII digits, booleans and enums must
/// match a keyword exactly.
pub trait TextValue: Sized {
    fn parse_text(raw: &str) -> Result<Self, TextError>;
    fn to_text(&self) -> Cow<'_, str>;
}

impl TextValue for String {
    fn parse_text(raw: &str) -> Result<Self, TextError> {
        Ok(raw.to_string())
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl TextValue for bool {
    fn parse_text(raw: &str) -> Result<Self, TextError> {
        match raw {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(TextError::Enum),
        }
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }
}

/// Digits only, with an optional leading `-` when `signed`.
fn is_strict_integer(raw: &str, signed: bool) -> bool {
    let digits = match raw.strip_prefix('-') {
        Some(rest) if signed => rest,
        _ => raw,
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

macro_rules! integer_text_value {
    ($($ty:ty => $signed:expr),* $(,)?) => {
        $(
            impl TextValue for $ty {
                fn parse_text(raw: &str) -> Result<Self, TextError> {
                    if !is_strict_integer(raw, $signed) {
                        return Err(TextError::Number);
                    }
                    raw.parse().map_err(|_| TextError::Number)
                }

                fn to_text(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

integer_text_value!(u8 => false, u16 => false, u32 => false, u64 => false, usize => false);
integer_text_value!(i32 => true, i64 => true);

/// Macro for generating keyword enums bound to attribute values.
///
/// # Example
///
/// ```ignore
/// xml_enum! {
///     /// Text direction.
///     pub enum Direction {
///         #[default]
///         Ltr => "ltr",
///         Rtl => "rtl",
///     }
/// }
/// ```
macro_rules! xml_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $text:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $name {
            /// Returns the XML keyword for this value.
            #[inline]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }
        }

        impl $crate::bind::TextValue for $name {
            fn parse_text(raw: &str) -> ::std::result::Result<Self, $crate::bind::TextError> {
                match raw {
                    $($text => Ok($name::$variant),)*
                    _ => Err($crate::bind::TextError::Enum),
                }
            }

            fn to_text(&self) -> std::borrow::Cow<'_, str> {
                std::borrow::Cow::Borrowed(self.as_str())
            }
        }
    };
}

pub(crate) use xml_enum;
