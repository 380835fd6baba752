use compact_str::CompactString;
use std::fmt;

use crate::{Capture, Value};

/// The actual parameters of one call, copied at call time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedArguments {
    pub positional: Vec<Value>,
    pub keyword: Vec<(CompactString, Value)>,
}

impl CapturedArguments {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Comma-joined positional values followed by `name=value` pairs.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CapturedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in &self.positional {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{value}")?;
        }
        for (name, value) in &self.keyword {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Marks a keyword argument inside an argument tuple.
///
/// ```
/// use sillage_types::{Arguments, Kw};
///
/// let args = (5u32, Kw("k", 2u32));
/// assert_eq!(args.capture_arguments().render(), "5,k=2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kw<T>(pub &'static str, pub T);

/// One element of an argument list.
pub trait Argument {
    fn capture_into(&self, out: &mut CapturedArguments);
}

impl<T: Capture + ?Sized> Argument for T {
    fn capture_into(&self, out: &mut CapturedArguments) {
        out.positional.push(self.capture());
    }
}

impl<T: Capture> Argument for Kw<T> {
    fn capture_into(&self, out: &mut CapturedArguments) {
        out.keyword
            .push((CompactString::from(self.0), self.1.capture()));
    }
}

/// A full argument list handed to a traced function.
///
/// Tuples are argument lists; any other capturable type is a single
/// positional argument.
pub trait Arguments {
    fn capture_arguments(&self) -> CapturedArguments;
}

impl Arguments for () {
    fn capture_arguments(&self) -> CapturedArguments {
        CapturedArguments::default()
    }
}

fn single<T: Argument + ?Sized>(value: &T) -> CapturedArguments {
    let mut out = CapturedArguments::default();
    value.capture_into(&mut out);
    out
}

impl<T: Capture> Arguments for Kw<T> {
    fn capture_arguments(&self) -> CapturedArguments {
        single(self)
    }
}

macro_rules! single_argument {
    ($($ty:ty),*) => {
        $(impl Arguments for $ty {
            fn capture_arguments(&self) -> CapturedArguments {
                single(self)
            }
        })*
    };
}

single_argument!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, str, String, Value
);

impl<T: Capture + ?Sized> Arguments for &T {
    fn capture_arguments(&self) -> CapturedArguments {
        single(self)
    }
}

impl<T: Capture + ?Sized> Arguments for Box<T> {
    fn capture_arguments(&self) -> CapturedArguments {
        single(self)
    }
}

impl<T: Capture> Arguments for [T] {
    fn capture_arguments(&self) -> CapturedArguments {
        single(self)
    }
}

impl<T: Capture, const N: usize> Arguments for [T; N] {
    fn capture_arguments(&self) -> CapturedArguments {
        single(self)
    }
}

impl<T: Capture> Arguments for Vec<T> {
    fn capture_arguments(&self) -> CapturedArguments {
        single(self)
    }
}

impl<T: Capture> Arguments for Option<T> {
    fn capture_arguments(&self) -> CapturedArguments {
        single(self)
    }
}

macro_rules! tuple_arguments {
    ($($name:ident),+) => {
        impl<$($name: Argument),+> Arguments for ($($name,)+) {
            #[allow(non_snake_case)]
            fn capture_arguments(&self) -> CapturedArguments {
                let ($($name,)+) = self;
                let mut out = CapturedArguments::default();
                $($name.capture_into(&mut out);)+
                out
            }
        }
    };
}

tuple_arguments!(A);
tuple_arguments!(A, B);
tuple_arguments!(A, B, C);
tuple_arguments!(A, B, C, D);
