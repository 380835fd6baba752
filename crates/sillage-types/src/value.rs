use std::fmt;

/// An owned copy of a value observed during a trace.
///
/// Captures never borrow from the traced code: a `Value` is built by walking
/// the original and copying every element, so the recorded history stays
/// intact no matter what the algorithm does with its own data afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "'{s}'"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

fn fmt_seq(f: &mut fmt::Formatter<'_>, items: &[Value], open: &str, close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        item.fmt_nested(f)?;
    }
    if items.len() == 1 && open == "(" {
        f.write_str(",")?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => fmt_seq(f, items, "[", "]"),
            Self::Tuple(items) => fmt_seq(f, items, "(", ")"),
        }
    }
}

/// Types whose current state can be copied into a [`Value`].
pub trait Capture {
    fn capture(&self) -> Value;
}

macro_rules! capture_signed {
    ($($ty:ty),*) => {
        $(impl Capture for $ty {
            fn capture(&self) -> Value {
                Value::Int(*self as i64)
            }
        })*
    };
}

macro_rules! capture_unsigned {
    ($($ty:ty),*) => {
        $(impl Capture for $ty {
            fn capture(&self) -> Value {
                Value::UInt(*self as u64)
            }
        })*
    };
}

capture_signed!(i8, i16, i32, i64, isize);
capture_unsigned!(u8, u16, u32, u64, usize);

impl Capture for f32 {
    fn capture(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Capture for f64 {
    fn capture(&self) -> Value {
        Value::Float(*self)
    }
}

impl Capture for bool {
    fn capture(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Capture for char {
    fn capture(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl Capture for () {
    fn capture(&self) -> Value {
        Value::Unit
    }
}

impl Capture for str {
    fn capture(&self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl Capture for String {
    fn capture(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl Capture for Value {
    fn capture(&self) -> Value {
        self.clone()
    }
}

impl<T: Capture + ?Sized> Capture for &T {
    fn capture(&self) -> Value {
        (**self).capture()
    }
}

impl<T: Capture + ?Sized> Capture for Box<T> {
    fn capture(&self) -> Value {
        (**self).capture()
    }
}

impl<T: Capture> Capture for [T] {
    fn capture(&self) -> Value {
        Value::List(self.iter().map(Capture::capture).collect())
    }
}

impl<T: Capture, const N: usize> Capture for [T; N] {
    fn capture(&self) -> Value {
        self.as_slice().capture()
    }
}

impl<T: Capture> Capture for Vec<T> {
    fn capture(&self) -> Value {
        self.as_slice().capture()
    }
}

impl<T: Capture> Capture for Option<T> {
    fn capture(&self) -> Value {
        match self {
            Some(value) => value.capture(),
            None => Value::Unit,
        }
    }
}

macro_rules! capture_tuple {
    ($($name:ident),+) => {
        impl<$($name: Capture),+> Capture for ($($name,)+) {
            #[allow(non_snake_case)]
            fn capture(&self) -> Value {
                let ($($name,)+) = self;
                Value::Tuple(vec![$($name.capture()),+])
            }
        }
    };
}

/// How a traced function's result is recorded.
///
/// Every capturable value counts as a completed call. A `Result` completes
/// only when it is `Ok`; an `Err` leaves the activation without a return
/// value, exactly like a call that never came back.
pub trait Outcome {
    fn return_value(&self) -> Option<Value>;
}

impl<T: Capture + ?Sized> Outcome for T {
    fn return_value(&self) -> Option<Value> {
        Some(self.capture())
    }
}

impl<T: Capture, E> Outcome for Result<T, E> {
    fn return_value(&self) -> Option<Value> {
        self.as_ref().ok().map(Capture::capture)
    }
}

capture_tuple!(A);
capture_tuple!(A, B);
capture_tuple!(A, B, C);
capture_tuple!(A, B, C, D);
