//! Shared model for sillage traces.
//!
//! Every invocation the call-graph recorder observes becomes an activation,
//! keyed by an [`ActivationId`] that is unique within one run. Arguments and
//! return values are captured as owned [`Value`]s at the moment they are
//! observed, so later mutation by the traced code can never rewrite history.

use facet::Facet;
use std::error::Error;
use std::fmt;

mod arguments;
mod snapshot;
mod value;

pub use arguments::{Argument, Arguments, CapturedArguments, Kw};
pub use snapshot::{AuxRecord, EdgeRecord, GraphSnapshot, NodeRecord};
pub use value::{Capture, Outcome, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    ZeroId(&'static str),
    IdOutOfRange {
        field: &'static str,
        max: u64,
        got: u64,
    },
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroId(field) => write!(f, "{field} must be non-zero"),
            Self::IdOutOfRange { field, max, got } => {
                write!(f, "{field} must be <= {max}, got {got}")
            }
        }
    }
}

impl Error for InvariantError {}

pub const JS_SAFE_INT_MAX_U64: u64 = (1u64 << 53) - 1;

macro_rules! define_u64_id {
    (
        $(#[$meta:meta])*
        $name:ident,
        field = $field:literal
        , max = $max:expr
    ) => {
        #[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[facet(transparent)]
        $(#[$meta])*
        pub struct $name(u64);

        impl $name {
            pub fn new(value: u64) -> Result<Self, InvariantError> {
                if value == 0 {
                    return Err(InvariantError::ZeroId($field));
                }
                if value > $max {
                    return Err(InvariantError::IdOutOfRange {
                        field: $field,
                        max: $max,
                        got: value,
                    });
                }
                Ok(Self(value))
            }

            /// The identifier following this one.
            pub fn next(self) -> Result<Self, InvariantError> {
                Self::new(self.0.saturating_add(1))
            }

            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_u64_id!(
    /// Identity of one activation, unique among all activations of a run,
    /// re-entrant calls with identical arguments included.
    ActivationId,
    field = "activation_id",
    max = JS_SAFE_INT_MAX_U64
);
define_u64_id!(
    /// One begin/reset epoch of a call graph. Frames minted under an older
    /// run no longer resolve.
    RunId,
    field = "run_id",
    max = JS_SAFE_INT_MAX_U64
);
