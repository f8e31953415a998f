//! Parameter resolution: binding untyped wire input to typed arguments.
//!
//! For each declared parameter, in order:
//! - dynamic (`$name`): produced by the named [`DynamicParameter`], used as-is
//! - static file: persisted from the multipart body into a movable [`FileRef`]
//! - static scalar: read from the body/part/query, length-checked, defaulted,
//!   validated and converted
//!
//! A required parameter that ends up null fails with `ParameterRequired`.

mod convert;
mod dynamic;
mod resolve;
mod upload;
mod validate;
mod value;

pub use dynamic::{DynamicParameter, DynamicResolvers};
pub use resolve::ParameterResolver;
pub use upload::FileRef;
pub use validate::{is_email, is_uuid};
pub use value::{Arguments, ParamValue};
