//! Post-solve validation: a single source of truth for every constraint a
//! produced schedule must satisfy, surfaced as data rather than thrown.

pub mod validator;

pub use validator::{ValidationError, ValidationErrorType, ValidationResult, Validator};
