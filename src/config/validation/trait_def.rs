//! Validation trait definition

/// Implemented by every configuration section. Errors are human-readable and
/// name the offending field.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
