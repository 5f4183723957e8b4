use crate::error::{ArachneError, Result};

/// One-off template rendering. Autoescape is off: everything rendered here
/// is source code (conanfiles, CMake, C++), not markup.
pub fn render_template(template: &str, context: &serde_json::Value) -> Result<String> {
    let context = tera::Context::from_serialize(context)
        .map_err(|err| ArachneError::Other(anyhow::Error::new(err)))?;
    tera::Tera::one_off(template, &context, false)
        .map_err(|err| ArachneError::Other(anyhow::Error::new(err)))
}
