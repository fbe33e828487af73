//! Embedded assets — the worker-spec template compiled into the binary.
//!
//! At compile time, `include_dir!` embeds everything under
//! `cli/templates/`. The template and the generator ship together, so
//! a missing placeholder at render time is a build defect, not a
//! runtime condition to recover from.

use include_dir::{Dir, include_dir};

use hivemind_common::TemplateError;

/// All embedded templates, compiled in at build time.
static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Asset name of the worker-spec template.
pub const WORKER_SPEC_TEMPLATE: &str = "worker_spec.json";

/// Return the worker-spec template text.
///
/// # Errors
///
/// Returns [`TemplateError::TemplateMissing`] if the asset is absent
/// or not valid UTF-8.
pub fn worker_template() -> Result<&'static str, TemplateError> {
    TEMPLATES
        .get_file(WORKER_SPEC_TEMPLATE)
        .and_then(include_dir::File::contents_utf8)
        .ok_or_else(|| TemplateError::TemplateMissing(WORKER_SPEC_TEMPLATE.to_string()))
}
