//! Placeholder rendering — pure functions, no I/O, no async.
//!
//! A template contains named slots of the form `{{name}}`. Rendering
//! replaces each slot exactly once in a single left-to-right pass:
//! substitution values are spliced in, never re-scanned, so a value
//! that itself contains a placeholder token is emitted verbatim.

use hivemind_common::TemplateError;

/// Render `template`, replacing each named placeholder exactly once.
///
/// Surrounding text is preserved byte-for-byte. Substitution order
/// follows the placeholder positions in the template, not the order
/// of `substitutions`.
///
/// # Errors
///
/// Returns [`TemplateError::PlaceholderNotFound`] if any named slot
/// is absent from the template — this signals a template/generator
/// version mismatch and should be treated as a deployment defect.
pub fn render(
    template: &str,
    substitutions: &[(&str, String)],
) -> Result<String, TemplateError> {
    // Locate every slot first so values are never part of the scan.
    let mut slots: Vec<(usize, usize, &str)> = Vec::with_capacity(substitutions.len());
    for (name, value) in substitutions {
        let token = format!("{{{{{name}}}}}");
        let pos = template
            .find(&token)
            .ok_or_else(|| TemplateError::PlaceholderNotFound((*name).to_string()))?;
        slots.push((pos, token.len(), value));
    }
    slots.sort_by_key(|(pos, _, _)| *pos);

    let mut out = String::with_capacity(template.len());
    let mut cursor = 0;
    for (pos, token_len, value) in slots {
        out.push_str(&template[cursor..pos]);
        out.push_str(value);
        cursor = pos + token_len;
    }
    out.push_str(&template[cursor..]);
    Ok(out)
}
