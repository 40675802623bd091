//! Path templates: `/courses/{course_id}/assignments/{assignment_id}`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;

use crate::types::Params;
use crate::{LecternError, Result};

/// Bytes escaped inside one rendered path segment. `:` and `@` stay
/// readable, so `sis_course_id:ABC` renders as written.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Placeholder names in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            LecternError::Configuration(format!("unterminated placeholder in '{template}'"))
        })?;
        let name = after[..close].trim();
        if name.is_empty() {
            return Err(LecternError::Configuration(format!(
                "empty placeholder in '{template}'"
            )));
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after[close + 1..];
    }
    Ok(names)
}

/// Fill a template from `params`.
///
/// Returns the rendered path and the parameters the template did not
/// consume. A placeholder with no (or a null) value is reported as a
/// missing parameter of `action`.
pub fn render(template: &str, params: &Params, action: &str) -> Result<(String, Params)> {
    let names = placeholders(template)?;
    let missing: Vec<String> = names
        .iter()
        .filter(|n| params.get(n.as_str()).is_none_or(Value::is_null))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(LecternError::missing(action, missing));
    }

    let mut rendered = String::with_capacity(template.len());
    let mut rest = params.clone();
    let mut tail = template;
    while let Some(open) = tail.find('{') {
        rendered.push_str(&tail[..open]);
        let after = &tail[open + 1..];
        // placeholders() above already rejected unterminated braces
        let close = after.find('}').unwrap_or(after.len());
        let name = after[..close].trim();
        let value = params.get(name).unwrap_or(&Value::Null);
        let segment = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(LecternError::Configuration(format!(
                    "parameter '{name}' of '{action}' cannot be used in a path: {other}"
                )));
            }
        };
        rendered.extend(utf8_percent_encode(&segment, PATH_SEGMENT));
        rest.remove(name);
        tail = after.get(close + 1..).unwrap_or_default();
    }
    rendered.push_str(tail);
    Ok((rendered, rest))
}
