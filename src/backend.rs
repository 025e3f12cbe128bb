//! Target-language backends.
mod go;
mod typescript;

use std::collections::BTreeSet;

pub use go::GoTarget;
pub use typescript::TypeScriptTarget;

use crate::config::Backend;
use crate::error::{GenerateError, Result};
use crate::naming::render_name;
use crate::target::Target;
use crate::writer::CodeWriter;

impl Backend {
    pub fn target(self) -> &'static dyn Target {
        match self {
            Backend::Go => &GoTarget,
            Backend::TypeScript => &TypeScriptTarget,
        }
    }
}

/// Blank line between top-level items.
fn separate(out: &mut CodeWriter) {
    if !out.is_empty() {
        out.newline();
    }
}

/// Rendered member names of an enum, rejecting literals that collide.
fn enum_members(ident: &str, values: &[String]) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .map(|value| {
            let member = render_name(value);
            if !seen.insert(member.clone()) {
                return Err(GenerateError::DuplicateDefinition(format!("{ident}.{member} (enum value {value:?})")));
            }
            Ok(member)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_enum_literals_are_rejected() {
        let values = vec!["dark-red".to_string(), "dark_red".to_string()];
        let err = enum_members("Color", &values).unwrap_err();
        assert!(matches!(err, GenerateError::DuplicateDefinition(ref m) if m.starts_with("Color.Dark_red")), "{err}");
        assert_eq!(enum_members("Color", &values[..1]).unwrap(), vec!["Dark_red".to_string()]);
    }

    #[test]
    fn backends_are_selected_by_name() {
        assert_eq!(Backend::Go.target().name(), "go");
        assert_eq!(Backend::TypeScript.target().name(), "typescript");
    }
}
