use std::fmt;

/// Per-run generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name registered for the document's own top-level type, if it has one.
    pub root_type: Option<String>,
    /// Go import path (last segment is the package clause) or TypeScript
    /// module name.
    pub output_module: String,
}

impl Config {
    pub fn new(output_module: impl Into<String>) -> Self {
        Self { root_type: None, output_module: output_module.into() }
    }

    pub fn with_root_type(mut self, name: impl Into<String>) -> Self {
        self.root_type = Some(name.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("schema")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Go,
    TypeScript,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Go => f.write_str("go"),
            Backend::TypeScript => f.write_str("typescript"),
        }
    }
}
