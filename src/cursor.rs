//! Paired expression/raw location used while descending a type.
use std::fmt;

use crate::target::Target;

/// One step of the raw path: a schema-literal member name or a loop variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSegment {
    Key(String),
    Index(String),
}

/// Immutable descent cursor.
///
/// `expr` holds target-language accessors appended to the root expression,
/// `raw` the schema-literal segments used for presence probes and failure
/// locations. Every descent pushes exactly one segment onto each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    root: String,
    expr: Vec<String>,
    raw: Vec<RawSegment>,
    depth: usize, // array nesting, numbers loop variables
}

impl Cursor {
    pub fn root(name: impl Into<String>) -> Self {
        Self { root: name.into(), expr: Vec::new(), raw: Vec::new(), depth: 0 }
    }

    /// Descend into an object member.
    pub fn field<T: Target + ?Sized>(&self, target: &T, name: &str) -> Self {
        let mut next = self.clone();
        next.expr.push(target.field_accessor(name));
        next.raw.push(RawSegment::Key(name.to_string()));
        next
    }

    /// Descend into the element of an array, indexed by [`Cursor::loop_var`].
    pub fn element<T: Target + ?Sized>(&self, target: &T) -> Self {
        let var = self.loop_var();
        let mut next = self.clone();
        next.expr.push(target.index_accessor(&var));
        next.raw.push(RawSegment::Index(var));
        next.depth += 1;
        next
    }

    /// Loop variable the next [`Cursor::element`] descent will index with.
    pub fn loop_var(&self) -> String {
        format!("i{}", self.depth)
    }

    pub fn expr(&self) -> String {
        let mut out = self.root.clone();
        for segment in &self.expr {
            out.push_str(segment);
        }
        out
    }

    pub fn raw(&self) -> &[RawSegment] {
        &self.raw
    }

    pub fn is_root(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.expr.len(), self.raw.len());
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.raw {
            match segment {
                RawSegment::Key(key) => write!(f, "[{}]", serde_json::Value::from(key.as_str()))?,
                RawSegment::Index(var) => write!(f, "[{var}]")?,
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GoTarget, TypeScriptTarget};
    use proptest::prelude::*;

    #[test]
    fn go_paths_use_rendered_field_names() {
        let target = GoTarget;
        let cursor = Cursor::root("main").field(&target, "user-tags").element(&target);
        assert_eq!(cursor.expr(), "main.User_tags[i0]");
        assert_eq!(
            cursor.raw(),
            &[RawSegment::Key("user-tags".into()), RawSegment::Index("i0".into())]
        );
        assert_eq!(cursor.to_string(), r#"["user-tags"][i0]"#);
    }

    #[test]
    fn typescript_paths_use_quoted_member_names() {
        let target = TypeScriptTarget;
        let cursor = Cursor::root("main").field(&target, "user-tags");
        assert_eq!(cursor.expr(), r#"main["user-tags"]"#);
    }

    #[test]
    fn nested_loops_get_distinct_variables() {
        let target = GoTarget;
        let outer = Cursor::root("main").element(&target);
        let inner = outer.element(&target);
        assert_eq!(inner.expr(), "main[i0][i1]");
        assert_eq!(inner.loop_var(), "i2");
    }

    #[test]
    fn descending_leaves_the_parent_untouched() {
        let target = GoTarget;
        let parent = Cursor::root("main");
        let _child = parent.field(&target, "a");
        assert!(parent.is_root());
        assert_eq!(parent.expr(), "main");
    }

    #[derive(Debug, Clone)]
    enum Step {
        Field(String),
        Element,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            "[a-z][a-z-]{0,8}".prop_map(Step::Field),
            Just(Step::Element),
        ]
    }

    proptest! {
        #[test]
        fn expression_and_raw_paths_stay_in_lockstep(steps in proptest::collection::vec(step(), 0..12)) {
            let target = TypeScriptTarget;
            let mut cursor = Cursor::root("main");
            for (n, step) in steps.iter().enumerate() {
                cursor = match step {
                    Step::Field(name) => cursor.field(&target, name),
                    Step::Element => cursor.element(&target),
                };
                prop_assert_eq!(cursor.len(), n + 1);
                prop_assert_eq!(cursor.expr.len(), cursor.raw.len());
            }
            let loops = steps.iter().filter(|s| matches!(s, Step::Element)).count();
            prop_assert_eq!(cursor.loop_var(), format!("i{loops}"));
        }
    }
}
