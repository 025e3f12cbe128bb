//! Constraint compilation.
//!
//! Every check has the shape `if NOT(predicate) { fail(reason) }` so the
//! reason strings form a stable taxonomy across generated files.
use tracing::trace;

use super::Emitter;
use crate::cursor::Cursor;
use crate::ir::{ArrayConstraints, Bound, NumericConstraints, StringConstraints};
use crate::target::{Helper, Scalar, Target};
use crate::writer::CodeWriter;

/// Failure reasons raised by generated validators.
pub mod reasons {
    pub const INTEGER: &str = "integer check failed";
    pub const NUMBER: &str = "number check failed";
    pub const STRING_LENGTH: &str = "string check length failed";
    pub const STRING_PATTERN: &str = "string check pattern failed";
    pub const ARRAY_PRESENT: &str = "array must have value";
    pub const ARRAY: &str = "array check failed";
    pub const MEMBER_REQUIRED: &str = "member cannot be undefined";
    pub const ENUM: &str = "wrong enum value";
}

impl<T: Target + ?Sized> Emitter<'_, T> {
    pub(super) fn check_numeric(
        &self,
        out: &mut CodeWriter,
        cursor: &Cursor,
        scalar: Scalar,
        constraints: &NumericConstraints,
        optional: bool,
    ) {
        let (helper, reason) = match scalar {
            Scalar::Integer => (Helper::IntegerValidation, reasons::INTEGER),
            _ => (Helper::NumberValidation, reasons::NUMBER),
        };
        let (min, has_min, ex_min) = bound_arguments(constraints.minimum);
        let (max, has_max, ex_max) = bound_arguments(constraints.maximum);
        let multiple = constraints.multiple_of.map(|m| m.0);
        let args = [
            min,
            max,
            has_min.to_string(),
            has_max.to_string(),
            ex_min.to_string(),
            ex_max.to_string(),
            number(multiple.unwrap_or(1.0)),
            multiple.is_some().to_string(),
            self.target.value_argument(cursor, scalar, optional),
        ];
        let call = self.call(helper, &args);
        self.fail_unless(out, &call, reason, cursor);
    }

    pub(super) fn check_string_length(
        &self,
        out: &mut CodeWriter,
        cursor: &Cursor,
        constraints: &StringConstraints,
        optional: bool,
    ) {
        let args = [
            number(constraints.min_length.unwrap_or(0) as f64),
            number(constraints.max_length.unwrap_or(0) as f64),
            constraints.min_length.is_some().to_string(),
            constraints.max_length.is_some().to_string(),
            self.target.value_argument(cursor, Scalar::String, optional),
        ];
        let call = self.call(Helper::StringValidation, &args);
        self.fail_unless(out, &call, reasons::STRING_LENGTH, cursor);
    }

    /// Registers the compiled pattern in the global buffer under the next
    /// counter value, then checks against it.
    pub(super) fn check_string_pattern(
        &mut self,
        out: &mut CodeWriter,
        cursor: &Cursor,
        pattern: &str,
        optional: bool,
    ) {
        let ident = format!("stringRegex{}", self.patterns);
        self.patterns += 1;
        trace!(ident = %ident, pattern, "compiled pattern");
        self.global.line(&self.target.pattern_declaration(&ident, pattern));

        let args = [ident, self.target.value_argument(cursor, Scalar::String, optional)];
        let call = self.call(Helper::PatternValidation, &args);
        self.fail_unless(out, &call, reasons::STRING_PATTERN, cursor);
    }

    pub(super) fn check_array(&self, out: &mut CodeWriter, cursor: &Cursor, constraints: &ArrayConstraints) {
        let args = [
            number(constraints.min_items.unwrap_or(0) as f64),
            number(constraints.max_items.unwrap_or(0) as f64),
            constraints.min_items.is_some().to_string(),
            constraints.max_items.is_some().to_string(),
            constraints.unique_items.to_string(),
            cursor.expr(),
        ];
        let call = self.call(Helper::ArrayValidation, &args);
        self.fail_unless(out, &call, reasons::ARRAY, cursor);
    }

    pub(super) fn fail_unless(&self, out: &mut CodeWriter, predicate: &str, reason: &str, cursor: &Cursor) {
        out.open(&self.target.open_if(&negate(predicate)));
        out.line(&self.target.failure(reason, cursor));
        self.target.close_block(out);
    }

    fn call(&self, helper: Helper, args: &[String]) -> String {
        format!("{}({})", self.target.helper_name(helper), args.join(", "))
    }
}

fn bound_arguments(bound: Option<Bound>) -> (String, bool, bool) {
    match bound {
        Some(Bound { value, exclusive }) => (number(value.0), true, exclusive),
        None => (number(0.0), false, false),
    }
}

/// Numeric literal shared by Go and TypeScript.
fn number(value: f64) -> String {
    format!("{value}")
}

/// `!pred`, parenthesized when `pred` has top-level whitespace.
pub(crate) fn negate(predicate: &str) -> String {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut bare = true;
    for c in predicate.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                bare = false;
                break;
            }
            _ => {}
        }
    }
    if bare { format!("!{predicate}") } else { format!("!({predicate})") }
}
