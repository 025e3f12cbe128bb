//! TypeScript backend.
//!
//! Validators live in a `$checkTable` keyed by type identifier. A reference
//! site dispatches to the referenced type's entry with the sub-value, so
//! failures inside it report a path relative to the referenced root.
use super::{enum_members, separate};
use crate::config::Config;
use crate::cursor::Cursor;
use crate::emit::reasons;
use crate::error::Result;
use crate::ir::TypeNode;
use crate::target::{quote, raw_arguments, FileParts, Helper, Scalar, Target};
use crate::writer::CodeWriter;

const HELPERS: &str = include_str!("runtime/helpers.ts");

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptTarget;

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl TypeScriptTarget {
    fn open_check(&self, out: &mut CodeWriter, ident: &str) {
        out.open(&format!("{}: function (main: any) {{", quote(ident)));
        out.line("if (main === undefined) return;");
    }
}

impl Target for TypeScriptTarget {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn indent_unit(&self) -> &'static str {
        "    "
    }

    fn declaration_prefix(&self, ident: &str, _node: &TypeNode) -> String {
        format!("export type {ident} = ")
    }

    fn declaration_suffix(&self) -> &'static str {
        ";"
    }

    // optionality is carried by the member key (`?:`), not the type

    fn write_null(&self, decl: &mut CodeWriter, _optional: bool) {
        decl.write("null");
    }

    fn write_scalar(&self, decl: &mut CodeWriter, scalar: Scalar, _optional: bool) {
        decl.write(match scalar {
            Scalar::Boolean => "boolean",
            Scalar::Integer | Scalar::Number => "number",
            Scalar::String => "string",
        });
    }

    fn open_sequence(&self, decl: &mut CodeWriter, _optional: bool) {
        decl.write("Array<");
    }

    fn close_sequence(&self, decl: &mut CodeWriter, _optional: bool) {
        decl.write(">");
    }

    fn open_record(&self, decl: &mut CodeWriter, _optional: bool) {
        decl.write("{");
        decl.newline();
        decl.indent();
    }

    fn close_record(&self, decl: &mut CodeWriter, _optional: bool) {
        decl.dedent();
        decl.write("}");
    }

    fn open_field(&self, decl: &mut CodeWriter, name: &str, optional: bool) {
        let mark = if optional { "?" } else { "" };
        decl.write(&format!("{}{mark}: ", quote(name)));
    }

    fn close_field(&self, decl: &mut CodeWriter, _name: &str, _optional: bool) {
        decl.write(";");
        decl.newline();
    }

    fn write_reference(&self, decl: &mut CodeWriter, ident: &str, _optional: bool) {
        decl.write(ident);
    }

    fn field_accessor(&self, name: &str) -> String {
        format!("[{}]", quote(name))
    }

    fn helper_name(&self, helper: Helper) -> &'static str {
        match helper {
            Helper::IntegerValidation => "integerValidation",
            Helper::NumberValidation => "numberValidation",
            Helper::StringValidation => "stringValidation",
            Helper::PatternValidation => "patternValidation",
            Helper::ArrayValidation => "arrayValidation",
            Helper::EnumValidation => "enumValidation",
        }
    }

    fn value_argument(&self, cursor: &Cursor, _scalar: Scalar, _optional: bool) -> String {
        cursor.expr()
    }

    fn present(&self, expr: &str) -> String {
        format!("isPresent({expr})")
    }

    fn member_present(&self, object: &Cursor, name: &str) -> String {
        format!("hasMember({}, {})", object.expr(), quote(name))
    }

    fn open_if(&self, condition: &str) -> String {
        format!("if ({condition}) {{")
    }

    fn open_loop(&self, expr: &str, var: &str) -> String {
        format!("for (let {var} = 0; {var} < {expr}.length; {var}++) {{")
    }

    fn failure(&self, reason: &str, cursor: &Cursor) -> String {
        let path = raw_arguments(self, cursor).join(", ");
        format!("throw new ValidationError({}, [{path}]);", quote(reason))
    }

    fn pattern_declaration(&self, ident: &str, pattern: &str) -> String {
        format!("const {ident} = new RegExp({});", quote(pattern))
    }

    fn validates_references_explicitly(&self) -> bool {
        true
    }

    fn reference_check(&self, validation: &mut CodeWriter, ident: &str, cursor: &Cursor) {
        validation.line(&format!("$checkTable[{}]?.({});", quote(ident), cursor.expr()));
    }

    fn render_enum(&self, file: &mut FileParts, ident: &str, values: &[String]) -> Result<()> {
        let members = enum_members(ident, values)?;
        let out = &mut file.declarations;
        separate(out);
        out.open(&format!("export enum {ident} {{"));
        for (member, value) in members.iter().zip(values) {
            let key = if is_identifier(member) { member.clone() } else { quote(member) };
            out.line(&format!("{key} = {},", quote(value)));
        }
        out.close("}");

        let literals = values.iter().map(|v| quote(v)).collect::<Vec<_>>();
        let check = format!("{}(main, [{}])", self.helper_name(Helper::EnumValidation), literals.join(", "));
        let checks = &mut file.checks;
        self.open_check(checks, ident);
        checks.open(&self.open_if(&format!("!{check}")));
        checks.line(&self.failure(reasons::ENUM, &Cursor::root(self.root_expr())));
        checks.close("}");
        checks.close("},");
        Ok(())
    }

    fn render_type(&self, file: &mut FileParts, ident: &str, decl: &str, validation: Option<&str>) {
        separate(&mut file.declarations);
        file.declarations.embed(decl);
        if let Some(validation) = validation {
            self.open_check(&mut file.checks, ident);
            file.checks.embed(validation);
            file.checks.close("},");
        }
    }

    fn assemble(&self, config: &Config, file: FileParts) -> String {
        let mut out = CodeWriter::new(self.indent_unit());
        out.line("// Code generated by schema-codegen. DO NOT EDIT.");
        out.line(&format!("// module: {}", config.output_module));
        out.newline();
        out.embed(HELPERS.trim_end());
        if !file.globals.is_empty() {
            out.newline();
            out.embed(file.globals.as_str());
        }
        if !file.declarations.is_empty() {
            out.newline();
            out.embed(file.declarations.as_str());
        }

        out.newline();
        out.open("const $checkTable: Record<string, ((main: any) => void) | undefined> = {");
        out.embed(file.checks.as_str());
        out.close("};");

        out.newline();
        out.open("export interface $typelist {");
        for ident in &file.exported {
            out.line(&format!("{}: {ident};", quote(ident)));
        }
        out.close("}");

        out.newline();
        out.open("export function decode<K extends keyof $typelist>(type: K, text: string): $typelist[K] {");
        out.line("const main = JSON.parse(text);");
        out.line("$checkTable[type]?.(main);");
        out.line("return main as $typelist[K];");
        out.close("}");
        out.finish()
    }
}
