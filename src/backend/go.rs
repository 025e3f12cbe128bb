//! Go backend.
//!
//! References are validated transitively: `encoding/json` calls the referenced
//! type's own `UnmarshalJSON`, so a failure inside a referenced type reports a
//! path relative to that type's root.
use super::{enum_members, separate};
use crate::config::Config;
use crate::cursor::Cursor;
use crate::emit::reasons;
use crate::error::Result;
use crate::ir::TypeNode;
use crate::naming::render_name;
use crate::target::{quote, raw_arguments, FileParts, Helper, Scalar, Target};
use crate::writer::CodeWriter;

const HELPERS: &str = include_str!("runtime/helpers.go");

const IMPORTS: [&str; 5] = ["encoding/json", "fmt", "math", "reflect", "regexp"];

#[derive(Debug, Clone, Copy, Default)]
pub struct GoTarget;

fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Boolean => "bool",
        Scalar::Integer => "int",
        Scalar::Number => "float64",
        Scalar::String => "string",
    }
}

/// Package clause from an import path: its last segment as an identifier.
fn package_name(module: &str) -> String {
    let last = module.rsplit('/').next().unwrap_or(module);
    let name = last.replace(['-', '.'], "_");
    if name.is_empty() { "schema".to_string() } else { name }
}

impl Target for GoTarget {
    fn name(&self) -> &'static str {
        "go"
    }

    fn indent_unit(&self) -> &'static str {
        "\t"
    }

    fn declaration_prefix(&self, ident: &str, node: &TypeNode) -> String {
        // an alias keeps the referenced type's UnmarshalJSON
        match node {
            TypeNode::Reference(_) => format!("type {ident} = "),
            _ => format!("type {ident} "),
        }
    }

    fn declaration_suffix(&self) -> &'static str {
        ""
    }

    fn write_null(&self, decl: &mut CodeWriter, optional: bool) {
        decl.write(if optional { "*null" } else { "null" });
    }

    fn write_scalar(&self, decl: &mut CodeWriter, scalar: Scalar, optional: bool) {
        if optional {
            decl.write("*");
        }
        decl.write(scalar_type(scalar));
    }

    fn open_sequence(&self, decl: &mut CodeWriter, _optional: bool) {
        // slices are already nil-able
        decl.write("[]");
    }

    fn close_sequence(&self, _decl: &mut CodeWriter, _optional: bool) {}

    fn open_record(&self, decl: &mut CodeWriter, optional: bool) {
        decl.write(if optional { "*struct {" } else { "struct {" });
        decl.newline();
        decl.indent();
    }

    fn close_record(&self, decl: &mut CodeWriter, _optional: bool) {
        decl.dedent();
        decl.write("}");
    }

    fn open_field(&self, decl: &mut CodeWriter, name: &str, _optional: bool) {
        decl.write(&render_name(name));
        decl.write(" ");
    }

    fn close_field(&self, decl: &mut CodeWriter, name: &str, optional: bool) {
        let omit = if optional { ",omitempty" } else { "" };
        decl.write(&format!(" `json:\"{name}{omit}\"`"));
        decl.newline();
    }

    fn write_reference(&self, decl: &mut CodeWriter, ident: &str, optional: bool) {
        if optional {
            decl.write("*");
        }
        decl.write(ident);
    }

    fn field_accessor(&self, name: &str) -> String {
        format!(".{}", render_name(name))
    }

    fn helper_name(&self, helper: Helper) -> &'static str {
        match helper {
            Helper::IntegerValidation => "IntegerValidation",
            Helper::NumberValidation => "NumberValidation",
            Helper::StringValidation => "StringValidation",
            Helper::PatternValidation => "PatternValidation",
            Helper::ArrayValidation => "ArrayValidation",
            Helper::EnumValidation => "EnumValidation",
        }
    }

    fn value_argument(&self, cursor: &Cursor, scalar: Scalar, optional: bool) -> String {
        let expr = cursor.expr();
        if optional {
            // already a pointer
            expr
        } else if cursor.is_root() {
            // `main` has the named `internal` type
            format!("(*{})(&{expr})", scalar_type(scalar))
        } else {
            format!("&{expr}")
        }
    }

    fn present(&self, expr: &str) -> String {
        format!("{expr} != nil")
    }

    fn member_present(&self, object: &Cursor, name: &str) -> String {
        let mut args = vec!["raw".to_string()];
        args.extend(raw_arguments(self, object));
        args.push(quote(name));
        format!("rawHas({})", args.join(", "))
    }

    fn open_if(&self, condition: &str) -> String {
        format!("if {condition} {{")
    }

    fn open_loop(&self, expr: &str, var: &str) -> String {
        format!("for {var} := range {expr} {{")
    }

    fn failure(&self, reason: &str, cursor: &Cursor) -> String {
        let mut args = vec![quote(reason)];
        args.extend(raw_arguments(self, cursor));
        format!("return validationError({})", args.join(", "))
    }

    fn pattern_declaration(&self, ident: &str, pattern: &str) -> String {
        format!("var {ident} = regexp.MustCompile({})", quote(pattern))
    }

    fn reference_check(&self, _validation: &mut CodeWriter, _ident: &str, _cursor: &Cursor) {}

    fn render_enum(&self, file: &mut FileParts, ident: &str, values: &[String]) -> Result<()> {
        let members = enum_members(ident, values)?;
        let out = &mut file.declarations;
        separate(out);
        out.line(&format!("type {ident} string"));
        out.newline();
        out.open("const (");
        for (member, value) in members.iter().zip(values) {
            out.line(&format!("{ident}{member} {ident} = {}", quote(value)));
        }
        out.close(")");
        out.newline();
        let literals = values.iter().map(|v| quote(v)).collect::<Vec<_>>();
        out.line(&format!("var enumValues{ident} = []string{{{}}}", literals.join(", ")));
        out.newline();

        let main = Cursor::root(self.root_expr());
        out.open(&format!("func (object *{ident}) UnmarshalJSON(buffer []byte) error {{"));
        out.line("var main string");
        out.open("if err := json.Unmarshal(buffer, &main); err != nil {");
        out.line("return err");
        out.close("}");
        let check = format!("{}(&main, enumValues{ident})", self.helper_name(Helper::EnumValidation));
        out.open(&self.open_if(&format!("!{check}")));
        out.line(&self.failure(reasons::ENUM, &main));
        out.close("}");
        out.line(&format!("*object = {ident}(main)"));
        out.line("return nil");
        out.close("}");
        Ok(())
    }

    fn render_type(&self, file: &mut FileParts, ident: &str, decl: &str, validation: Option<&str>) {
        let out = &mut file.declarations;
        separate(out);
        out.embed(decl);
        let Some(validation) = validation else {
            return;
        };
        out.newline();
        out.open(&format!("func (object *{ident}) UnmarshalJSON(buffer []byte) error {{"));
        out.line("raw, err := decodeRaw(buffer)");
        out.open("if err != nil {");
        out.line("return err");
        out.close("}");
        out.line("_ = raw");
        out.line(&format!("type internal {ident}"));
        out.line("var main internal");
        out.open("if err := json.Unmarshal(buffer, &main); err != nil {");
        out.line("return err");
        out.close("}");
        out.embed(validation);
        out.line(&format!("*object = {ident}(main)"));
        out.line("return nil");
        out.close("}");
    }

    fn assemble(&self, config: &Config, file: FileParts) -> String {
        let mut out = CodeWriter::new(self.indent_unit());
        out.line("// Code generated by schema-codegen. DO NOT EDIT.");
        out.newline();
        out.line(&format!("package {}", package_name(&config.output_module)));
        out.newline();
        out.open("import (");
        for import in IMPORTS {
            out.line(&quote(import));
        }
        out.close(")");
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
        out.finish()
    }
}
