//! File assembly: walks every flattened type through the emitter and hands
//! the buffers to the backend.
use crate::config::Config;
use crate::emit::Emitter;
use crate::error::Result;
use crate::flatten::TypeTable;
use crate::ir::TypeNode;
use crate::target::{FileParts, Target};
use crate::writer::CodeWriter;

pub fn render<T: Target + ?Sized>(table: &TypeTable, config: &Config, target: &T) -> Result<String> {
    let tab = target.indent_unit();
    let mut emitter = Emitter::new(target, table)?;
    let mut file = FileParts::new(tab);

    // `iter` is sorted by name, which keeps output byte-stable
    for (name, entry) in table.iter() {
        file.exported.push(entry.ident.clone());
        if let TypeNode::Enum(values) = &entry.node {
            target.render_enum(&mut file, &entry.ident, values)?;
            continue;
        }

        let mut decl = CodeWriter::new(tab);
        let mut validation = CodeWriter::new(tab);
        decl.write(&target.declaration_prefix(&entry.ident, &entry.node));
        let ignorable = emitter.emit_root(name, &entry.node, &mut decl, &mut validation)?;
        decl.write(target.declaration_suffix());
        decl.newline();

        let validation = (!ignorable).then(|| validation.finish());
        target.render_type(&mut file, &entry.ident, decl.as_str(), validation.as_deref());
    }

    file.globals = emitter.into_globals();
    Ok(target.assemble(config, file))
}
