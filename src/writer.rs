//! Indentation-aware text buffer shared by the emitter and the backends.

#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    tab: &'static str,
    depth: usize,
    at_line_start: bool,
}

impl CodeWriter {
    pub fn new(tab: &'static str) -> Self {
        Self { buf: String::new(), tab, depth: 0, at_line_start: true }
    }

    /// Append text to the current line, indenting first if the line is fresh.
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.depth {
                self.buf.push_str(self.tab);
            }
            self.at_line_start = false;
        }
        self.buf.push_str(text);
    }

    pub fn newline(&mut self) {
        self.buf.push('\n');
        self.at_line_start = true;
    }

    pub fn line(&mut self, text: &str) {
        self.write(text);
        self.newline();
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// `line` then `indent`: the header of a block.
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.indent();
    }

    /// `dedent` then `line`: the end of a block.
    pub fn close(&mut self, text: &str) {
        self.dedent();
        self.line(text);
    }

    /// Re-indent a block of already formatted lines at the current depth.
    pub fn embed(&mut self, text: &str) {
        for line in text.lines() {
            if line.is_empty() {
                self.newline();
            } else {
                self.line(line);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
