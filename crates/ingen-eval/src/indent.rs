//! The indentation control machine.
//!
//! Template text carries the indentation of the template source, which is
//! nested one level deeper for every block form wrapping it. This writer
//! rewrites the leading whitespace of every output line so the generated
//! file reflects the logical structure instead:
//!
//! - `tabs_to_remove` counts the indent levels to strip from the literal
//!   leading whitespace of each line (one per enclosing block form).
//! - `tabs_to_add` counts the indent levels to prepend to each line
//!   (`begin_tab` blocks and procedure-captured state).
//!
//! Leading whitespace is not written eagerly: whole-whitespace text runs
//! are queued as tab equivalents and only reconciled against the removal
//! deficit once a fragment with real content arrives on the line. After
//! the first commit on a line, adjustment is switched off until the next
//! newline.

use std::io::{self, Write};

use ingen_data::TabState;

/// Output writer with per-line indentation rewriting.
pub struct IndentWriter<W: Write> {
    out: W,

    /// Columns per indent level.
    pub tab_size: i32,
    /// Emit spaces instead of tab characters.
    pub use_spaces: bool,

    /// Indent levels to prepend to every line.
    pub tabs_to_add: i32,
    /// Indent levels to strip from every line's literal whitespace.
    pub tabs_to_remove: i32,

    /// Levels already prepended on the current line.
    tabs_added: i32,
    /// Levels already stripped on the current line.
    tabs_removed: i32,
    /// Whole-whitespace runs seen at the start of the line, held back
    /// until actual text follows.
    queued_tabs: i32,
    /// Latched at the start of each line, cleared once content commits.
    adjusting: bool,
}

impl<W: Write> IndentWriter<W> {
    /// Creates a writer with the default four-column space indentation.
    pub fn new(out: W) -> Self {
        Self {
            out,
            tab_size: 4,
            use_spaces: true,
            tabs_to_add: 0,
            tabs_to_remove: 0,
            tabs_added: 0,
            tabs_removed: 0,
            queued_tabs: 0,
            adjusting: true,
        }
    }

    /// Measures a text run in tab equivalents: a tab counts as one
    /// level, `tab_size` spaces count as one level. Returns 0 if the
    /// run contains anything but tabs and spaces (or too little
    /// whitespace to make a level), in which case the run is committed
    /// as text instead of queued.
    pub fn tab_equivalents(&self, text: &str) -> i32 {
        let mut tabs = 0;
        let mut spaces = 0;
        for b in text.bytes() {
            match b {
                b'\t' => tabs += 1,
                b' ' => spaces += 1,
                _ => return 0,
            }
        }
        tabs + spaces / self.tab_size
    }

    /// Holds back leading whitespace measured by
    /// [`tab_equivalents`](Self::tab_equivalents).
    pub fn queue_tabs(&mut self, count: i32) {
        self.queued_tabs += count;
    }

    /// Ends the current line: resets the per-line counters and emits a
    /// newline unless `suppress` is set.
    pub fn newline(&mut self, suppress: bool) -> io::Result<()> {
        self.begin_line();
        if !suppress {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Re-latches adjustment at a line boundary.
    pub fn begin_line(&mut self) {
        self.tabs_removed = 0;
        self.tabs_added = 0;
        self.queued_tabs = 0;
        self.adjusting = true;
    }

    /// Re-latches adjustment without ending the line. Used by
    /// `ignore_new_line`, which joins two source lines but still wants
    /// the next line's leading whitespace reconciled. `tabs_added` is
    /// deliberately kept, the prefix of the joined line already carries
    /// the added indent.
    pub fn begin_line_joined(&mut self) {
        self.tabs_removed = 0;
        self.queued_tabs = 0;
        self.adjusting = true;
    }

    /// Adds the captured deltas of a procedure around its call.
    pub fn add_deltas(&mut self, tabs: TabState) {
        self.tabs_to_add += tabs.to_add;
        self.tabs_to_remove += tabs.to_remove;
    }

    /// Removes deltas added by [`add_deltas`](Self::add_deltas).
    pub fn remove_deltas(&mut self, tabs: TabState) {
        self.tabs_to_add -= tabs.to_add;
        self.tabs_to_remove -= tabs.to_remove;
    }

    /// The captured state a `define` stores on its procedure.
    pub fn capture_for_define(&self) -> TabState {
        TabState {
            to_add: self.tabs_to_add,
            // The procedure body sits one block level deeper than the
            // define itself.
            to_remove: self.tabs_to_remove + 1,
        }
    }

    /// Commits a text fragment, applying indentation adjustment if this
    /// is the first content on the line.
    pub fn commit(&mut self, text: &str) -> io::Result<()> {
        let mut rest = text;

        if self.adjusting {
            if self.queued_tabs != 0 {
                let pending = self.tabs_to_remove - self.tabs_removed;
                if self.queued_tabs == pending {
                    self.queued_tabs = 0;
                    self.tabs_removed = self.tabs_to_remove;
                } else if self.queued_tabs < pending {
                    self.tabs_removed += self.queued_tabs;
                    self.queued_tabs = 0;
                } else {
                    self.queued_tabs -= pending;
                    self.tabs_removed = self.tabs_to_remove;
                    let excess = self.queued_tabs;
                    self.add_tabs(excess)?;
                    self.queued_tabs = 0;
                }
            }

            if self.tabs_added != self.tabs_to_add {
                let missing = self.tabs_to_add - self.tabs_added;
                self.add_tabs(missing)?;
            }

            while self.tabs_removed < self.tabs_to_remove {
                if let Some(stripped) = rest.strip_prefix('\t') {
                    rest = stripped;
                    self.tabs_removed += 1;
                } else if rest.len() >= self.tab_size as usize
                    && rest.as_bytes()[..self.tab_size as usize]
                        .iter()
                        .all(|&b| b == b' ')
                {
                    rest = &rest[self.tab_size as usize..];
                    self.tabs_removed += 1;
                } else {
                    break;
                }
            }

            self.adjusting = false;
        }

        self.write_expanded(rest)
    }

    /// Emits `count` indent levels (`count * tab_size` characters). A
    /// non-positive count emits nothing but still moves the counter, so
    /// delta changes mid-line stay consistent.
    fn add_tabs(&mut self, count: i32) -> io::Result<()> {
        let fill = if self.use_spaces { b' ' } else { b'\t' };
        for _ in 0..count.max(0) * self.tab_size {
            self.out.write_all(&[fill])?;
        }
        self.tabs_added += count;
        Ok(())
    }

    fn write_expanded(&mut self, text: &str) -> io::Result<()> {
        if self.use_spaces {
            for b in text.bytes() {
                if b == b'\t' {
                    for _ in 0..self.tab_size {
                        self.out.write_all(b" ")?;
                    }
                } else {
                    self.out.write_all(&[b])?;
                }
            }
            Ok(())
        } else {
            self.out.write_all(text.as_bytes())
        }
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
