//! Debug formatting for section trees.

use std::fmt::{self, Write};

use horizon_strata_core::{TreeFormatOptions, TreeStyle};

use crate::node::Node;
use crate::section::Section;

/// Formats a section tree as an indented outline.
///
/// ```text
/// Tree (1 section)
/// └── Section "inbox" [2 cells]
///     ├── header: "title" (Title)
///     ├── 0: 17 (Message)
///     └── 1: 18 (Message)
/// ```
pub struct TreeDebug<'a> {
    sections: &'a [Section],
    options: TreeFormatOptions,
}

impl<'a> TreeDebug<'a> {
    /// Creates a formatter with default options.
    pub fn new(sections: &'a [Section]) -> Self {
        Self {
            sections,
            options: TreeFormatOptions::default(),
        }
    }

    /// Sets the formatting options.
    pub fn with_options(mut self, options: TreeFormatOptions) -> Self {
        self.options = options;
        self
    }

    fn connector(&self, is_last: bool) -> &'static str {
        let (_, branch, corner) = self.options.style.glyphs();
        if is_last { corner } else { branch }
    }

    fn continuation(&self, is_last: bool) -> String {
        let (vertical, _, _) = self.options.style.glyphs();
        let mut prefix = String::new();
        if !is_last {
            prefix.push_str(vertical);
        }
        let width = if is_last || self.options.style == TreeStyle::Compact {
            self.options.indent_size + vertical.chars().count()
        } else {
            self.options.indent_size
        };
        prefix.push_str(&" ".repeat(width));
        prefix
    }

    fn write_node(&self, f: &mut dyn Write, label: &str, node: &Node) -> fmt::Result {
        f.write_str(label)?;
        if self.options.show_ids {
            write!(f, " {:?}", node.id())?;
        }
        if self.options.show_types {
            let type_name = node.component().type_name();
            let short = type_name.rsplit("::").next().unwrap_or(type_name);
            write!(f, " ({short})")?;
        }
        Ok(())
    }

    fn write_section(&self, f: &mut dyn Write, section: &Section, is_last: bool) -> fmt::Result {
        write!(f, "{} Section", self.connector(is_last))?;
        if self.options.show_ids {
            write!(f, " {:?}", section.id())?;
        }
        let count = section.cell_count();
        writeln!(f, " [{} cell{}]", count, if count == 1 { "" } else { "s" })?;

        let prefix = self.continuation(is_last);
        let mut slots: Vec<(String, &Node)> = Vec::with_capacity(count + 2);
        if let Some(header) = section.header() {
            slots.push(("header:".to_string(), header));
        }
        for (row, node) in section.cells().iter().enumerate() {
            slots.push((format!("{row}:"), node));
        }
        if let Some(footer) = section.footer() {
            slots.push(("footer:".to_string(), footer));
        }

        let total = slots.len();
        for (index, (label, node)) in slots.into_iter().enumerate() {
            write!(f, "{}{} ", prefix, self.connector(index + 1 == total))?;
            self.write_node(f, &label, node)?;
            f.write_char('\n')?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.sections.len();
        writeln!(f, "Tree ({} section{})", total, if total == 1 { "" } else { "s" })?;

        let shown = self.options.max_sections.unwrap_or(total).min(total);
        for (index, section) in self.sections.iter().take(shown).enumerate() {
            let is_last = index + 1 == shown && shown == total;
            self.write_section(f, section, is_last)?;
        }
        if shown < total {
            writeln!(
                f,
                "{} ... {} more section{}",
                self.connector(true),
                total - shown,
                if total - shown == 1 { "" } else { "s" }
            )?;
        }
        Ok(())
    }
}
