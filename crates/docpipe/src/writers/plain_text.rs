//! Plain-text writer.
//!
//! Line-oriented rendering with a configurable end-of-line sequence and link
//! formatting callbacks. Lists number their items (`1. `, `2. ` for decimal,
//! `* ` for disc, the list-type string otherwise). Tables are rendered by
//! buffering every cell, computing the maximum column width and per-row
//! height, then padding with spaces; each cell is itself a miniature
//! plain-text rendering of its content, and nested tables recurse through a
//! child writer whose output becomes the enclosing cell's text. Footers are
//! buffered and appended after all body content. Nested documents are
//! coalesced: only the outermost close emits the trailing content.

use super::Writer;
use crate::error::{PipelineError, Result};
use crate::message::{Comment, Link, Message};
use crate::metadata::CivilDateTime;
use std::sync::Arc;

/// Callbacks deciding how links render in plain text.
#[derive(Clone)]
pub struct LinkFormatter {
    pub format_opening: Arc<dyn Fn(&Link) -> String + Send + Sync>,
    pub format_closing: Arc<dyn Fn() -> String + Send + Sync>,
}

impl Default for LinkFormatter {
    fn default() -> Self {
        Self {
            format_opening: Arc::new(|link| {
                link.url.as_ref().map(|url| format!("<{url}>")).unwrap_or_default()
            }),
            format_closing: Arc::new(String::new),
        }
    }
}

/// One table cell being accumulated: a child writer plus the rendered text
/// split into lines for the grid layout.
struct Cell {
    writer: PlainTextWriter,
    result: String,
    lines: Vec<String>,
}

impl Cell {
    fn new(eol: &str, link_formatter: LinkFormatter) -> Self {
        Self {
            writer: PlainTextWriter::with_link_formatter(eol, link_formatter),
            result: String::new(),
            lines: Vec::new(),
        }
    }

    fn write_str(&mut self, text: &str, eol: &str) {
        self.result.push_str(text);
        self.lines.clear();
        let mut prev = 0;
        while let Some(pos) = self.result[prev..].find(eol) {
            self.lines.push(self.result[prev..prev + pos].to_string());
            prev += pos + eol.len();
        }
        if prev < self.result.len() {
            self.lines.push(self.result[prev..].to_string());
        }
    }

    fn write_message(&mut self, message: &Message, eol: &str) -> Result<()> {
        let mut rendered = String::new();
        self.writer.write_to(message, &mut rendered)?;
        self.write_str(&rendered, eol);
        Ok(())
    }

    fn width(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
    }

    fn height(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> &str {
        self.lines.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Folds structural events into plain text.
pub struct PlainTextWriter {
    eol: String,
    link_formatter: LinkFormatter,
    /// Table nesting depth; events are buffered while inside a table.
    level: usize,
    buffered: Vec<Message>,
    list_type: String,
    list_counter: usize,
    list_mode: bool,
    footer_mode: bool,
    footer: String,
    nested_docs: usize,
}

impl PlainTextWriter {
    pub fn new(eol: impl Into<String>) -> Self {
        Self::with_link_formatter(eol, LinkFormatter::default())
    }

    pub fn with_link_formatter(eol: impl Into<String>, link_formatter: LinkFormatter) -> Self {
        Self {
            eol: eol.into(),
            link_formatter,
            level: 0,
            buffered: Vec::new(),
            list_type: String::new(),
            list_counter: 1,
            list_mode: false,
            footer_mode: false,
            footer: String::new(),
            nested_docs: 0,
        }
    }

    pub fn eol_sequence(&self) -> &str {
        &self.eol
    }

    fn child_writer(&self) -> PlainTextWriter {
        PlainTextWriter::with_link_formatter(&self.eol, self.link_formatter.clone())
    }

    /// Append rendered text to the body, or to the footer buffer while a
    /// footer is open.
    fn push(&mut self, out: &mut String, text: &str) {
        if self.footer_mode {
            self.footer.push_str(text);
        } else {
            out.push_str(text);
        }
    }

    fn timestamp_to_string(timestamp: i64) -> String {
        match CivilDateTime::from_unix_timestamp(timestamp) {
            Some(date) => {
                let (hour12, meridiem) = match date.hour {
                    0 => (12, "AM"),
                    1..=11 => (date.hour, "AM"),
                    12 => (12, "PM"),
                    _ => (date.hour - 12, "PM"),
                };
                format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02} {}",
                    date.year, date.month, date.day, hour12, date.minute, date.second, meridiem
                )
            }
            None => timestamp.to_string(),
        }
    }

    fn render_list_item(&self) -> String {
        match self.list_type.as_str() {
            "none" => String::new(),
            "decimal" => format!("{}. ", self.list_counter),
            "disc" => "* ".to_string(),
            other => other.to_string(),
        }
    }

    fn render_comment(&self, comment: &Comment) -> String {
        let mut text = format!("{}[[[", self.eol);
        if let Some(author) = &comment.author {
            text.push_str("COMMENT BY ");
            text.push_str(author);
        }
        if let Some(time) = &comment.time {
            text.push_str(&format!(" ({time})"));
        }
        text.push_str("]]]");
        text.push_str(&self.eol);
        if let Some(body) = &comment.body {
            text.push_str(body);
            if body.is_empty() || !body.ends_with('\n') {
                text.push_str(&self.eol);
            }
        }
        text.push_str("[[[---]]]");
        text.push_str(&self.eol);
        text
    }

    /// Render the buffered table events into a padded grid.
    fn render_buffered_table(&mut self) -> Result<String> {
        let buffered = std::mem::take(&mut self.buffered);
        let mut table: Vec<Vec<Cell>> = Vec::new();
        let mut index = 0;
        while index < buffered.len() {
            match &buffered[index] {
                Message::Table => {
                    // A nested table renders through a fresh child writer; its
                    // output becomes text of the current cell.
                    let mut child = self.child_writer();
                    let mut rendered = String::new();
                    child.write_to(&buffered[index], &mut rendered)?;
                    let mut open = 1;
                    while open > 0 {
                        index += 1;
                        let Some(message) = buffered.get(index) else {
                            return Err(PipelineError::uninterpretable_data(
                                "Table inside table is not closed",
                            ));
                        };
                        child.write_to(message, &mut rendered)?;
                        match message {
                            Message::Table => open += 1,
                            Message::CloseTable => open -= 1,
                            _ => {}
                        }
                    }
                    let row = table.last_mut().ok_or_else(|| {
                        PipelineError::uninterpretable_data("Table inside table without rows")
                    })?;
                    let eol = self.eol.clone();
                    let cell = row.last_mut().ok_or_else(|| {
                        PipelineError::uninterpretable_data("Table inside table row without cells")
                    })?;
                    cell.write_str(&rendered, &eol);
                }
                Message::TableRow => table.push(Vec::new()),
                Message::TableCell => {
                    let cell = Cell::new(&self.eol, self.link_formatter.clone());
                    let row = table.last_mut().ok_or_else(|| {
                        PipelineError::uninterpretable_data("Cell inside table without rows")
                    })?;
                    row.push(cell);
                }
                Message::CloseTableRow | Message::CloseTableCell => {}
                other => {
                    let row = table.last_mut().ok_or_else(|| {
                        PipelineError::uninterpretable_data("Cell content inside table without rows")
                    })?;
                    let eol = self.eol.clone();
                    let cell = row.last_mut().ok_or_else(|| {
                        PipelineError::uninterpretable_data(
                            "Cell content inside table row without cells",
                        )
                    })?;
                    cell.write_message(other, &eol)?;
                }
            }
            index += 1;
        }
        Ok(self.render_grid(&table))
    }

    fn render_grid(&self, table: &[Vec<Cell>]) -> String {
        let mut max_column_width = 0;
        for row in table {
            for cell in row {
                max_column_width = max_column_width.max(cell.width());
            }
        }

        let mut result = String::new();
        for row in table {
            // Rows with no or only empty cells still produce one visible line.
            let max_row_height = row.iter().map(Cell::height).max().unwrap_or(0).max(1);
            for line_index in 0..max_row_height {
                for (column, cell) in row.iter().enumerate() {
                    let line = cell.line(line_index);
                    result.push_str(line);
                    let padding = max_column_width - line.chars().count();
                    let right_margin = if column < row.len() - 1 { 2 } else { 0 };
                    for _ in 0..padding + right_margin {
                        result.push(' ');
                    }
                }
                result.push_str(&self.eol);
            }
        }
        result
    }
}

impl Writer for PlainTextWriter {
    fn write_to(&mut self, message: &Message, out: &mut String) -> Result<()> {
        if matches!(message, Message::CloseTable) && self.level > 0 {
            self.level -= 1;
            if self.level == 0 {
                let rendered = self.render_buffered_table()?;
                self.push(out, &rendered);
                return Ok(());
            }
        }
        if self.level > 0 {
            self.buffered.push(message.clone());
        }
        if matches!(message, Message::Table) {
            self.level += 1;
        }
        if self.level > 0 {
            return Ok(());
        }

        let text = match message {
            Message::Mail(mail) => {
                let mut text = "\t".repeat(mail.level.unwrap_or(0));
                text.push_str("mail: ");
                if let Some(subject) = &mail.subject {
                    text.push_str(subject);
                }
                if let Some(date) = mail.date {
                    text.push_str(" creation time: ");
                    text.push_str(&Self::timestamp_to_string(date));
                    text.push_str(&self.eol);
                }
                text
            }
            Message::Attachment(attachment) => {
                let mut text = format!("attachment: {}{}", self.eol, self.eol);
                if let Some(name) = &attachment.name {
                    text.push_str(&format!("name: {name}{}", self.eol));
                }
                text
            }
            Message::Folder(folder) => {
                let mut text = "\t".repeat(folder.level.unwrap_or(0));
                text.push_str("folder: ");
                if let Some(name) = &folder.name {
                    text.push_str(name);
                    text.push_str(&self.eol);
                }
                text
            }
            Message::Text(text) => text.text.clone(),
            Message::CloseMailBody | Message::CloseAttachment | Message::BreakLine => self.eol.clone(),
            Message::CloseParagraph | Message::CloseSection => {
                if self.list_mode {
                    String::new()
                } else {
                    self.eol.clone()
                }
            }
            Message::Link(link) => (self.link_formatter.format_opening)(link),
            Message::CloseLink => (self.link_formatter.format_closing)(),
            Message::Image(image) => image.alt.clone().unwrap_or_default(),
            Message::List(list) => {
                self.list_mode = true;
                self.list_counter = 1;
                self.list_type = list.list_type.clone();
                self.eol.clone()
            }
            Message::CloseList => {
                self.list_mode = false;
                self.list_counter = 1;
                String::new()
            }
            Message::ListItem => self.render_list_item(),
            Message::CloseListItem => {
                self.list_counter += 1;
                self.eol.clone()
            }
            Message::CloseHeader => self.eol.clone(),
            Message::Footer => {
                self.footer_mode = true;
                self.footer.clear();
                String::new()
            }
            Message::CloseFooter => {
                self.footer_mode = false;
                String::new()
            }
            Message::Comment(comment) => self.render_comment(comment),
            Message::Document(_) => {
                self.nested_docs += 1;
                String::new()
            }
            Message::CloseDocument => {
                self.nested_docs = self.nested_docs.saturating_sub(1);
                if self.nested_docs == 0 {
                    let mut footer = std::mem::take(&mut self.footer);
                    if !footer.is_empty() {
                        footer.push_str(&self.eol);
                    }
                    format!("{}{footer}", self.eol)
                } else {
                    String::new()
                }
            }
            _ => String::new(),
        };
        if !text.is_empty() {
            self.push(out, &text);
        }
        Ok(())
    }
}
