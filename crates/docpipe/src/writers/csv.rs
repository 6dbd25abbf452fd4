//! CSV writer: emits table content only, with RFC 4180 style quoting.

use super::Writer;
use crate::error::Result;
use crate::message::Message;

fn quote_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Folds table events into comma-separated lines; everything outside tables
/// is ignored.
#[derive(Default)]
pub struct CsvWriter {
    table_depth: usize,
    row: Vec<String>,
    cell: Option<String>,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Writer for CsvWriter {
    fn write_to(&mut self, message: &Message, out: &mut String) -> Result<()> {
        match message {
            Message::Table => self.table_depth += 1,
            Message::CloseTable => self.table_depth = self.table_depth.saturating_sub(1),
            Message::TableRow if self.table_depth == 1 => self.row.clear(),
            Message::CloseTableRow if self.table_depth == 1 => {
                out.push_str(&self.row.join(","));
                out.push('\n');
                self.row.clear();
            }
            Message::TableCell if self.table_depth == 1 => self.cell = Some(String::new()),
            Message::CloseTableCell if self.table_depth == 1 => {
                if let Some(cell) = self.cell.take() {
                    self.row.push(quote_cell(&cell));
                }
            }
            Message::Text(text) => {
                if let Some(cell) = &mut self.cell {
                    cell.push_str(&text.text);
                }
            }
            Message::BreakLine => {
                if let Some(cell) = &mut self.cell {
                    cell.push('\n');
                }
            }
            _ => {}
        }
        Ok(())
    }
}
