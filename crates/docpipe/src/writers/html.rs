//! HTML writer: structural events to HTML tags, 1:1.

use super::Writer;
use crate::error::Result;
use crate::message::Message;

fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Folds structural events into an HTML document.
#[derive(Default)]
pub struct HtmlWriter {
    /// Open list kinds, so closers match their openers.
    list_stack: Vec<&'static str>,
    nested_docs: usize,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Writer for HtmlWriter {
    fn write_to(&mut self, message: &Message, out: &mut String) -> Result<()> {
        match message {
            Message::Document(_) => {
                self.nested_docs += 1;
                if self.nested_docs == 1 {
                    out.push_str(
                        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n</head>\n<body>\n",
                    );
                }
            }
            Message::CloseDocument => {
                self.nested_docs = self.nested_docs.saturating_sub(1);
                if self.nested_docs == 0 {
                    out.push_str("</body>\n</html>\n");
                }
            }
            Message::Text(text) => out.push_str(&escape_text(&text.text)),
            Message::BreakLine => out.push_str("<br />\n"),
            Message::Paragraph => out.push_str("<p>"),
            Message::CloseParagraph => out.push_str("</p>\n"),
            Message::Section => out.push_str("<div>"),
            Message::CloseSection => out.push_str("</div>\n"),
            Message::Header => out.push_str("<header>"),
            Message::CloseHeader => out.push_str("</header>\n"),
            Message::Footer => out.push_str("<footer>"),
            Message::CloseFooter => out.push_str("</footer>\n"),
            Message::List(list) => {
                let tag = if list.list_type == "decimal" { "ol" } else { "ul" };
                self.list_stack.push(tag);
                out.push_str(&format!("<{tag}>\n"));
            }
            Message::CloseList => {
                let tag = self.list_stack.pop().unwrap_or("ul");
                out.push_str(&format!("</{tag}>\n"));
            }
            Message::ListItem => out.push_str("<li>"),
            Message::CloseListItem => out.push_str("</li>\n"),
            Message::Table => out.push_str("<table>\n"),
            Message::CloseTable => out.push_str("</table>\n"),
            Message::TableRow => out.push_str("<tr>"),
            Message::CloseTableRow => out.push_str("</tr>\n"),
            Message::TableCell => out.push_str("<td>"),
            Message::CloseTableCell => out.push_str("</td>"),
            Message::Link(link) => match &link.url {
                Some(url) => out.push_str(&format!("<a href=\"{}\">", escape_attribute(url))),
                None => out.push_str("<a>"),
            },
            Message::CloseLink => out.push_str("</a>"),
            Message::Image(image) => {
                out.push_str("<img");
                if let Some(src) = &image.src {
                    out.push_str(&format!(" src=\"{}\"", escape_attribute(src)));
                }
                if let Some(alt) = &image.alt {
                    out.push_str(&format!(" alt=\"{}\"", escape_attribute(alt)));
                }
                out.push_str(" />");
            }
            Message::Bold => out.push_str("<b>"),
            Message::CloseBold => out.push_str("</b>"),
            Message::Italic => out.push_str("<i>"),
            Message::CloseItalic => out.push_str("</i>"),
            Message::Underline => out.push_str("<u>"),
            Message::CloseUnderline => out.push_str("</u>"),
            Message::Mail(mail) => {
                out.push_str("<div class=\"mail\">");
                if let Some(subject) = &mail.subject {
                    out.push_str(&format!("<h2>{}</h2>", escape_text(subject)));
                }
            }
            Message::CloseMail => out.push_str("</div>\n"),
            Message::MailBody => out.push_str("<div class=\"mail-body\">"),
            Message::CloseMailBody => out.push_str("</div>\n"),
            Message::Attachment(attachment) => {
                out.push_str("<div class=\"attachment\">");
                if let Some(name) = &attachment.name {
                    out.push_str(&escape_text(name));
                }
            }
            Message::CloseAttachment => out.push_str("</div>\n"),
            Message::Folder(folder) => {
                out.push_str("<div class=\"folder\">");
                if let Some(name) = &folder.name {
                    out.push_str(&format!("<h2>{}</h2>", escape_text(name)));
                }
            }
            Message::CloseFolder => out.push_str("</div>\n"),
            Message::Comment(comment) => {
                out.push_str("<div class=\"comment\">");
                if let Some(author) = &comment.author {
                    out.push_str(&format!("<b>{}</b> ", escape_text(author)));
                }
                if let Some(time) = &comment.time {
                    out.push_str(&format!("({}) ", escape_text(time)));
                }
                if let Some(body) = &comment.body {
                    out.push_str(&escape_text(body));
                }
                out.push_str("</div>\n");
            }
            Message::Page => out.push_str("<div class=\"page\">\n"),
            Message::ClosePage => out.push_str("</div>\n"),
            _ => {}
        }
        Ok(())
    }
}
