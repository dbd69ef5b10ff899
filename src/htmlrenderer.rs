//! Implements a custom [`push_html`] which renders code blocks with their
//! line-number gutters already in place. [`pulldown_cmark::html::push_html`]
//! streams code block text straight through, but a gutter can only be built
//! once the whole block (and thus its line count) is known, so code blocks are
//! buffered here and written out at their end tag.

use crate::annotate::annotate;
use crate::document::{Options, Report};
use crate::gutter::Gutter;
use crate::html::MARKER_ATTRIBUTE;
use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Tag};
use std::io;

enum TableState {
    Head,
    Body,
}

/// A code block whose text is still being collected.
struct PendingCode {
    language: Option<String>,
    text: String,
}

/// Renders markdown [`Event`]s into HTML. This is largely modeled after
/// [`pulldown_cmark`]'s private [`HtmlWriter`
/// struct](https://github.com/raphlinus/pulldown-cmark/blob/bf0a1a4938dbd2ec41c3add069b3d361d11731f4/src/html.rs#L36-L50).
struct HtmlRenderer<'o> {
    table_alignments: Vec<Alignment>,
    table_state: TableState,
    table_cell_index: usize,
    code: Option<PendingCode>,
    options: &'o Options,
    report: Report,
}

impl<'a, 'o> HtmlRenderer<'o> {
    fn new(options: &'o Options) -> Self {
        HtmlRenderer {
            table_alignments: Vec::default(),
            table_state: TableState::Head,
            table_cell_index: usize::default(),
            code: None,
            options,
            report: Report::default(),
        }
    }

    fn on_event<W: StrWrite>(&mut self, w: &mut W, event: Event<'a>) -> io::Result<()> {
        if let Some(code) = &mut self.code {
            match event {
                Event::Text(text) | Event::Html(text) => {
                    code.text.push_str(&text);
                    return Ok(());
                }
                Event::End(Tag::CodeBlock(_)) => return self.on_code_block_end(w),
                _ => {}
            }
        }

        match event {
            Event::Start(tag) => self.on_start(w, tag),
            Event::End(tag) => self.on_end(w, tag),
            Event::Code(code) => {
                w.write_str("<code>")?;
                escape_html(&mut *w, &code)?;
                w.write_str("</code>")
            }
            Event::FootnoteReference(name) => {
                w.write_str(r##"<sup class="footnote-reference"><a href="#"##)?;
                escape_html(&mut *w, &name)?;
                w.write_str(r#"">"#)?;
                escape_html(&mut *w, &name)?;
                w.write_str("</a></sup>")
            }
            Event::HardBreak => w.write_str("<br />"),
            Event::Html(html) => w.write_str(&html),
            Event::Rule => w.write_str("<hr />"),
            Event::SoftBreak => w.write_str("\n"),
            Event::TaskListMarker(checked) => write!(
                w,
                r#"<input disabled="" type="checkbox" {}/>"#,
                match checked {
                    true => r#"checked="" "#,
                    false => "",
                }
            ),
            Event::Text(text) => escape_html(w, &text),
        }
    }

    fn on_start<W: StrWrite>(&mut self, w: &mut W, tag: Tag<'a>) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                self.code = Some(PendingCode {
                    language: match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_owned()),
                        CodeBlockKind::Indented => None,
                    },
                    text: String::new(),
                });
                Ok(())
            }
            Tag::Emphasis => w.write_str("<em>"),
            Tag::FootnoteDefinition(name) => {
                w.write_str(r#"<div class="footnote-definition" id=""#)?;
                escape_html(&mut *w, &name)?;
                w.write_str(r#"">"#)?;
                escape_html(&mut *w, &name)?;
                w.write_str(". &nbsp;")
            }
            Tag::Heading(level) => write!(w, "<h{}>", level),
            Tag::Image(_link_type, dest, title) => {
                w.write_str(r#"<img src=""#)?;
                escape_href(&mut *w, &dest)?;
                w.write_str(r#"" alt="" title=""#)?;
                escape_html(&mut *w, &title)?;
                w.write_str(r#"">"#)
            }
            Tag::Item => w.write_str("<li>"),
            Tag::Link(link_type, dest, title) => {
                w.write_str(r#"<a href=""#)?;
                if let LinkType::Email = link_type {
                    w.write_str("mailto:")?;
                }
                escape_href(&mut *w, &dest)?;
                if !title.is_empty() {
                    w.write_str(r#"" title=""#)?;
                    escape_html(&mut *w, &title)?;
                }
                w.write_str(r#"">"#)
            }
            Tag::List(None) => w.write_str("<ul>"),
            Tag::List(Some(1)) => w.write_str("<ol>"),
            Tag::List(Some(start)) => write!(w, r#"<ol start="{}">"#, start),
            Tag::Paragraph => w.write_str("<p>"),
            Tag::Strikethrough => w.write_str("<del>"),
            Tag::Strong => w.write_str("<strong>"),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                w.write_str("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                w.write_str("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                w.write_str("<tr>")
            }
            Tag::TableCell => write!(
                w,
                "<{}{}>",
                match self.table_state {
                    TableState::Head => "th",
                    TableState::Body => "td",
                },
                match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => r#" align="left""#,
                    Some(Alignment::Right) => r#" align="right""#,
                    Some(Alignment::Center) => r#" align="center""#,
                    _ => "",
                }
            ),
        }
    }

    fn on_end<W: StrWrite>(&mut self, w: &mut W, tag: Tag) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("</blockquote>"),
            Tag::CodeBlock(_) => Ok(()), // handled by `on_code_block_end`
            Tag::Emphasis => w.write_str("</em>"),
            Tag::FootnoteDefinition(_) => w.write_str("</div>"),
            Tag::Heading(level) => write!(w, "</h{}>", level),
            Tag::Image(_, _, _) => Ok(()), // handled in start
            Tag::Item => w.write_str("</li>"),
            Tag::Link(_, _, _) => w.write_str("</a>"),
            Tag::List(Some(_)) => w.write_str("</ol>"),
            Tag::List(None) => w.write_str("</ul>"),
            Tag::Paragraph => w.write_str("</p>"),
            Tag::Strikethrough => w.write_str("</del>"),
            Tag::Strong => w.write_str("</strong>"),
            Tag::Table(_) => w.write_str("</tbody></table>"),
            Tag::TableHead => {
                self.table_state = TableState::Body;
                w.write_str("</tr></thead><tbody>")
            }
            Tag::TableRow => w.write_str("</tr>"),
            Tag::TableCell => {
                self.table_cell_index += 1;
                w.write_str(match self.table_state {
                    TableState::Head => "</th>",
                    TableState::Body => "</td>",
                })
            }
        }
    }

    fn on_code_block_end<W: StrWrite>(&mut self, w: &mut W) -> io::Result<()> {
        let code = match self.code.take() {
            Some(code) => code,
            None => return Ok(()),
        };
        let annotation = annotate(&code.text);
        self.report.annotated += 1;

        w.write_str("<pre")?;
        if self.options.guard {
            write!(w, r#" {}="""#, MARKER_ATTRIBUTE)?;
        }
        w.write_str(">")?;
        Gutter::new(&self.options.gutter_class, annotation.labels).write_html(w)?;
        match code.language {
            Some(lang) => {
                w.write_str(r#"<code class="language-"#)?;
                escape_html(&mut *w, &lang)?;
                w.write_str(r#"">"#)?;
            }
            None => w.write_str("<code>")?,
        }
        escape_html(&mut *w, annotation.trimmed)?;
        w.write_str("</code></pre>")
    }
}

/// Converts [`Event`]s into an HTML string much like
/// `pulldown_cmark::html::push_html` except that every code block is given a
/// gutter. See the module description for more details.
pub fn push_html<'a, I, W>(
    w: &mut W,
    events: I,
    options: &Options,
) -> io::Result<Report>
where
    I: Iterator<Item = Event<'a>>,
    W: StrWrite,
{
    let mut renderer = HtmlRenderer::new(options);
    for event in events {
        renderer.on_event(w, event)?;
    }
    Ok(renderer.report)
}
