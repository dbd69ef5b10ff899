use crate::document::{Options, Report};
use crate::htmlrenderer::push_html;
use pulldown_cmark::escape::StrWrite;
use pulldown_cmark::{Options as ParserOptions, Parser};
use std::io;

/// Converts markdown to HTML, writing the result into [`w`]. Every code block
/// comes out with its gutter attached.
///
/// * [`markdown`] is the article body, without front-matter.
/// * [`options`] controls the gutter markup.
pub fn to_html<W: StrWrite>(
    w: &mut W,
    markdown: &str,
    options: &Options,
) -> io::Result<Report> {
    let mut parser_options = ParserOptions::empty();
    parser_options.insert(ParserOptions::ENABLE_FOOTNOTES);
    parser_options.insert(ParserOptions::ENABLE_SMART_PUNCTUATION);
    parser_options.insert(ParserOptions::ENABLE_STRIKETHROUGH);
    parser_options.insert(ParserOptions::ENABLE_TABLES);
    parser_options.insert(ParserOptions::ENABLE_TASKLISTS);

    push_html(w, Parser::new_ext(markdown, parser_options), options)
}
