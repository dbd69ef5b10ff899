//! Implements [`Document`] for HTML pages. A code sample is the outermost
//! `<code>` element inside a `<pre>` element, at any depth, wherever the
//! `<pre>` sits in the page. The gutter goes immediately before the `<code>`,
//! inside the `<code>`'s parent, and the nearest enclosing `<pre>` is the
//! container that gets marked and has its blank text dropped. Annotating a
//! sample turns
//!
//! ```html
//! <pre>
//! <code>
//! a
//! b
//! </code>
//! </pre>
//! ```
//!
//! into
//!
//! ```html
//! <pre data-line-numbers=""><span class="line-number" aria-hidden="true">
//! <span>1</span><span>2</span></span><code>a
//! b</code></pre>
//! ```
//!
//! (the gutter is written on a single line; it's wrapped here for width).
//!
//! Pages are streamed through [`lol_html`] twice: once to take a snapshot of
//! the samples, once to rewrite them. Text is handled as it appears in the
//! source, i.e. entities are not decoded before lines are counted. An
//! encoded newline (`&#10;`) therefore doesn't start a new gutter line even
//! though the browser breaks the line there, and an encoded space at either
//! end isn't trimmed; such samples end up with a gutter shorter than the
//! rendered code. Pages written by hand or by Markdown renderers use literal
//! newlines, so this only affects unusual markup.

use crate::annotate::{Annotation, CodeBlock};
use crate::document::{annotate_document, Document, Options, Report};
use crate::gutter::Gutter;
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// The attribute set on a container once its samples have gutters.
pub const MARKER_ATTRIBUTE: &str = "data-line-numbers";

const CONTAINER: &str = "pre";
const SAMPLE: &str = "pre code";

/// An HTML page held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlDocument {
    html: String,
}

impl HtmlDocument {
    pub fn new<S: Into<String>>(html: S) -> HtmlDocument {
        HtmlDocument { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    fn survey(&self) -> Result<Survey> {
        #[derive(Default)]
        struct State {
            containers: usize,
            // (ordinal, guarded) for each open container
            open: Vec<(usize, bool)>,
            in_sample: bool,
            samples: Vec<Sample>,
        }

        let state = Rc::new(RefCell::new(State::default()));
        let (on_container, on_sample, on_text) =
            (state.clone(), state.clone(), state.clone());
        rewrite_str(
            &self.html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!(CONTAINER, move |el| {
                        let mut s = on_container.borrow_mut();
                        let ordinal = s.containers;
                        s.containers += 1;
                        s.open.push((ordinal, el.has_attribute(MARKER_ATTRIBUTE)));
                        if let Some(handlers) = el.end_tag_handlers() {
                            let state = on_container.clone();
                            handlers.push(Box::new(move |_end| {
                                state.borrow_mut().open.pop();
                                Ok(())
                            }));
                        }
                        Ok(())
                    }),
                    element!(SAMPLE, move |el| {
                        let mut s = on_sample.borrow_mut();
                        // a `<code>` inside a sample is part of that sample
                        if s.in_sample {
                            return Ok(());
                        }
                        s.in_sample = true;
                        let (container, guarded) =
                            s.open.last().copied().unwrap_or((0, false));
                        s.samples.push(Sample {
                            container,
                            guarded,
                            text: String::new(),
                        });
                        if let Some(handlers) = el.end_tag_handlers() {
                            let state = on_sample.clone();
                            handlers.push(Box::new(move |_end| {
                                state.borrow_mut().in_sample = false;
                                Ok(())
                            }));
                        }
                        Ok(())
                    }),
                    text!(SAMPLE, move |t| {
                        let mut s = on_text.borrow_mut();
                        if let Some(sample) = s.samples.last_mut() {
                            sample.text.push_str(t.as_str());
                        }
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        )?;

        let samples = std::mem::take(&mut state.borrow_mut().samples);
        Ok(Survey { samples })
    }

    fn rewrite(
        &self,
        survey: &Survey,
        plan: &[Option<Annotation<'_>>],
        options: &Options,
    ) -> Result<String> {
        struct State {
            gutters: Vec<Option<(String, Cut)>>,
            annotated_containers: HashSet<usize>,
            containers: usize,
            samples: usize,
            // whether each open container holds an annotated sample
            open: Vec<bool>,
            // `Some(cut)` while inside an annotated sample, `None` while inside
            // a skipped one
            inside: Option<Option<Cut>>,
        }

        let gutters: Vec<Option<(String, Cut)>> = plan
            .iter()
            .map(|entry| {
                entry.as_ref().map(|annotation| {
                    let labels = annotation.labels.clone();
                    let gutter = Gutter::new(&options.gutter_class, labels);
                    (gutter.to_html(), Cut::new(annotation))
                })
            })
            .collect();
        let annotated_containers = survey
            .samples
            .iter()
            .zip(plan)
            .filter(|(_, entry)| entry.is_some())
            .map(|(sample, _)| sample.container)
            .collect();

        let state = Rc::new(RefCell::new(State {
            gutters,
            annotated_containers,
            containers: 0,
            samples: 0,
            open: Vec::new(),
            inside: None,
        }));
        let guard = options.guard;
        let (on_container, on_sample, on_text) =
            (state.clone(), state.clone(), state.clone());
        let html = rewrite_str(
            &self.html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!(CONTAINER, move |el| {
                        let annotated = {
                            let mut s = on_container.borrow_mut();
                            let ordinal = s.containers;
                            s.containers += 1;
                            let annotated = s.annotated_containers.contains(&ordinal);
                            s.open.push(annotated);
                            annotated
                        };
                        if annotated && guard {
                            el.set_attribute(MARKER_ATTRIBUTE, "")?;
                        }
                        if let Some(handlers) = el.end_tag_handlers() {
                            let state = on_container.clone();
                            handlers.push(Box::new(move |_end| {
                                state.borrow_mut().open.pop();
                                Ok(())
                            }));
                        }
                        Ok(())
                    }),
                    element!(SAMPLE, move |el| {
                        let entry = {
                            let mut s = on_sample.borrow_mut();
                            if s.inside.is_some() {
                                return Ok(());
                            }
                            let index = s.samples;
                            s.samples += 1;
                            let entry = s.gutters.get_mut(index).and_then(Option::take);
                            s.inside = Some(entry.as_ref().map(|(_, cut)| *cut));
                            entry
                        };
                        if let Some((gutter, _)) = entry {
                            el.before(&gutter, ContentType::Html);
                        }
                        if let Some(handlers) = el.end_tag_handlers() {
                            let state = on_sample.clone();
                            handlers.push(Box::new(move |_end| {
                                state.borrow_mut().inside = None;
                                Ok(())
                            }));
                        }
                        Ok(())
                    }),
                    text!(CONTAINER, move |t| {
                        let mut s = on_text.borrow_mut();
                        let in_annotated = s.open.last().copied().unwrap_or(false);
                        match &mut s.inside {
                            Some(Some(cut)) => {
                                let chunk = t.as_str();
                                match cut.keep(chunk.len()) {
                                    Keep::All => {}
                                    Keep::Range(start, end) => {
                                        let kept = chunk[start..end].to_owned();
                                        t.replace(&kept, ContentType::Html);
                                    }
                                    Keep::Nothing => t.remove(),
                                }
                            }
                            Some(None) => {}
                            None => {
                                let chunk = t.as_str();
                                let blank = !chunk.is_empty() && chunk.trim().is_empty();
                                if in_annotated && blank {
                                    t.remove();
                                }
                            }
                        }
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        )?;
        Ok(html)
    }
}

impl Document for HtmlDocument {
    type Error = Error;

    fn code_samples(&mut self) -> Result<Vec<CodeBlock>> {
        Ok(self
            .survey()?
            .samples
            .into_iter()
            .map(|sample| match sample.guarded {
                true => CodeBlock::annotated(sample.text),
                false => CodeBlock::new(sample.text),
            })
            .collect())
    }

    fn apply(
        &mut self,
        plan: &[Option<Annotation<'_>>],
        options: &Options,
    ) -> Result<()> {
        let survey = self.survey()?;
        if survey.samples.len() != plan.len() {
            return Err(Error::PlanMismatch {
                samples: survey.samples.len(),
                plan: plan.len(),
            });
        }
        self.html = self.rewrite(&survey, plan, options)?;
        Ok(())
    }
}

/// Annotates the code samples of an HTML page, returning the rewritten page
/// and a [`Report`] of what was done. A page without samples to annotate is
/// returned as-is.
pub fn annotate_html(html: &str, options: &Options) -> Result<(String, Report)> {
    let mut doc = HtmlDocument::new(html);
    let report = annotate_document(&mut doc, options)?;
    Ok((doc.into_string(), report))
}

struct Survey {
    samples: Vec<Sample>,
}

struct Sample {
    /// The ordinal of the `<pre>` holding the sample.
    container: usize,
    guarded: bool,
    text: String,
}

/// Tracks where a sample's text is cut as its chunks stream past. Offsets are
/// byte offsets into the concatenation of the sample's text chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cut {
    start: usize,
    end: usize,
    offset: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Keep {
    All,
    Range(usize, usize),
    Nothing,
}

impl Cut {
    fn new(annotation: &Annotation<'_>) -> Cut {
        Cut {
            start: annotation.leading,
            end: annotation.leading + annotation.trimmed.len(),
            offset: 0,
        }
    }

    /// Decides what to keep of the next chunk of `len` bytes.
    fn keep(&mut self, len: usize) -> Keep {
        let (lo, hi) = (self.offset, self.offset + len);
        self.offset = hi;
        let start = self.start.max(lo).min(hi);
        let end = self.end.max(lo).min(hi);
        if start == lo && end == hi {
            Keep::All
        } else if end > start {
            Keep::Range(start - lo, end - lo)
        } else {
            Keep::Nothing
        }
    }
}

/// The result of a fallible HTML annotation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error annotating an HTML page.
#[derive(Debug)]
pub enum Error {
    /// Returned when the page couldn't be streamed through the rewriter.
    Rewrite(lol_html::errors::RewritingError),

    /// Returned when a plan doesn't line up with the page's samples.
    PlanMismatch { samples: usize, plan: usize },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Rewrite(err) => write!(f, "Rewriting HTML: {}", err),
            Error::PlanMismatch { samples, plan } => write!(
                f,
                "Page has {} code sample(s) but the plan has {} entries",
                samples, plan
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Rewrite(err) => Some(err),
            Error::PlanMismatch { .. } => None,
        }
    }
}

impl From<lol_html::errors::RewritingError> for Error {
    /// Converts a [`lol_html::errors::RewritingError`] into an [`Error`]. It
    /// allows us to use the `?` operator for rewriting functions.
    fn from(err: lol_html::errors::RewritingError) -> Error {
        Error::Rewrite(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn annotate(html: &str) -> Result<(String, Report)> {
        annotate_html(html, &Options::default())
    }

    fn gutter(n: usize) -> String {
        let labels: String = (1..=n)
            .map(|i| format!("<span>{}</span>", i))
            .collect();
        format!(r#"<span class="line-number" aria-hidden="true">{}</span>"#, labels)
    }

    #[test]
    fn test_three_line_sample() -> Result<()> {
        let (html, report) = annotate("<pre><code>a\nb\nc</code></pre>")?;
        assert_eq!(1, report.annotated);
        assert_eq!(
            format!(r#"<pre data-line-numbers="">{}<code>a
b
c</code></pre>"#, gutter(3)),
            html
        );
        Ok(())
    }

    #[test]
    fn test_two_samples_in_document_order() -> Result<()> {
        let input = "<p>one</p>\
                     <pre><code>1\n2</code></pre>\
                     <div><pre><code>1\n2\n3\n4\n5</code></pre></div>";
        let (html, report) = annotate(input)?;
        assert_eq!(2, report.annotated);
        assert_eq!(
            format!(
                "<p>one</p>\
                 <pre data-line-numbers=\"\">{}<code>1\n2</code></pre>\
                 <div><pre data-line-numbers=\"\">{}<code>1\n2\n3\n4\n5</code></pre></div>",
                gutter(2),
                gutter(5)
            ),
            html
        );
        Ok(())
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() -> Result<()> {
        let (html, _) =
            annotate("<pre>\n  <code>\n\nfn main() {}\n\n</code>\n</pre>")?;
        assert_eq!(
            format!(
                r#"<pre data-line-numbers="">{}<code>fn main() {{}}</code></pre>"#,
                gutter(1)
            ),
            html
        );
        Ok(())
    }

    #[test]
    fn test_nested_markup_is_preserved() -> Result<()> {
        let input = concat!(
            "<pre><code class=\"language-rust\">\n",
            "<span class=\"kw\">let</span> x = 1;\n",
            "<span class=\"kw\">let</span> y = &amp;x;\n",
            "</code></pre>",
        );
        let (html, report) = annotate(input)?;
        assert_eq!(1, report.annotated);
        assert_eq!(
            format!(
                concat!(
                    "<pre data-line-numbers=\"\">{}<code class=\"language-rust\">",
                    "<span class=\"kw\">let</span> x = 1;\n",
                    "<span class=\"kw\">let</span> y = &amp;x;</code></pre>",
                ),
                gutter(2)
            ),
            html
        );
        Ok(())
    }

    #[test]
    fn test_code_nested_below_pre() -> Result<()> {
        let (html, report) = annotate("<pre><div><code>x\ny</code></div></pre>")?;
        assert_eq!(1, report.annotated);
        assert_eq!(
            format!(
                r#"<pre data-line-numbers=""><div>{}<code>x
y</code></div></pre>"#,
                gutter(2)
            ),
            html
        );
        Ok(())
    }

    #[test]
    fn test_code_inside_code_is_one_sample() -> Result<()> {
        let mut doc = HtmlDocument::new("<pre><code>a\n<code>b</code>\nc</code></pre>");
        assert_eq!(vec![CodeBlock::new("a\nb\nc")], doc.code_samples()?);
        let report = annotate_document(&mut doc, &Options::default())?;
        assert_eq!(1, report.annotated);
        assert_eq!(
            format!(
                "<pre data-line-numbers=\"\">{}<code>a\n<code>b</code>\nc</code></pre>",
                gutter(3)
            ),
            doc.into_string()
        );
        Ok(())
    }

    #[test]
    fn test_entities_are_not_decoded() -> Result<()> {
        // `&#10;` renders as a line break but isn't counted as one
        let (html, _) = annotate("<pre><code>&#10;a\nb&#10;</code></pre>")?;
        assert_eq!(
            format!(
                "<pre data-line-numbers=\"\">{}<code>&#10;a\nb&#10;</code></pre>",
                gutter(2)
            ),
            html
        );
        Ok(())
    }

    #[test]
    fn test_empty_sample_has_one_label() -> Result<()> {
        let (html, _) = annotate("<pre><code></code></pre>")?;
        assert_eq!(
            format!(r#"<pre data-line-numbers="">{}<code></code></pre>"#, gutter(1)),
            html
        );
        Ok(())
    }

    #[test]
    fn test_page_without_samples_is_unchanged() -> Result<()> {
        let input = "<html><body><pre>plain\n</pre><code>inline</code></body></html>";
        let (html, report) = annotate(input)?;
        assert!(report.is_noop());
        assert_eq!(input, html);
        Ok(())
    }

    #[test]
    fn test_second_pass_is_noop_with_guard() -> Result<()> {
        let (once, _) = annotate("<pre><code>a\nb</code></pre>")?;
        let (twice, report) = annotate(&once)?;
        assert_eq!(Report { annotated: 0, skipped: 1 }, report);
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_second_pass_duplicates_gutter_without_guard() -> Result<()> {
        let options = Options {
            guard: false,
            ..Options::default()
        };
        let (once, _) = annotate_html("<pre><code>a\nb</code></pre>", &options)?;
        assert_eq!(format!("<pre>{}<code>a\nb</code></pre>", gutter(2)), once);
        let (twice, report) = annotate_html(&once, &options)?;
        assert_eq!(1, report.annotated);
        assert_eq!(
            format!("<pre>{}{}<code>a\nb</code></pre>", gutter(2), gutter(2)),
            twice
        );
        Ok(())
    }

    #[test]
    fn test_custom_gutter_class() -> Result<()> {
        let options = Options {
            gutter_class: "gutter".to_owned(),
            ..Options::default()
        };
        let (html, _) = annotate_html("<pre><code>x</code></pre>", &options)?;
        assert!(html.contains(r#"<span class="gutter" aria-hidden="true"><span>1</span></span>"#));
        Ok(())
    }

    #[test]
    fn test_code_samples_snapshot() -> Result<()> {
        let mut doc = HtmlDocument::new(
            "<pre data-line-numbers><code>done</code></pre><pre><code>\ntodo\n</code></pre>",
        );
        let samples = doc.code_samples()?;
        assert_eq!(
            vec![CodeBlock::annotated("done"), CodeBlock::new("\ntodo\n")],
            samples
        );
        Ok(())
    }

    #[test]
    fn test_plan_mismatch() {
        let mut doc = HtmlDocument::new("<pre><code>x</code></pre>");
        match doc.apply(&[], &Options::default()) {
            Err(Error::PlanMismatch { samples: 1, plan: 0 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_cut_across_chunks() {
        // "  ab" + "c  " trimmed to "abc"
        let mut cut = Cut {
            start: 2,
            end: 5,
            offset: 0,
        };
        assert_eq!(Keep::Range(2, 4), cut.keep(4));
        assert_eq!(Keep::Range(0, 1), cut.keep(3));
        assert_eq!(Keep::All, cut.keep(0));
        assert_eq!(Keep::Nothing, cut.keep(2));
    }
}
