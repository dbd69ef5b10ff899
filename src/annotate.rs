//! Defines the pure part of line annotation: [`annotate`] maps the raw text of
//! a code sample onto its trimmed text and the ordered sequence of
//! [`LineLabel`]s that make up its gutter. Nothing in here touches a document;
//! see [`crate::document`] for the pass that applies annotations to one.

use std::fmt;
use std::ops::RangeInclusive;

/// The raw text of a single code sample together with its rendered state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    text: String,
    state: State,
}

/// Whether a [`CodeBlock`] has received its gutter yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Pending,
    Annotated,
}

impl CodeBlock {
    /// Constructs a [`CodeBlock`] in the [`State::Pending`] state.
    pub fn new<S: Into<String>>(text: S) -> CodeBlock {
        CodeBlock {
            text: text.into(),
            state: State::Pending,
        }
    }

    /// Constructs a [`CodeBlock`] that already carries a gutter.
    pub fn annotated<S: Into<String>>(text: S) -> CodeBlock {
        CodeBlock {
            text: text.into(),
            state: State::Annotated,
        }
    }

    /// The text exactly as found in the document.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The text with surrounding whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// The number of `\n`-separated segments in [`CodeBlock::trimmed`].
    pub fn line_count(&self) -> usize {
        line_count(self.trimmed())
    }

    pub fn labels(&self) -> LineLabels {
        LineLabels::new(self.line_count())
    }

    /// Runs [`annotate`] over this block's text and marks it annotated.
    pub fn annotate(&mut self) -> Annotation<'_> {
        self.state = State::Annotated;
        annotate(&self.text)
    }
}

/// The result of annotating a code sample's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation<'a> {
    /// The sample text with leading and trailing whitespace removed. This is
    /// what gets rendered beside the gutter.
    pub trimmed: &'a str,

    /// One label per line of `trimmed`, in ascending order.
    pub labels: LineLabels,

    /// The number of bytes trimmed off the front of the raw text. Adapters
    /// which can't replace the text wholesale use this (together with
    /// `trimmed.len()`) to cut the raw text in place.
    pub leading: usize,
}

impl Annotation<'_> {
    pub fn line_count(&self) -> usize {
        self.labels.len()
    }
}

/// Trims `raw` and computes the labels for its lines. Empty (or
/// whitespace-only) text still yields a single label.
pub fn annotate(raw: &str) -> Annotation<'_> {
    let start = raw.trim_start();
    let trimmed = start.trim_end();
    Annotation {
        trimmed,
        labels: LineLabels::new(line_count(trimmed)),
        leading: raw.len() - start.len(),
    }
}

fn line_count(trimmed: &str) -> usize {
    trimmed.split('\n').count()
}

/// A single line-number label. Labels start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineLabel(usize);

impl LineLabel {
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for LineLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The ordered labels `1..=N` for a sample of `N` lines. Iterating yields
/// them top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineLabels(RangeInclusive<usize>);

impl LineLabels {
    /// Labels for `count` lines. A count of zero is bumped to one since every
    /// sample has at least one line.
    pub fn new(count: usize) -> LineLabels {
        LineLabels(1..=count.max(1))
    }

    pub fn len(&self) -> usize {
        *self.0.end()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Iterator for LineLabels {
    type Item = LineLabel;

    fn next(&mut self) -> Option<LineLabel> {
        self.0.next().map(LineLabel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn labels(raw: &str) -> Vec<usize> {
        annotate(raw).labels.map(LineLabel::get).collect()
    }

    #[test]
    fn test_three_lines() {
        let annotation = annotate("a\nb\nc");
        assert_eq!("a\nb\nc", annotation.trimmed);
        assert_eq!(3, annotation.line_count());
        assert_eq!(vec![1, 2, 3], labels("a\nb\nc"));
    }

    #[test]
    fn test_newline_count_plus_one() {
        for n in 0..20 {
            let raw = vec!["x"; n + 1].join("\n");
            assert_eq!((1..=n + 1).collect::<Vec<_>>(), labels(&raw));
        }
    }

    #[test]
    fn test_empty_text_has_one_label() {
        assert_eq!(vec![1], labels(""));
        assert_eq!(vec![1], labels(" \n\t\n "));
    }

    #[test]
    fn test_surrounding_blank_lines_are_trimmed() {
        let annotation = annotate("\n\n  fn main() {}\n  \n\n");
        assert_eq!("fn main() {}", annotation.trimmed);
        assert_eq!(4, annotation.leading);
        assert_eq!(vec![1], labels("\n\n  fn main() {}\n  \n\n"));
    }

    #[test]
    fn test_leading_offset_without_indentation() {
        let annotation = annotate("\n\nx\n");
        assert_eq!("x", annotation.trimmed);
        assert_eq!(2, annotation.leading);
    }

    #[test]
    fn test_interior_blank_lines_count() {
        assert_eq!(vec![1, 2, 3], labels("\na\n\nb\n"));
    }

    #[test]
    fn test_code_block_state() {
        let mut block = CodeBlock::new("\nlet x = 1;\nlet y = 2;\n");
        assert_eq!(State::Pending, block.state());
        assert_eq!(2, block.line_count());
        assert_eq!(2, block.labels().count());
        let trimmed = block.annotate().trimmed.to_owned();
        assert_eq!("let x = 1;\nlet y = 2;", trimmed);
        assert_eq!(State::Annotated, block.state());
    }

    #[test]
    fn test_label_display() {
        let rendered: Vec<String> =
            LineLabels::new(3).map(|l| l.to_string()).collect();
        assert_eq!(vec!["1", "2", "3"], rendered);
    }
}
