//! Defines the [`Document`] capability and the single annotation pass,
//! [`annotate_document`], which runs over any document that can enumerate its
//! code samples. The line counting itself lives in [`crate::annotate`]; the
//! mutation of a concrete tree lives in the adapters (e.g.,
//! [`crate::html::HtmlDocument`]).

use crate::annotate::{annotate, Annotation, CodeBlock, State};
use crate::gutter::DEFAULT_CLASS;
use log::debug;

/// Something that holds code samples and can have gutters attached to them.
pub trait Document {
    type Error;

    /// Returns a snapshot of every code sample in the document, in document
    /// order. Samples which already carry a gutter are reported in
    /// [`State::Annotated`].
    fn code_samples(&mut self) -> Result<Vec<CodeBlock>, Self::Error>;

    /// Applies a plan to the document. `plan` has exactly one entry per sample
    /// returned by [`Document::code_samples`], in the same order; `None`
    /// entries are left untouched.
    fn apply(
        &mut self,
        plan: &[Option<Annotation<'_>>],
        options: &Options,
    ) -> Result<(), Self::Error>;
}

/// Knobs for an annotation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// The class given to each gutter element.
    pub gutter_class: String,

    /// When set, containers are marked as they are annotated and marked
    /// containers are skipped, so repeated passes don't stack gutters.
    pub guard: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            gutter_class: DEFAULT_CLASS.to_owned(),
            guard: true,
        }
    }
}

/// What a single pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub annotated: usize,
    pub skipped: usize,
}

impl Report {
    pub fn is_noop(&self) -> bool {
        self.annotated == 0
    }
}

impl std::ops::AddAssign for Report {
    fn add_assign(&mut self, other: Report) {
        self.annotated += other.annotated;
        self.skipped += other.skipped;
    }
}

/// Annotates every code sample in `doc`. If nothing needs a gutter the
/// document isn't touched at all.
pub fn annotate_document<D: Document>(
    doc: &mut D,
    options: &Options,
) -> Result<Report, D::Error> {
    let samples = doc.code_samples()?;
    let mut report = Report::default();
    let plan: Vec<Option<Annotation>> = samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            if options.guard && sample.state() == State::Annotated {
                debug!("sample {}: already annotated, skipping", i);
                report.skipped += 1;
                return None;
            }
            let annotation = annotate(sample.text());
            debug!("sample {}: {} line(s)", i, annotation.line_count());
            report.annotated += 1;
            Some(annotation)
        })
        .collect();

    if !report.is_noop() {
        doc.apply(&plan, options)?;
    }
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotate::LineLabel;
    use std::convert::Infallible;

    /// A document that is just a list of texts; "applying" replaces each
    /// annotated text with its trimmed text prefixed by its labels.
    struct Texts {
        texts: Vec<String>,
        annotated: Vec<bool>,
        applied: usize,
    }

    impl Texts {
        fn new(texts: &[&str]) -> Texts {
            Texts {
                texts: texts.iter().map(|t| t.to_string()).collect(),
                annotated: vec![false; texts.len()],
                applied: 0,
            }
        }
    }

    impl Document for Texts {
        type Error = Infallible;

        fn code_samples(&mut self) -> Result<Vec<CodeBlock>, Infallible> {
            Ok(self
                .texts
                .iter()
                .zip(&self.annotated)
                .map(|(text, &done)| match done {
                    true => CodeBlock::annotated(text.as_str()),
                    false => CodeBlock::new(text.as_str()),
                })
                .collect())
        }

        fn apply(
            &mut self,
            plan: &[Option<Annotation<'_>>],
            _options: &Options,
        ) -> Result<(), Infallible> {
            self.applied += 1;
            for (i, entry) in plan.iter().enumerate() {
                if let Some(annotation) = entry {
                    let labels: Vec<String> = annotation
                        .labels
                        .clone()
                        .map(|l: LineLabel| l.to_string())
                        .collect();
                    self.texts[i] =
                        format!("[{}]{}", labels.join(","), annotation.trimmed);
                    self.annotated[i] = true;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_samples_annotated_in_order() -> Result<(), Infallible> {
        let mut doc = Texts::new(&["a\nb", "1\n2\n3\n4\n5"]);
        let report = annotate_document(&mut doc, &Options::default())?;
        assert_eq!(Report { annotated: 2, skipped: 0 }, report);
        assert_eq!(vec!["[1,2]a\nb", "[1,2,3,4,5]1\n2\n3\n4\n5"], doc.texts);
        Ok(())
    }

    #[test]
    fn test_no_samples_is_noop() -> Result<(), Infallible> {
        let mut doc = Texts::new(&[]);
        let report = annotate_document(&mut doc, &Options::default())?;
        assert!(report.is_noop());
        assert_eq!(0, doc.applied);
        Ok(())
    }

    #[test]
    fn test_guard_skips_annotated_samples() -> Result<(), Infallible> {
        let mut doc = Texts::new(&["x"]);
        annotate_document(&mut doc, &Options::default())?;
        let report = annotate_document(&mut doc, &Options::default())?;
        assert_eq!(Report { annotated: 0, skipped: 1 }, report);
        assert_eq!(1, doc.applied);
        assert_eq!(vec!["[1]x"], doc.texts);
        Ok(())
    }

    #[test]
    fn test_without_guard_samples_are_reannotated() -> Result<(), Infallible> {
        let options = Options {
            guard: false,
            ..Options::default()
        };
        let mut doc = Texts::new(&["x"]);
        annotate_document(&mut doc, &options)?;
        let report = annotate_document(&mut doc, &options)?;
        assert_eq!(Report { annotated: 1, skipped: 0 }, report);
        assert_eq!(vec!["[1][1]x"], doc.texts);
        Ok(())
    }
}
