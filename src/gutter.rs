//! Renders a sequence of [`LineLabel`]s as gutter markup:
//!
//! ```html
//! <span class="line-number" aria-hidden="true"><span>1</span><span>2</span></span>
//! ```
//!
//! The gutter is purely presentational, so it's hidden from assistive
//! technology. Stacking the labels vertically is left to the theme's
//! stylesheet.

use crate::annotate::{LineLabel, LineLabels};
use pulldown_cmark::escape::{escape_html, StrWrite};
use std::io;

/// The class given to the gutter element when none is configured.
pub const DEFAULT_CLASS: &str = "line-number";

/// The gutter for one code sample.
#[derive(Clone, Debug)]
pub struct Gutter<'a> {
    class: &'a str,
    labels: LineLabels,
}

impl<'a> Gutter<'a> {
    pub fn new(class: &'a str, labels: LineLabels) -> Gutter<'a> {
        Gutter { class, labels }
    }

    /// Writes the gutter's markup into `w`.
    pub fn write_html<W: StrWrite>(&self, w: &mut W) -> io::Result<()> {
        w.write_str(r#"<span class=""#)?;
        escape_html(&mut *w, self.class)?;
        w.write_str(r#"" aria-hidden="true">"#)?;
        for label in self.labels.clone() {
            write_label(w, label)?;
        }
        w.write_str("</span>")
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // writing into a `String` can't fail
        let _ = self.write_html(&mut out);
        out
    }
}

fn write_label<W: StrWrite>(w: &mut W, label: LineLabel) -> io::Result<()> {
    write!(w, "<span>{}</span>", label)
}
