//! Defines the [`Article`] type: a Markdown article split into its
//! front-matter and its body. Each article file may begin with a YAML
//! front-matter block:
//!
//! ```md
//! ---
//! title: Writing a web server in C
//! date: 2020-04-16
//! draft: false
//! ---
//! # Sockets
//! ```
//!
//! Articles without a starting fence have no front-matter at all.

use crate::document::{Options, Report};
use crate::markdown;
use serde::Deserialize;
use std::fmt;

const FENCE: &str = "---";

/// The front-matter of an [`Article`]. Every field is optional.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// The title of the article.
    #[serde(default, alias = "Title")]
    pub title: Option<String>,

    /// The date of the article, as written.
    #[serde(default, alias = "Date")]
    pub date: Option<String>,

    /// Whether the article is still a draft.
    #[serde(default, alias = "Draft")]
    pub draft: bool,
}

/// A parsed Markdown article. The body borrows from the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article<'a> {
    pub front_matter: FrontMatter,
    pub body: &'a str,
}

impl<'a> Article<'a> {
    /// Splits `input` into front-matter and body.
    pub fn parse(input: &'a str) -> Result<Article<'a>> {
        let (yaml, body) = match split_front_matter(input)? {
            Some(parts) => parts,
            None => {
                return Ok(Article {
                    front_matter: FrontMatter::default(),
                    body: input,
                })
            }
        };
        let front_matter = match yaml.trim().is_empty() {
            true => FrontMatter::default(),
            false => serde_yaml::from_str(yaml)?,
        };
        Ok(Article { front_matter, body })
    }

    pub fn is_draft(&self) -> bool {
        self.front_matter.draft
    }

    /// Renders the body to HTML with every code block annotated.
    pub fn to_html(&self, options: &Options) -> Result<(String, Report)> {
        let mut html = String::new();
        let report = markdown::to_html(&mut html, self.body, options)?;
        Ok((html, report))
    }
}

// Returns `(yaml, body)`, or `None` if `input` doesn't open with a fence. The
// closing fence must sit on a line of its own.
fn split_front_matter(input: &str) -> Result<Option<(&str, &str)>> {
    let rest = match input.strip_prefix(FENCE) {
        Some(rest) if rest.starts_with('\n') || rest.starts_with("\r\n") => rest,
        _ => return Ok(None),
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == FENCE {
            return Ok(Some((&rest[..offset], &rest[offset + line.len()..])));
        }
        offset += line.len();
    }
    Err(Error::FrontMatterMissingEndFence)
}

/// Represents the result of an [`Article`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing or rendering an [`Article`].
#[derive(Debug)]
pub enum Error {
    /// Returned when an article opens a front-matter fence (`---`) but never
    /// closes it.
    FrontMatterMissingEndFence,

    /// Returned when there was an error parsing the front-matter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for I/O errors while rendering.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontMatterMissingEndFence => {
                write!(f, "Missing closing `---` for front-matter")
            }
            Error::DeserializeYaml(err) => write!(f, "Parsing front-matter: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontMatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
