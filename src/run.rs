//! Exports the [`Runner`] which stitches together the high-level steps of
//! annotating a tree of rendered pages: finding the pages ([`walkdir`]),
//! annotating each one ([`crate::html`]), and writing the results either back
//! in place or into an output directory. It also renders single Markdown
//! articles ([`crate::article`]).

use crate::article::{Article, Error as ArticleError};
use crate::document::{Options, Report};
use crate::html::{annotate_html, Error as HtmlError};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Annotates pages on disk.
pub struct Runner<'a> {
    /// The options for each page's annotation pass.
    pub options: &'a Options,

    /// The extensions (without the dot) of pages picked up from directories.
    /// Files named explicitly are always processed.
    pub extensions: &'a [String],

    /// The directory in which annotated pages are written. A page found at
    /// `{root}/a/b.html` under a directory argument `{root}` is written to
    /// `{output_directory}/a/b.html`; a file argument is written to
    /// `{output_directory}/{file_name}`. When unset, pages are rewritten in
    /// place.
    pub output_directory: Option<&'a Path>,
}

/// Totals for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Pages read.
    pub pages: usize,

    /// Pages written.
    pub written: usize,

    /// Code samples across all pages.
    pub samples: Report,
}

impl Runner<'_> {
    /// Annotates every page named by `paths`. Directories are walked
    /// recursively.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Stats> {
        let mut stats = Stats::default();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                for (source, relative) in self.pages(path)? {
                    self.run_page(&source, &relative, &mut stats)?;
                }
            } else {
                let relative = path
                    .file_name()
                    .map(PathBuf::from)
                    .ok_or_else(|| Error::InvalidPath(path.to_owned()))?;
                self.run_page(path, &relative, &mut stats)?;
            }
        }
        Ok(stats)
    }

    // Collects `(source, relative)` pairs for the pages under `root`, in a
    // stable order.
    fn pages(&self, root: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
        let mut pages = Vec::new();
        let walker = WalkDir::new(root).sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file() || !self.is_page(entry.path()) {
                continue;
            }
            // strip_prefix shouldn't fail since `root` is always an ancestor
            // of `entry.path()`
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|_| Error::InvalidPath(entry.path().to_owned()))?
                .to_owned();
            pages.push((entry.path().to_owned(), relative));
        }
        Ok(pages)
    }

    fn is_page(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    fn run_page(&self, source: &Path, relative: &Path, stats: &mut Stats) -> Result<()> {
        let input = std::fs::read_to_string(source).map_err(|err| Error::Read {
            path: source.to_owned(),
            err,
        })?;
        let (output, report) = annotate_html(&input, self.options).map_err(|err| Error::Html {
            path: source.to_owned(),
            err,
        })?;
        stats.pages += 1;
        stats.samples += report;

        let destination = match self.output_directory {
            Some(dir) => dir.join(relative),
            None => source.to_owned(),
        };
        if destination == source && output == input {
            debug!("{}: nothing to annotate", source.display());
            return Ok(());
        }

        if let Some(dir) = destination.parent() {
            std::fs::create_dir_all(dir).map_err(|err| Error::Write {
                path: dir.to_owned(),
                err,
            })?;
        }
        std::fs::write(&destination, output).map_err(|err| Error::Write {
            path: destination.clone(),
            err,
        })?;
        stats.written += 1;
        info!(
            "{}: annotated {} sample(s), skipped {}",
            destination.display(),
            report.annotated,
            report.skipped
        );
        Ok(())
    }

    /// Renders the Markdown article at `path` to HTML. Drafts are refused
    /// with [`Error::Draft`] unless `include_drafts` is set.
    pub fn render(&self, path: &Path, include_drafts: bool) -> Result<(String, Report)> {
        let input = std::fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
        let annotated = |err| Error::Article {
            path: path.to_owned(),
            err,
        };
        let article = Article::parse(&input).map_err(annotated)?;
        if article.is_draft() && !include_drafts {
            return Err(Error::Draft(path.to_owned()));
        }
        article.to_html(self.options).map_err(annotated)
    }
}

/// The result of a fallible run.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for a run. Each variant carries the path it concerns.
#[derive(Debug)]
pub enum Error {
    /// Returned when a page or article can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when an annotated page (or its directory) can't be written.
    Write { path: PathBuf, err: std::io::Error },

    /// Returned when a page can't be annotated.
    Html { path: PathBuf, err: HtmlError },

    /// Returned when an article can't be parsed or rendered.
    Article { path: PathBuf, err: ArticleError },

    /// Returned for errors walking a directory.
    WalkDir(walkdir::Error),

    /// Returned for paths without a usable file name.
    InvalidPath(PathBuf),

    /// Returned when asked to render a draft without drafts included.
    Draft(PathBuf),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => write!(f, "Reading '{}': {}", path.display(), err),
            Error::Write { path, err } => write!(f, "Writing '{}': {}", path.display(), err),
            Error::Html { path, err } => write!(f, "Annotating '{}': {}", path.display(), err),
            Error::Article { path, err } => write!(f, "Rendering '{}': {}", path.display(), err),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidPath(path) => write!(f, "Invalid path: {:?}", path),
            Error::Draft(path) => write!(f, "Refusing to render draft '{}'", path.display()),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
            Error::Html { path: _, err } => Some(err),
            Error::Article { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidPath(_) | Error::Draft(_) => None,
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
