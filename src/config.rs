//! Loads `linenum.yaml`. Every field is optional:
//!
//! ```yaml
//! gutter_class: line-number
//! guard: true
//! extensions: [html, htm]
//! output_directory: public-annotated
//! include_drafts: false
//! ```
//!
//! A relative `output_directory` is resolved against the directory holding
//! the configuration file.

use crate::document::Options;
use crate::gutter::DEFAULT_CLASS;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the configuration file searched for by
/// [`Config::from_directory`].
pub const FILE_NAME: &str = "linenum.yaml";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The class given to gutter elements.
    pub gutter_class: String,

    /// Whether annotated containers are marked so later passes skip them.
    pub guard: bool,

    /// The extensions (without the dot) of the pages picked up when walking a
    /// directory.
    pub extensions: Vec<String>,

    /// Where annotated pages are written. Pages are rewritten in place when
    /// this is unset.
    pub output_directory: Option<PathBuf>,

    /// Whether drafts are rendered.
    pub include_drafts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gutter_class: DEFAULT_CLASS.to_owned(),
            guard: true,
            extensions: vec!["html".to_owned(), "htm".to_owned()],
            output_directory: None,
            include_drafts: false,
        }
    }
}

impl Config {
    /// Looks for [`FILE_NAME`] in `dir` and each of its ancestors, loading
    /// the first one found. Falls back to [`Config::default`] if there is
    /// none.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut dir = Some(dir);
        while let Some(current) = dir {
            let path = current.join(FILE_NAME);
            if path.is_file() {
                return Config::from_file(&path);
            }
            dir = current.parent();
        }
        Ok(Config::default())
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let mut config: Config = serde_yaml::from_reader(open(path, "configuration")?)
            .with_context(|| format!("Loading configuration `{}`", path.display()))?;
        if let Some(output_directory) = &config.output_directory {
            if output_directory.is_relative() {
                let root = path.parent().ok_or_else(|| {
                    anyhow!(
                        "Can't get parent directory for configuration file `{}`",
                        path.display()
                    )
                })?;
                config.output_directory = Some(root.join(output_directory));
            }
        }
        Ok(config)
    }

    /// The annotation [`Options`] described by this configuration.
    pub fn options(&self) -> Options {
        Options {
            gutter_class: self.gutter_class.clone(),
            guard: self.guard,
        }
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::from_directory(dir.path())?;
        assert_eq!(Config::default(), config);
        assert_eq!(Options::default(), config.options());
        Ok(())
    }

    #[test]
    fn test_found_in_ancestor() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(FILE_NAME),
            "gutter_class: gutter\nguard: false\noutput_directory: out\n",
        )?;
        let nested = dir.path().join("content").join("posts");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!("gutter", config.gutter_class);
        assert!(!config.guard);
        assert_eq!(vec!["html", "htm"], config.extensions);
        assert_eq!(Some(dir.path().join("out")), config.output_directory);
        Ok(())
    }

    #[test]
    fn test_unknown_field_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "gutter: oops\n")?;
        assert!(Config::from_file(&path).is_err());
        Ok(())
    }
}
