//! The library code for `linenum`, which gives every code sample on a blog's
//! pages a gutter of line numbers. The architecture can be broken down into a
//! pure step and an adapter step:
//!
//! 1. Annotating a sample's text ([`crate::annotate`]): trim it, count its
//!    lines, and produce the labels `1..=N`.
//! 2. Applying annotations to a document ([`crate::document`]), which is any
//!    type that can list its code samples and accept gutters for them.
//!
//! There are two documents: rendered HTML pages ([`crate::html`]), where a
//! sample is a `<code>` directly inside a `<pre>`, and Markdown articles
//! ([`crate::article`], [`crate::markdown`]), whose code blocks are rendered
//! with their gutters already attached. [`crate::run`] drives either over
//! files on disk.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod annotate;
pub mod article;
pub mod config;
pub mod document;
pub mod gutter;
pub mod html;
mod htmlrenderer;
pub mod markdown;
pub mod run;
