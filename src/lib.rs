//! Lyrics analysis library - shared modules for all binaries.

pub mod compare;
pub mod config;
pub mod critique;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod phonetics;
pub mod progress;
pub mod report;
pub mod safety;
pub mod scoring;
pub mod tagger;
pub mod taste;
