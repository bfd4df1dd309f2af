//! Fetch a news page, strip the boilerplate and report the article as JSON.
//!
//! The binary prints exactly one JSON line per run. Failures after argument
//! parsing all collapse to `{}` so callers can treat it as "skip this URL".

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod scraper;
