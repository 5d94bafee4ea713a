//! Core engine: the crawl → review → filter → budget → enter loop.

pub mod acquisition;
pub mod cursor;
pub mod report;
pub mod reviews;
pub mod submitter;
