//! Core library for the price-template-tools command line application.
//!
//! Marketplace price exports arrive as Excel or CSV files with their own
//! column layouts. The library maps them onto one fixed pricing template and
//! delivers the merged table either as a styled workbook or as rows appended
//! to a shared Google spreadsheet. Source adapters and the workbook writer
//! live under [`io`], the template schema in [`model`], the column mapping in
//! [`normalize`], the spreadsheet upload in [`remote`], and the per-run
//! orchestration in [`sync`].

pub mod error;
pub mod form;
pub mod io;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod remote;
pub mod sync;

pub use error::{Result, ToolError};
