//! `clearpoint-recon`: bank statement reconciliation against clearing reports.
//!
//! Pure engine crate: receives the statement text and pre-loaded channel
//! tables, returns matched, classified and summarised results plus the
//! report model. No CLI or file IO.

pub mod aggregate;
pub mod classify;
pub mod clearing;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod report;
pub mod statement;
pub mod table;

pub use config::ReconConfig;
pub use engine::{compare_periods, run};
pub use error::ReconError;
pub use model::{Channel, PeriodResult, ReconInput, ReconResult};
pub use report::{build_period_report, build_report, ReconReport, ReportCell, SheetData};
pub use table::{Cell, Table};
