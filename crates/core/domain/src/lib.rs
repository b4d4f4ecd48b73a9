pub mod data;

pub use data::{Batch, Envelope, Measurement, RawReport, ReportMessage};
