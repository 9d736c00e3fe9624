pub mod audit;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod grading;
pub mod models;
pub mod session;

pub use client::{AutoGradeOptions, AutoGradeOutcome, Client, GradedStudent};
pub use error::{ClientError, ErrorKind, Result};
