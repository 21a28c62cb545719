// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod config;
pub mod error;
pub mod event;
pub mod pii;

pub use error::{ConfigProblem, PiiError, PiiResult};
