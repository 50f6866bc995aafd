pub mod batch;
pub mod engine;
pub mod pipeline;
pub mod validator;

pub use crate::domain::model::{BatchResult, ConversionReport, RawInput, Record};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
