use crate::adapters::{GeometryMode, OutputFormat};
use crate::core::validator::ColumnNames;
use crate::domain::model::{BatchResult, ConversionReport, Direction, RawInput};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::io::{Read, Seek};

/// A readable, rewindable input. The pipeline scans it once for encoding
/// problems, rewinds it and then reads rows from it one at a time.
pub trait InputStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> InputStream for T {}

pub trait Storage: Send + Sync {
    fn open_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Box<dyn InputStream>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    /// Output path without extension; every written file derives from it.
    fn output_base(&self) -> String;
    fn direction(&self) -> Direction;
    /// `None` selects the registry's default zone.
    fn zone(&self) -> Option<&str>;
    fn output_formats(&self) -> Vec<OutputFormat>;
    fn geometry(&self) -> GeometryMode;
    /// Fixed number of decimals for computed values; `None` keeps full precision.
    fn decimals(&self) -> Option<usize>;
    fn columns(&self) -> ColumnNames;
    fn delimiter(&self) -> u8;
    fn document_name(&self) -> String;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawInput>;
    async fn transform(&self, input: RawInput) -> Result<BatchResult>;
    async fn load(&self, result: BatchResult) -> Result<ConversionReport>;
}
