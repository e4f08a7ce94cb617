//! Where the mastery dataset comes from

use std::path::PathBuf;

use crate::core::Result;
use crate::stack::record::{parse_records, StackRecord};

/// Supplies mastery records at initialization
pub trait StackDataSource {
    /// Produce the full, unsorted record list
    fn load(&self) -> Result<Vec<StackRecord>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// JSON text already in memory, e.g. a bundled asset
#[derive(Clone, Debug)]
pub struct InlineJson(pub String);

impl StackDataSource for InlineJson {
    fn load(&self) -> Result<Vec<StackRecord>> {
        parse_records(&self.0)
    }

    fn describe(&self) -> String {
        format!("inline JSON ({} bytes)", self.0.len())
    }
}

/// JSON file on disk
#[derive(Clone, Debug)]
pub struct JsonFile(pub PathBuf);

impl StackDataSource for JsonFile {
    fn load(&self) -> Result<Vec<StackRecord>> {
        let json = std::fs::read_to_string(&self.0)?;
        parse_records(&json)
    }

    fn describe(&self) -> String {
        self.0.display().to_string()
    }
}

impl StackDataSource for Vec<StackRecord> {
    fn load(&self) -> Result<Vec<StackRecord>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} records", self.len())
    }
}
