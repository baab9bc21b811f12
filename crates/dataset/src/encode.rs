//! On-disk encoding shared by the file-based sinks

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use contracts::OutputFormat;
use serde::Serialize;

use crate::error::DatasetError;

/// Serialize `value` to `path` in the given format
pub fn write_encoded<T: Serialize>(
    path: &Path,
    value: &T,
    format: OutputFormat,
) -> Result<(), DatasetError> {
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, value)
            .map_err(|e| DatasetError::Encode(e.to_string()))?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, value)
            .map_err(|e| DatasetError::Encode(e.to_string()))?,
    }
    writer.flush()?;
    Ok(())
}

/// File-system safe form of an episode id
pub fn file_name_for(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
