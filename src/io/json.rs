//! Full-run JSON export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::app::pipeline::PipelineOutput;
use crate::error::AppError;

/// Write the whole pipeline output as pretty-printed JSON.
pub fn write_output_json(path: &Path, output: &PipelineOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create output JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), output)
        .map_err(|e| AppError::new(4, format!("Failed to write output JSON: {e}")))?;

    Ok(())
}
