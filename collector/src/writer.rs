//! Output document persistence.

use digest_core::{CoreError, TimeframeDocument};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Pretty JSON with four-space indentation; non-ASCII is kept verbatim.
pub fn encode_document(document: &TimeframeDocument) -> Result<Vec<u8>, CoreError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Replaces the file at `path` in full. The document is encoded before the
/// file is touched, but the write itself is not atomic.
pub async fn write_document(path: &Path, document: &TimeframeDocument) -> Result<(), CoreError> {
    let bytes = encode_document(document)?;
    tokio::fs::write(path, &bytes).await?;
    info!(
        path = %path.display(),
        records = document.total_records(),
        bytes = bytes.len(),
        "Wrote output document"
    );
    Ok(())
}

pub async fn read_document(path: &Path) -> Result<TimeframeDocument, CoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
