use std::io::{Read, Write};

use tracing::debug;

use crate::document::Document;
use crate::error::ExtractionError;

/// Language tag of the block holding the drawing payload. Matched exactly.
pub const JSON_LANGUAGE: &str = "json";

/// Returns the content of the only `json` fenced block in `input`.
///
/// Blocks nested in quotes or list items count too. The lines are copied as
/// they appear in the source, line endings included.
pub fn extract(input: &[u8]) -> Result<Vec<u8>, ExtractionError> {
    let document = Document::parse(input);

    let mut payload = Vec::new();
    let mut count = 0;
    for node in document.walk() {
        if node.language() != Some(JSON_LANGUAGE) {
            continue;
        }
        count += 1;
        debug!(block = count, lines = node.lines().len(), "found json block");
        for span in node.lines() {
            payload.extend_from_slice(document.line_bytes(span));
        }
    }

    match count {
        1 => Ok(payload),
        0 => Err(ExtractionError::NoMatch),
        count => Err(ExtractionError::MultipleMatches { count }),
    }
}

/// Reads all of `src`, extracts the payload and writes it to `dst`.
///
/// Nothing is written unless extraction succeeds.
pub fn extract_to<W: Write, R: Read>(mut dst: W, mut src: R) -> Result<(), ExtractionError> {
    let mut source = Vec::new();
    src.read_to_end(&mut source)
        .map_err(ExtractionError::Read)?;
    debug!(bytes = source.len(), "read markdown source");

    let payload = extract(&source)?;
    dst.write_all(&payload)
        .and_then(|()| dst.flush())
        .map_err(ExtractionError::Write)?;
    debug!(bytes = payload.len(), "wrote json payload");
    Ok(())
}
