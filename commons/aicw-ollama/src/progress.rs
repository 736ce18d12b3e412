use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::{error::OllamaError, types::ProgressResponse};

/// Splits a chunked NDJSON body into progress records.
#[derive(Default)]
pub struct ProgressDecoder {
    buf: BytesMut,
}

impl ProgressDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every complete record it closed.
    pub fn push(
        &mut self,
        chunk: &[u8],
    ) -> Result<Vec<ProgressResponse>, OllamaError> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line = self.buf.split_to(pos);
            self.buf.advance(1);
            if let Some(record) = decode_line(&line)? {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Decodes whatever is left once the body ends without a trailing newline.
    pub fn finish(mut self) -> Result<Option<ProgressResponse>, OllamaError> {
        let rest = self.buf.split();
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<ProgressResponse>, OllamaError> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(trimmed)?))
}

/// Tracks a progress stream until it reports success or an error.
pub(crate) struct ProgressTracker {
    operation: &'static str,
    model: String,
    succeeded: bool,
}

impl ProgressTracker {
    pub(crate) fn new(operation: &'static str, model: &str) -> Self {
        Self {
            operation,
            model: model.to_string(),
            succeeded: false,
        }
    }

    pub(crate) fn observe(
        &mut self,
        record: &ProgressResponse,
    ) -> Result<(), OllamaError> {
        if let Some(err) = &record.error {
            return Err(OllamaError::Remote(err.clone()));
        }
        match (record.completed, record.total) {
            (Some(done), Some(total)) if total > 0 => {
                trace!(
                    model = %self.model,
                    status = record.status.as_deref().unwrap_or(""),
                    done,
                    total,
                    "{} progress",
                    self.operation
                );
            }
            _ => {
                debug!(
                    model = %self.model,
                    status = record.status.as_deref().unwrap_or(""),
                    "{} status",
                    self.operation
                );
            }
        }
        if record.is_success() {
            self.succeeded = true;
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<(), OllamaError> {
        if self.succeeded {
            Ok(())
        } else {
            Err(OllamaError::Incomplete {
                operation: self.operation,
            })
        }
    }
}
