//! Submission transport.
//!
//! The session hands the final [`Payload`] to a [`SubmissionTransport`].
//! Network delivery is the embedding application's concern; the crate
//! ships a writer-backed transport used by the CLI and tests.

use std::io::Write;

use formstage_schema::Payload;
use thiserror::Error;

/// Delivery failure. The session keeps its state when this is returned.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The receiving side refused the payload.
    #[error("submission rejected: {reason}")]
    Rejected { reason: String },

    /// The payload could not be encoded.
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing the payload failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivers a submission payload.
pub trait SubmissionTransport {
    fn submit(&mut self, payload: &Payload) -> Result<(), TransportError>;
}

/// Writes each payload as one JSON line.
#[derive(Debug)]
pub struct JsonWriterTransport<W: Write> {
    writer: W,
    submitted: usize,
}

impl<W: Write> JsonWriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, submitted: 0 }
    }

    /// Number of payloads written so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SubmissionTransport for JsonWriterTransport<W> {
    fn submit(&mut self, payload: &Payload) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.writer, payload)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.submitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstage_core::{Field, FieldType, FormState, Schema};
    use formstage_schema::build_submission_payload;

    #[test]
    fn test_writer_transport_emits_json_lines() {
        let schema = Schema::single_stage(None, vec![Field::new("name", FieldType::Text)]).unwrap();
        let mut state = FormState::new();
        state.insert("name", "Dana");
        let payload = build_submission_payload(&schema, &state);

        let mut transport = JsonWriterTransport::new(Vec::new());
        transport.submit(&payload).unwrap();
        transport.submit(&payload).unwrap();
        assert_eq!(transport.submitted(), 2);
        let out = String::from_utf8(transport.into_inner()).unwrap();
        assert_eq!(out, "{\"name\":\"Dana\"}\n{\"name\":\"Dana\"}\n");
    }
}
