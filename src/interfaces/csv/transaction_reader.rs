use crate::application::submission::TransactionRequest;
use crate::error::{PipelineError, Result};
use std::io::Read;

/// Reads transaction requests from a CSV source.
///
/// Expects a `from_account,to_account,amount,currency` header. Whitespace
/// around fields is trimmed and each malformed row surfaces as its own error
/// without ending the stream.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransactionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes requests, one per row.
    pub fn requests(self) -> impl Iterator<Item = Result<TransactionRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PipelineError::from))
    }
}
