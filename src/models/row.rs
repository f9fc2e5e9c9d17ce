//! CSV rows keyed by header column

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Value};

use crate::error::AppResult;

/// One CSV record as a JSON document, keyed by header column.
pub type Row = Map<String, Value>;

/// Streams a CSV source as [`Row`]s, one record at a time.
///
/// Short records fill the missing columns with `null`; values beyond the
/// last header column are dropped.
pub struct CsvRows<R: Read> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    record: StringRecord,
}

impl<R: Read> CsvRows<R> {
    /// Wraps `source` and reads its header line.
    ///
    /// # Errors
    ///
    /// Returns an error if the header line cannot be read.
    pub fn new(source: R) -> AppResult<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    fn to_row(&self) -> Row {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let value = self
                    .record
                    .get(i)
                    .map_or(Value::Null, |v| Value::String(v.to_owned()));
                (column.to_owned(), value)
            })
            .collect()
    }
}

impl<R: Read> Iterator for CsvRows<R> {
    type Item = AppResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self.to_row())),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}
