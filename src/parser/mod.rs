// Copyright 2025
// Licensed under the Elastic License v2.0

//! Streaming parsers for the MedGen release files.
//!
//! All MedGen files are pipe-delimited text, optionally gzipped, with an
//! optional `#`-prefixed header line and usually a trailing delimiter on
//! every row. The reader yields one typed record per data row and skips
//! malformed rows until the error budget runs out; the budget exhausting is
//! a data error that aborts the run before anything reaches production.

pub mod records;

use std::io::BufRead;
use std::marker::PhantomData;

use anyhow::Result;
use memchr::memchr_iter;
use tracing::warn;

use crate::error::EtlError;
use records::Record;

/// Tolerance for malformed source rows. Each skipped row consumes one unit;
/// going over the limit turns into a `Data` error.
#[derive(Debug)]
pub struct ErrorBudget {
    max: u64,
    seen: u64,
}

impl ErrorBudget {
    pub fn new(max: u64) -> Self {
        Self { max, seen: 0 }
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }

    fn record(&mut self, file: &str, line_no: u64, reason: &str) -> Result<(), EtlError> {
        warn!("Skipping malformed row {} in {}: {}", line_no, file, reason);
        self.seen += 1;
        if self.seen > self.max {
            Err(EtlError::data(format!(
                "exceeded maximum parse errors ({}) in {}",
                self.max, file
            )))
        } else {
            Ok(())
        }
    }
}

/// Split a row on `|`, trimming each field. MedGen rows end with a trailing
/// delimiter, so surplus empty fields beyond `expected` are dropped.
fn split_row(line: &str, expected: usize) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(expected + 1);
    let mut start = 0usize;
    for pos in memchr_iter(b'|', bytes) {
        fields.push(line[start..pos].trim());
        start = pos + 1;
    }
    fields.push(line[start..].trim());
    while fields.len() > expected && fields.last() == Some(&"") {
        fields.pop();
    }
    fields
}

/// Iterator of typed records over one source file.
pub struct RecordReader<R, T> {
    reader: R,
    budget: ErrorBudget,
    line: String,
    line_no: u64,
    done: bool,
    _record: PhantomData<T>,
}

/// Stream records of type `T` out of `reader`, skipping up to `max_errors`
/// malformed rows.
pub fn records<T: Record, R: BufRead>(reader: R, max_errors: u64) -> RecordReader<R, T> {
    RecordReader {
        reader,
        budget: ErrorBudget::new(max_errors),
        line: String::new(),
        line_no: 0,
        done: false,
        _record: PhantomData,
    }
}

impl<R: BufRead, T: Record> Iterator for RecordReader<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(EtlError::load_with_cause(
                        format!("failed to read {}", T::dataset().source_file()),
                        e,
                    )
                    .into()));
                }
            }
            self.line_no += 1;

            let raw = self.line.trim_end_matches(['\r', '\n']);
            if raw.trim().is_empty() || raw.starts_with('#') {
                continue;
            }

            let fields = split_row(raw, T::source_columns());
            if fields.len() != T::source_columns() {
                let reason = format!(
                    "expected {} columns, found {}",
                    T::source_columns(),
                    fields.len()
                );
                let file = T::dataset().source_file();
                let line_no = self.line_no;
                if let Err(e) = self.budget.record(file, line_no, &reason) {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                continue;
            }

            match T::from_row(&fields, raw) {
                Some(record) => return Some(Ok(record)),
                // structurally valid but filtered out (e.g. non-preferred atoms)
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::records::*;
    use super::*;
    use std::io::Cursor;

    const MRCONSO_PREF: &str = "C0001|ENG|P|L0001|PF|S0001|Y|A0001|||M0001|MSH|PT|D000001|Asthma|0|N||";
    const MRCONSO_VARIANT: &str = "C0001|ENG|S|L0002|VO|S0002|N|A0002|||M0001|MSH|SY|D000001|Asthma NOS|0|N||";

    #[test]
    fn test_split_row_trailing_delimiter() {
        let fields = split_row("a|b|c|", 3);
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_row_keeps_inner_empties() {
        let fields = split_row("a||c|", 3);
        assert_eq!(fields, vec!["a", "", "c"]);
    }

    #[test]
    fn test_concepts_filter_keeps_preferred_atom_only() {
        let input = format!("{}\n{}\n", MRCONSO_PREF, MRCONSO_VARIANT);
        let recs: Vec<_> = records::<ConceptRecord, _>(Cursor::new(input), 0)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].cui, "C0001");
        assert_eq!(recs[0].preferred_name, "Asthma");
        assert_eq!(recs[0].definition, None);
        assert_eq!(recs[0].raw_record, MRCONSO_PREF);
    }

    #[test]
    fn test_names_keeps_every_atom() {
        let input = format!("{}\n{}\n", MRCONSO_PREF, MRCONSO_VARIANT);
        let recs: Vec<_> = records::<NameRecord, _>(Cursor::new(input), 0)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].name, "Asthma");
        assert_eq!(recs[0].source, "MSH");
        assert_eq!(recs[0].term_type, "PT");
        assert_eq!(recs[1].term_type, "SY");
    }

    #[test]
    fn test_header_and_blank_lines_skipped() {
        let input = "#CUI|pref_name|source_id|source|\n\nC0001|Asthma|D001249|MeSH|\n";
        let recs: Vec<_> = records::<SourceLinkRecord, _>(Cursor::new(input), 0)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].source_id, "D001249");
        assert_eq!(recs[0].source, "MeSH");
    }

    #[test]
    fn test_definitions_optional_fields() {
        let input = "C0001|An inflammatory airway disease.|MSH|N|\nC0002||HPO||\n";
        let recs: Vec<_> = records::<DefinitionRecord, _>(Cursor::new(input), 0)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert!(recs[0].definition.is_some());
        assert_eq!(recs[1].definition, None);
        assert_eq!(recs[1].suppressed, None);
    }

    #[test]
    fn test_semantic_types_row() {
        let input = "C0001|T047|B2.2.1.2.1|Disease or Syndrome|AT17683839|256|\n";
        let recs: Vec<_> = records::<SemanticTypeRecord, _>(Cursor::new(input), 0)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(recs[0].sty, "Disease or Syndrome");
        assert_eq!(recs[0].tui, "T047");
        assert_eq!(recs[0].atui.as_deref(), Some("AT17683839"));
    }

    #[test]
    fn test_relationships_row() {
        let input = "C0001|A0001|SCUI|RB|C0002|A0002|SCUI|inverse_isa|R1111||MSH|MSH|||N||\n";
        let recs: Vec<_> = records::<RelationshipRecord, _>(Cursor::new(input), 0)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(recs[0].cui1, "C0001");
        assert_eq!(recs[0].relationship, "RB");
        assert_eq!(recs[0].cui2, "C0002");
        assert_eq!(recs[0].source, "MSH");
        assert_eq!(recs[0].relationship_attr.as_deref(), Some("inverse_isa"));
    }

    #[test]
    fn test_malformed_rows_skipped_within_budget() {
        let input = format!("bad|row\n{}\n", MRCONSO_PREF);
        let recs: Vec<_> = records::<ConceptRecord, _>(Cursor::new(input), 5)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn test_budget_exhaustion_is_data_error_and_fuses() {
        let input = "bad|row\nworse|row\n";
        let mut iter = records::<ConceptRecord, _>(Cursor::new(input), 1);
        let err = loop {
            match iter.next() {
                Some(Err(e)) => break e,
                Some(Ok(_)) => panic!("no valid rows in input"),
                None => panic!("expected an error before EOF"),
            }
        };
        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::Data { .. })
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_error_budget_counts() {
        let mut budget = ErrorBudget::new(2);
        assert!(budget.record("F", 1, "x").is_ok());
        assert!(budget.record("F", 2, "x").is_ok());
        assert!(budget.record("F", 3, "x").is_err());
        assert_eq!(budget.seen(), 3);
    }
}
