// Copyright 2025
// Licensed under the Elastic License v2.0

//! Typed records for each mirrored dataset.
//!
//! A record owns the parsed field values plus the exact original line
//! (`raw_record`), which travels with the row into staging so production can
//! retain the source bytes verbatim. `copy_fields` must emit values in the
//! dataset's staging column order — the encoder asserts the count.

use crate::datasets::Dataset;

/// One parsed row of a MedGen source file.
pub trait Record: Sized + Send + 'static {
    /// Dataset this record feeds.
    fn dataset() -> Dataset;

    /// Number of data columns in the source file (before the trailing
    /// delimiter).
    fn source_columns() -> usize;

    /// Build a record from a split row. `None` means the row is structurally
    /// valid but filtered out for this dataset.
    fn from_row(fields: &[&str], raw: &str) -> Option<Self>;

    /// Data column values in staging order; `None` becomes SQL NULL.
    fn copy_fields(&self) -> Vec<Option<&str>>;

    /// The unmodified source line.
    fn raw_record(&self) -> &str;
}

fn opt(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

// MRCONSO.RRF column positions (18 columns):
// CUI|LAT|TS|LUI|STT|SUI|ISPREF|AUI|SAUI|SCUI|SDUI|SAB|TTY|CODE|STR|SRL|SUPPRESS|CVF
const MRCONSO_COLUMNS: usize = 18;

/// A concept: the preferred English atom of a CUI.
///
/// MRCONSO carries no definition text; `definition` stays NULL and consumers
/// join the `definitions` dataset by `cui`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptRecord {
    pub cui: String,
    pub preferred_name: String,
    pub definition: Option<String>,
    pub raw_record: String,
}

impl Record for ConceptRecord {
    fn dataset() -> Dataset {
        Dataset::Concepts
    }

    fn source_columns() -> usize {
        MRCONSO_COLUMNS
    }

    fn from_row(fields: &[&str], raw: &str) -> Option<Self> {
        // one atom per concept: the preferred English term
        if fields[1] != "ENG" || fields[2] != "P" || fields[4] != "PF" || fields[6] != "Y" {
            return None;
        }
        Some(Self {
            cui: fields[0].to_string(),
            preferred_name: fields[14].to_string(),
            definition: None,
            raw_record: raw.to_string(),
        })
    }

    fn copy_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            Some(&self.preferred_name),
            self.definition.as_deref(),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}

/// A term variant: every atom of MRCONSO, preferred or not.
#[derive(Debug, Clone, PartialEq)]
pub struct NameRecord {
    pub cui: String,
    pub name: String,
    pub source: String,
    pub term_type: String,
    pub suppressed: Option<String>,
    pub raw_record: String,
}

impl Record for NameRecord {
    fn dataset() -> Dataset {
        Dataset::Names
    }

    fn source_columns() -> usize {
        MRCONSO_COLUMNS
    }

    fn from_row(fields: &[&str], raw: &str) -> Option<Self> {
        Some(Self {
            cui: fields[0].to_string(),
            name: fields[14].to_string(),
            source: fields[11].to_string(),
            term_type: fields[12].to_string(),
            suppressed: opt(fields[16]),
            raw_record: raw.to_string(),
        })
    }

    fn copy_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            Some(&self.name),
            Some(&self.source),
            Some(&self.term_type),
            self.suppressed.as_deref(),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}

// MGDEF.RRF: CUI|DEF|source|SUPPRESS
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRecord {
    pub cui: String,
    pub definition: Option<String>,
    pub source: String,
    pub suppressed: Option<String>,
    pub raw_record: String,
}

impl Record for DefinitionRecord {
    fn dataset() -> Dataset {
        Dataset::Definitions
    }

    fn source_columns() -> usize {
        4
    }

    fn from_row(fields: &[&str], raw: &str) -> Option<Self> {
        Some(Self {
            cui: fields[0].to_string(),
            definition: opt(fields[1]),
            source: fields[2].to_string(),
            suppressed: opt(fields[3]),
            raw_record: raw.to_string(),
        })
    }

    fn copy_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            self.definition.as_deref(),
            Some(&self.source),
            self.suppressed.as_deref(),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}

// MRSTY.RRF: CUI|TUI|STN|STY|ATUI|CVF
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticTypeRecord {
    pub cui: String,
    pub tui: String,
    pub stn: String,
    pub sty: String,
    pub atui: Option<String>,
    pub raw_record: String,
}

impl Record for SemanticTypeRecord {
    fn dataset() -> Dataset {
        Dataset::SemanticTypes
    }

    fn source_columns() -> usize {
        6
    }

    fn from_row(fields: &[&str], raw: &str) -> Option<Self> {
        Some(Self {
            cui: fields[0].to_string(),
            tui: fields[1].to_string(),
            stn: fields[2].to_string(),
            sty: fields[3].to_string(),
            atui: opt(fields[4]),
            raw_record: raw.to_string(),
        })
    }

    fn copy_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            Some(&self.tui),
            Some(&self.stn),
            Some(&self.sty),
            self.atui.as_deref(),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}

// MRREL.RRF column positions (16 columns):
// CUI1|AUI1|STYPE1|REL|CUI2|AUI2|STYPE2|RELA|RUI|SRUI|SAB|SL|RG|DIR|SUPPRESS|CVF
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipRecord {
    pub cui1: String,
    pub relationship: String,
    pub cui2: String,
    pub source: String,
    pub relationship_attr: Option<String>,
    pub suppressed: Option<String>,
    pub raw_record: String,
}

impl Record for RelationshipRecord {
    fn dataset() -> Dataset {
        Dataset::Relationships
    }

    fn source_columns() -> usize {
        16
    }

    fn from_row(fields: &[&str], raw: &str) -> Option<Self> {
        Some(Self {
            cui1: fields[0].to_string(),
            relationship: fields[3].to_string(),
            cui2: fields[4].to_string(),
            source: fields[10].to_string(),
            relationship_attr: opt(fields[7]),
            suppressed: opt(fields[14]),
            raw_record: raw.to_string(),
        })
    }

    fn copy_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui1),
            Some(&self.relationship),
            Some(&self.cui2),
            Some(&self.source),
            self.relationship_attr.as_deref(),
            self.suppressed.as_deref(),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}

// MedGenIDMappings.txt: CUI|pref_name|source_id|source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLinkRecord {
    pub cui: String,
    pub name: String,
    pub source_id: String,
    pub source: String,
    pub raw_record: String,
}

impl Record for SourceLinkRecord {
    fn dataset() -> Dataset {
        Dataset::SourceLinks
    }

    fn source_columns() -> usize {
        4
    }

    fn from_row(fields: &[&str], raw: &str) -> Option<Self> {
        Some(Self {
            cui: fields[0].to_string(),
            name: fields[1].to_string(),
            source_id: fields[2].to_string(),
            source: fields[3].to_string(),
            raw_record: raw.to_string(),
        })
    }

    fn copy_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.cui),
            Some(&self.name),
            Some(&self.source_id),
            Some(&self.source),
        ]
    }

    fn raw_record(&self) -> &str {
        &self.raw_record
    }
}
