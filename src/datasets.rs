// Copyright 2025
// Licensed under the Elastic License v2.0

//! The logical datasets mirrored from the MedGen release.
//!
//! Each dataset maps one source file onto one production table. The column
//! specs here are the single source of truth for staging DDL, COPY column
//! order, and the CDC join/hash clauses: the parser's record types emit
//! fields in exactly this order.

/// One mirrored MedGen dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Concepts,
    Names,
    Definitions,
    SemanticTypes,
    Relationships,
    SourceLinks,
}

/// A data column of a dataset, in staging/COPY order. `raw_record` is not
/// listed; it is always the trailing column of the staging table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub business_key: bool,
}

const fn col(name: &'static str, business_key: bool) -> ColumnSpec {
    ColumnSpec { name, business_key }
}

const CONCEPTS_COLUMNS: &[ColumnSpec] = &[
    col("cui", true),
    col("preferred_name", false),
    col("definition", false),
];

const NAMES_COLUMNS: &[ColumnSpec] = &[
    col("cui", true),
    col("name", true),
    col("source", true),
    col("term_type", true),
    col("suppressed", false),
];

const DEFINITIONS_COLUMNS: &[ColumnSpec] = &[
    col("cui", true),
    col("definition", false),
    col("source", true),
    col("suppressed", false),
];

const SEMANTIC_TYPES_COLUMNS: &[ColumnSpec] = &[
    col("cui", true),
    col("tui", false),
    col("stn", false),
    col("sty", true),
    col("atui", false),
];

const RELATIONSHIPS_COLUMNS: &[ColumnSpec] = &[
    col("cui1", true),
    col("relationship", true),
    col("cui2", true),
    col("source", true),
    col("relationship_attr", false),
    col("suppressed", false),
];

const SOURCE_LINKS_COLUMNS: &[ColumnSpec] = &[
    col("cui", true),
    col("name", false),
    col("source_id", true),
    col("source", true),
];

impl Dataset {
    /// All datasets in processing order. Concepts load first so that every
    /// other dataset's CUIs refer to an already-refreshed concept set.
    pub const ALL: [Dataset; 6] = [
        Dataset::Concepts,
        Dataset::Names,
        Dataset::Definitions,
        Dataset::SemanticTypes,
        Dataset::Relationships,
        Dataset::SourceLinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Concepts => "concepts",
            Dataset::Names => "names",
            Dataset::Definitions => "definitions",
            Dataset::SemanticTypes => "semantic_types",
            Dataset::Relationships => "relationships",
            Dataset::SourceLinks => "source_links",
        }
    }

    /// File name within the MedGen release (a `.gz` sibling is accepted).
    pub fn source_file(&self) -> &'static str {
        match self {
            Dataset::Concepts | Dataset::Names => "MRCONSO.RRF",
            Dataset::Definitions => "MGDEF.RRF",
            Dataset::SemanticTypes => "MRSTY.RRF",
            Dataset::Relationships => "MRREL.RRF",
            Dataset::SourceLinks => "MedGenIDMappings.txt",
        }
    }

    /// Production table name. Stable across runs; mutated only inside the
    /// apply transaction.
    pub fn production_table(&self) -> &'static str {
        self.as_str()
    }

    pub fn staging_table(&self) -> String {
        format!("staging_{}", self.as_str())
    }

    pub fn cdc_inserts_table(&self) -> String {
        format!("cdc_inserts_{}", self.as_str())
    }

    pub fn cdc_updates_table(&self) -> String {
        format!("cdc_updates_{}", self.as_str())
    }

    pub fn cdc_deletes_table(&self) -> String {
        format!("cdc_deletes_{}", self.as_str())
    }

    pub fn backup_table(&self) -> String {
        format!("{}_backup", self.production_table())
    }

    /// Data columns in staging/COPY order (without `raw_record`).
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            Dataset::Concepts => CONCEPTS_COLUMNS,
            Dataset::Names => NAMES_COLUMNS,
            Dataset::Definitions => DEFINITIONS_COLUMNS,
            Dataset::SemanticTypes => SEMANTIC_TYPES_COLUMNS,
            Dataset::Relationships => RELATIONSHIPS_COLUMNS,
            Dataset::SourceLinks => SOURCE_LINKS_COLUMNS,
        }
    }

    /// The business-key column names, in column order.
    pub fn business_key(&self) -> Vec<&'static str> {
        self.columns()
            .iter()
            .filter(|c| c.business_key)
            .map(|c| c.name)
            .collect()
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_order_starts_with_concepts() {
        assert_eq!(Dataset::ALL[0], Dataset::Concepts);
        assert_eq!(Dataset::ALL.len(), 6);
    }

    #[test]
    fn test_business_keys() {
        assert_eq!(Dataset::Concepts.business_key(), vec!["cui"]);
        assert_eq!(
            Dataset::Names.business_key(),
            vec!["cui", "name", "source", "term_type"]
        );
        assert_eq!(Dataset::Definitions.business_key(), vec!["cui", "source"]);
        assert_eq!(Dataset::SemanticTypes.business_key(), vec!["cui", "sty"]);
        assert_eq!(
            Dataset::Relationships.business_key(),
            vec!["cui1", "relationship", "cui2", "source"]
        );
        assert_eq!(
            Dataset::SourceLinks.business_key(),
            vec!["cui", "source_id", "source"]
        );
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Dataset::SemanticTypes.production_table(), "semantic_types");
        assert_eq!(Dataset::SemanticTypes.staging_table(), "staging_semantic_types");
        assert_eq!(Dataset::Concepts.cdc_inserts_table(), "cdc_inserts_concepts");
        assert_eq!(Dataset::Concepts.cdc_deletes_table(), "cdc_deletes_concepts");
        assert_eq!(Dataset::Concepts.backup_table(), "concepts_backup");
    }

    #[test]
    fn test_shared_source_file() {
        // concepts and names are both cut from MRCONSO
        assert_eq!(Dataset::Concepts.source_file(), Dataset::Names.source_file());
    }

    #[test]
    fn test_every_dataset_has_a_business_key() {
        for ds in Dataset::ALL {
            assert!(!ds.business_key().is_empty(), "{} has no business key", ds);
        }
    }
}
