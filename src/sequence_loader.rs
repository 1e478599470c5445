use crate::error::{OligostoreError, Result};
use bio::io::fasta;
use gb_io::reader::SeqReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceFormat {
    Fasta,
    Genbank,
}

impl SequenceFormat {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "fasta" => Ok(SequenceFormat::Fasta),
            "genbank" => Ok(SequenceFormat::Genbank),
            other => Err(OligostoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SequenceFormat::Fasta => write!(f, "fasta"),
            SequenceFormat::Genbank => write!(f, "genbank"),
        }
    }
}

/// One template record out of a FASTA or GenBank file.
/// Immutable once loaded; a single file may contain many records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    id: String,
    sequence: String,
}

impl SequenceRecord {
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, sequence: S2) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    fn from_genbank_seq(seq: gb_io::seq::Seq, index: usize) -> Self {
        let id = seq
            .name
            .clone()
            .or_else(|| seq.accession.clone())
            .unwrap_or_else(|| format!("record_{index}"));
        Self {
            id,
            sequence: String::from_utf8_lossy(&seq.seq).into_owned(),
        }
    }
}

/// Lazy, forward-only pass over the records of one open file. Obtained from
/// `SequenceSource::records`; not restartable, ask the source for a new one.
pub enum RecordReader {
    Fasta(fasta::Records<BufReader<File>>),
    Genbank {
        reader: SeqReader<File>,
        next_index: usize,
    },
}

impl Iterator for RecordReader {
    type Item = Result<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordReader::Fasta(records) => records.next().map(|record| {
                let record = record?;
                Ok(SequenceRecord {
                    id: record.id().to_string(),
                    sequence: String::from_utf8_lossy(record.seq()).into_owned(),
                })
            }),
            RecordReader::Genbank { reader, next_index } => reader.next().map(|seq| match seq {
                Ok(seq) => {
                    let index = *next_index;
                    *next_index += 1;
                    Ok(SequenceRecord::from_genbank_seq(seq, index))
                }
                Err(err) => Err(OligostoreError::Parse(err.to_string())),
            }),
        }
    }
}

/// Restartable record factory: a path plus its declared format. Every
/// `records` call opens the file afresh, so repeated scans of the same
/// upload each get their own single-pass reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSource {
    path: PathBuf,
    format: SequenceFormat,
}

impl SequenceSource {
    pub fn new<P: Into<PathBuf>>(path: P, format: SequenceFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SequenceFormat {
        self.format
    }

    pub fn records(&self) -> Result<RecordReader> {
        let file = File::open(&self.path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                OligostoreError::NotFound(format!("Sequence file {}", self.path.display()))
            } else {
                OligostoreError::Io(err)
            }
        })?;
        Ok(match self.format {
            SequenceFormat::Fasta => RecordReader::Fasta(fasta::Reader::new(file).records()),
            SequenceFormat::Genbank => RecordReader::Genbank {
                reader: SeqReader::new(file),
                next_index: 0,
            },
        })
    }

    /// Materializes every record. Convenience for small files; large
    /// collections should iterate `records` instead.
    pub fn load(&self) -> Result<Vec<SequenceRecord>> {
        self.records()?.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fasta(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("templates.fa");
        let mut file = File::create(&path).unwrap();
        writeln!(file, ">seq1 first template").unwrap();
        writeln!(file, "AAACCCGGGTTT").unwrap();
        writeln!(file, ">seq2").unwrap();
        writeln!(file, "ACGTACGT").unwrap();
        path
    }

    #[test]
    fn fasta_records_keep_file_order_and_ids() {
        let dir = tempfile::tempdir().unwrap();
        let source = SequenceSource::new(write_fasta(&dir), SequenceFormat::Fasta);
        let records = source.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "seq1");
        assert_eq!(records[0].sequence(), "AAACCCGGGTTT");
        assert_eq!(records[1].id(), "seq2");
        assert_eq!(records[1].sequence(), "ACGTACGT");
    }

    #[test]
    fn source_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let source = SequenceSource::new(write_fasta(&dir), SequenceFormat::Fasta);
        let first = source.load().unwrap();
        let second = source.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn genbank_records_take_the_locus_name() {
        let source = SequenceSource::new("test_files/demo_template.gb", SequenceFormat::Genbank);
        let records = source.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "demo_template");
        assert!(records[0].sequence().to_uppercase().starts_with("AAACCC"));
    }

    #[test]
    fn unknown_format_tag_is_rejected() {
        let err = SequenceFormat::from_tag("embl").unwrap_err();
        assert!(matches!(err, OligostoreError::UnsupportedFormat(tag) if tag == "embl"));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let source = SequenceSource::new("test_files/does_not_exist.fa", SequenceFormat::Fasta);
        let err = source.load().unwrap_err();
        assert!(matches!(err, OligostoreError::NotFound(_)));
        assert!(err.to_string().ends_with("not found"));
    }
}
