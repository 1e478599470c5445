use crate::error::Result;
use crate::sequence_loader::{SequenceRecord, SequenceSource};
use crate::sequence_text::reverse_complement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mismatch budget used by callers that do not specify one.
pub const DEFAULT_MAX_MISMATCHES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One primer binding site on a template record.
/// `start`/`end` are 0-based, end-exclusive; `end - start` equals the
/// primer length. Hits are plain values, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingHit {
    pub record_id: String,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    pub mismatches: usize,
}

/// Per-offset mismatch counts for every window of `primer`'s length over
/// `template`. Computed as a transposed accumulator: the outer loop walks
/// primer positions and the inner loop walks the matching template diagonal,
/// so the template is only ever read in linear runs.
fn mismatch_counts(template: &[u8], primer: &[u8]) -> Vec<u32> {
    let n = template.len();
    let k = primer.len();
    if k == 0 || k > n {
        return Vec::new();
    }
    let candidates = n - k + 1;
    let mut counts = vec![0u32; candidates];
    for (j, &base) in primer.iter().enumerate() {
        for (count, &t) in counts.iter_mut().zip(&template[j..j + candidates]) {
            if t != base {
                *count += 1;
            }
        }
    }
    counts
}

/// Scans one strand of a single template for windows within the mismatch
/// budget. With `require_3prime_match`, a window whose final base differs
/// from the primer's 3'-most base is rejected before the budget is
/// consulted: a 3' mismatch blocks polymerase extension no matter how good
/// the rest of the alignment is. On the reverse strand the caller passes the
/// reverse complement of the primer, so its last character is still the
/// biological 3' end and the same rule applies unchanged.
///
/// `record_id` is left empty; the locator stamps it.
pub fn scan_sequence(
    template: &str,
    primer: &str,
    strand: Strand,
    max_mismatches: usize,
    require_3prime_match: bool,
) -> Vec<BindingHit> {
    let template = template.as_bytes();
    let primer = primer.as_bytes();
    let k = primer.len();
    let counts = mismatch_counts(template, primer);

    let mut hits = Vec::new();
    for (start, &mismatches) in counts.iter().enumerate() {
        if require_3prime_match && template[start + k - 1] != primer[k - 1] {
            continue;
        }
        if mismatches as usize <= max_mismatches {
            hits.push(BindingHit {
                record_id: String::new(),
                start,
                end: start + k,
                strand,
                mismatches: mismatches as usize,
            });
        }
    }
    hits
}

fn scan_record(
    record: &SequenceRecord,
    primer: &str,
    primer_rc: &str,
    max_mismatches: usize,
    block_3prime_mismatch: bool,
    out: &mut Vec<BindingHit>,
) {
    let template = record.sequence().to_uppercase();
    let forward = scan_sequence(
        &template,
        primer,
        Strand::Forward,
        max_mismatches,
        block_3prime_mismatch,
    );
    let reverse = scan_sequence(
        &template,
        primer_rc,
        Strand::Reverse,
        max_mismatches,
        block_3prime_mismatch,
    );
    for mut hit in forward.into_iter().chain(reverse) {
        hit.record_id = record.id().to_string();
        out.push(hit);
    }
}

/// Scans both strands of every record, in record order. Within a record,
/// forward-strand hits precede reverse-strand hits; across records, all hits
/// of an earlier record precede those of a later one. No deduplication, no
/// sorting beyond that insertion order.
pub fn find_binding_sites(
    primer_sequence: &str,
    records: &[SequenceRecord],
    max_mismatches: usize,
    block_3prime_mismatch: bool,
) -> Vec<BindingHit> {
    let primer = primer_sequence.to_uppercase();
    let primer_rc = reverse_complement(&primer);
    let mut hits = Vec::new();
    for record in records {
        scan_record(
            record,
            &primer,
            &primer_rc,
            max_mismatches,
            block_3prime_mismatch,
            &mut hits,
        );
    }
    hits
}

/// Like `find_binding_sites`, but streams records out of a `SequenceSource`
/// one at a time, so memory stays bounded by the largest single record.
/// Loader errors abort the scan.
pub fn analyze_primer_binding(
    primer_sequence: &str,
    source: &SequenceSource,
    max_mismatches: usize,
    block_3prime_mismatch: bool,
) -> Result<Vec<BindingHit>> {
    let primer = primer_sequence.to_uppercase();
    let primer_rc = reverse_complement(&primer);
    let mut hits = Vec::new();
    for record in source.records()? {
        let record = record?;
        scan_record(
            &record,
            &primer,
            &primer_rc,
            max_mismatches,
            block_3prime_mismatch,
            &mut hits,
        );
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(hits: &[BindingHit]) -> Vec<usize> {
        hits.iter().map(|h| h.start).collect()
    }

    #[test]
    fn exact_scan_finds_every_occurrence_in_order() {
        let hits = scan_sequence("ACGTACGT", "ACGT", Strand::Forward, 0, true);
        assert_eq!(starts(&hits), vec![0, 4]);
        for hit in &hits {
            assert_eq!(hit.mismatches, 0);
            assert_eq!(hit.end, hit.start + 4);
        }
    }

    #[test]
    fn mismatch_counts_match_the_naive_definition() {
        let template = b"ACGTTGCA";
        let primer = b"ACG";
        let counts = mismatch_counts(template, primer);
        assert_eq!(counts.len(), 6);
        for (i, &count) in counts.iter().enumerate() {
            let naive = primer
                .iter()
                .zip(&template[i..i + primer.len()])
                .filter(|(p, t)| p != t)
                .count();
            assert_eq!(count as usize, naive, "offset {i}");
        }
    }

    #[test]
    fn budget_admits_inexact_windows() {
        let hits = scan_sequence("AAAA", "AAT", Strand::Forward, 1, false);
        assert_eq!(starts(&hits), vec![0, 1]);
        assert!(hits.iter().all(|h| h.mismatches == 1));
    }

    #[test]
    fn three_prime_mismatch_disqualifies_within_budget() {
        // One mismatch, within budget, but it sits on the 3' base.
        let gated = scan_sequence("AAAA", "AAT", Strand::Forward, 1, true);
        assert!(gated.is_empty());

        let ungated = scan_sequence("AAAA", "AAT", Strand::Forward, 1, false);
        assert_eq!(ungated.len(), 2);
    }

    #[test]
    fn primer_longer_than_template_yields_no_hits() {
        assert!(scan_sequence("ACG", "ACGTACGT", Strand::Forward, 3, true).is_empty());
    }

    #[test]
    fn empty_primer_yields_no_hits() {
        assert!(scan_sequence("ACGT", "", Strand::Forward, 0, false).is_empty());
    }

    #[test]
    fn forward_hit_mirrors_reverse_complement_scan() {
        // CCC binds the template forward at 0; on the minus strand its
        // reverse complement GGG binds at 3.
        let record = SequenceRecord::new("r1", "CCCGGG");
        let hits = find_binding_sites("CCC", &[record], 0, true);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].strand, Strand::Forward);
        assert_eq!(hits[0].start, 0);
        assert_eq!(hits[1].strand, Strand::Reverse);
        assert_eq!(hits[1].start, 3);
    }

    #[test]
    fn end_to_end_single_forward_hit() {
        let record = SequenceRecord::new("t", "AAACCC");
        let hits = find_binding_sites("AAA", &[record], 0, true);
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.record_id, "t");
        assert_eq!(hit.strand, Strand::Forward);
        assert_eq!((hit.start, hit.end, hit.mismatches), (0, 3, 0));
    }

    #[test]
    fn hits_group_by_record_then_strand() {
        let records = vec![
            SequenceRecord::new("r1", "ACGTTTT"),
            SequenceRecord::new("r2", "TTTACGT"),
        ];
        // ACG and its reverse complement CGT both occur in each record,
        // so every record contributes hits on both strands.
        let hits = find_binding_sites("ACG", &records, 0, false);
        let r1_last = hits.iter().rposition(|h| h.record_id == "r1").unwrap();
        let r2_first = hits.iter().position(|h| h.record_id == "r2").unwrap();
        assert!(r1_last < r2_first);
        for id in ["r1", "r2"] {
            let strands: Vec<Strand> = hits
                .iter()
                .filter(|h| h.record_id == id)
                .map(|h| h.strand)
                .collect();
            let first_reverse = strands.iter().position(|s| *s == Strand::Reverse);
            if let Some(pos) = first_reverse {
                assert!(
                    strands[pos..].iter().all(|s| *s == Strand::Reverse),
                    "forward hits must precede reverse hits"
                );
            }
        }
    }

    #[test]
    fn lowercase_inputs_are_folded_before_scanning() {
        let record = SequenceRecord::new("r", "aaaccc");
        let hits = find_binding_sites("aaa", &[record], 0, true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start, 0);
    }

    #[test]
    fn hits_serialize_flat() {
        let hit = BindingHit {
            record_id: "rec".to_string(),
            start: 2,
            end: 5,
            strand: Strand::Reverse,
            mismatches: 1,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "record_id": "rec",
                "start": 2,
                "end": 5,
                "strand": "-",
                "mismatches": 1,
            })
        );
    }
}
