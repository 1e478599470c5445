use crate::error::{OligostoreError, Result};
use itertools::Itertools;

/// Strips all whitespace, uppercases, and enforces the nucleotide alphabet.
/// With `allow_n` the alphabet is {A,C,G,T,N}, otherwise {A,C,G,T}.
pub fn clean_sequence(raw: &str, allow_n: bool) -> Result<String> {
    let cleaned = strip_and_fold(raw);
    if cleaned.is_empty() {
        return Err(OligostoreError::EmptyInput);
    }
    check_alphabet(&cleaned, allow_n)?;
    Ok(cleaned)
}

/// Like `clean_sequence` but a blank input is valid and yields an empty string.
pub fn clean_optional_sequence(raw: &str, allow_n: bool) -> Result<String> {
    let cleaned = strip_and_fold(raw);
    if cleaned.is_empty() {
        return Ok(cleaned);
    }
    check_alphabet(&cleaned, allow_n)?;
    Ok(cleaned)
}

fn strip_and_fold(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn check_alphabet(cleaned: &str, allow_n: bool) -> Result<()> {
    let invalid: Vec<char> = cleaned
        .chars()
        .filter(|c| !matches!(c, 'A' | 'C' | 'G' | 'T') && !(allow_n && *c == 'N'))
        .sorted()
        .dedup()
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(OligostoreError::InvalidSequence(invalid))
    }
}

pub fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        'a' => 't',
        't' => 'a',
        'c' => 'g',
        'g' => 'c',
        other => other,
    }
}

/// Complementary strand read 3'->5'. Callers feeding the binding scanner
/// must only pass unambiguous {A,C,G,T} sequences.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement).collect()
}

pub fn gc_fraction(seq: &str) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq
        .chars()
        .filter(|c| matches!(c, 'G' | 'C' | 'g' | 'c'))
        .count();
    gc as f64 / seq.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_whitespace_and_uppercases() {
        assert_eq!(clean_sequence(" ac g\tT\n", false).unwrap(), "ACGT");
    }

    #[test]
    fn clean_rejects_foreign_characters() {
        let err = clean_sequence("ACGTX", false).unwrap_err();
        match err {
            OligostoreError::InvalidSequence(chars) => assert_eq!(chars, vec!['X']),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clean_lists_invalid_characters_sorted_and_deduplicated() {
        let err = clean_sequence("AZXRXZ", false).unwrap_err();
        match err {
            OligostoreError::InvalidSequence(chars) => {
                assert_eq!(chars, vec!['R', 'X', 'Z'])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn n_is_only_valid_when_allowed() {
        assert_eq!(clean_sequence("ACGN", true).unwrap(), "ACGN");
        assert!(clean_sequence("ACGN", false).is_err());
    }

    #[test]
    fn empty_input_is_an_error_unless_optional() {
        assert!(matches!(
            clean_sequence("   ", false),
            Err(OligostoreError::EmptyInput)
        ));
        assert_eq!(clean_optional_sequence("   ", false).unwrap(), "");
    }

    #[test]
    fn reverse_complement_basics() {
        assert_eq!(reverse_complement("ATCG"), "CGAT");
        assert_eq!(reverse_complement("AAA"), "TTT");
    }

    #[test]
    fn reverse_complement_is_an_involution() {
        let seq = "ATTACGCGGATCCTTAGCA";
        assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
    }

    #[test]
    fn gc_fraction_counts_g_and_c() {
        assert_eq!(gc_fraction("ACGC"), 0.75);
        assert_eq!(gc_fraction(""), 0.0);
        assert_eq!(gc_fraction("ATAT"), 0.0);
    }
}
