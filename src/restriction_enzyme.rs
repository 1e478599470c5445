use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionEnzyme {
    pub name: String,
    pub sequence: String,
}

/// One recognition-site occurrence, reported with a 1-based start for
/// display alongside the enzyme and its site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionMatch {
    pub enzyme: String,
    pub site: String,
    pub start: usize,
}

impl RestrictionEnzyme {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, sequence: S2) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }

    pub fn is_palindromic(&self) -> bool {
        crate::sequence_text::reverse_complement(&self.sequence) == self.sequence
    }

    /// 0-based start offsets of every recognition-site occurrence in `text`,
    /// overlapping occurrences included.
    pub fn get_sites(&self, text: &str) -> Vec<usize> {
        let hay = text.to_uppercase();
        let needle = self.sequence.as_str();
        let mut sites = Vec::new();
        if needle.is_empty() {
            return sites;
        }
        let mut from = 0;
        while let Some(idx) = hay[from..].find(needle) {
            let at = from + idx;
            sites.push(at);
            from = at + 1;
        }
        sites
    }

    pub fn get_matches(&self, text: &str) -> Vec<RestrictionMatch> {
        self.get_sites(text)
            .into_iter()
            .map(|at| RestrictionMatch {
                enzyme: self.name.clone(),
                site: self.sequence.clone(),
                start: at + 1,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_every_site() {
        let re = RestrictionEnzyme::new("EcoRI", "GAATTC");
        assert_eq!(re.get_sites("GAATTCGAATTC"), vec![0, 6]);
        assert!(re.is_palindromic());
    }

    #[test]
    fn finds_overlapping_sites() {
        let re = RestrictionEnzyme::new("NotI", "GCGGCCGC");
        assert_eq!(re.get_sites("GCGGCCGCGGCCGC"), vec![0, 6]);
    }

    #[test]
    fn scanning_is_case_insensitive() {
        let re = RestrictionEnzyme::new("BamHI", "GGATCC");
        assert_eq!(re.get_sites("aaggatcctt"), vec![2]);
    }

    #[test]
    fn matches_use_one_based_starts() {
        let re = RestrictionEnzyme::new("HindIII", "AAGCTT");
        let matches = re.get_matches("TTAAGCTT");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].enzyme, "HindIII");
        assert_eq!(matches[0].site, "AAGCTT");
        assert_eq!(matches[0].start, 3);
    }

    #[test]
    fn type_iis_enzymes_are_not_palindromic() {
        assert!(!RestrictionEnzyme::new("BsaI", "GGTCTC").is_palindromic());
    }
}
