use crate::restriction_enzyme::RestrictionEnzyme;
use anyhow::{Result, anyhow};

const BUILTIN_ENZYMES_JSON: &str = include_str!("../assets/enzymes.json");

/// The enzyme table shipped with the crate, loaded once at startup via the
/// `ENZYMES` global in `lib.rs`.
#[derive(Clone, Debug)]
pub struct Enzymes {
    restriction_enzymes: Vec<RestrictionEnzyme>,
    max_site_length: usize,
}

impl Enzymes {
    fn new(json_text: &str) -> Result<Self> {
        let restriction_enzymes: Vec<RestrictionEnzyme> = serde_json::from_str(json_text)?;
        for enzyme in &restriction_enzymes {
            if enzyme.sequence.is_empty() {
                return Err(anyhow!(
                    "Restriction enzyme {} has no recognition site",
                    enzyme.name
                ));
            }
        }
        let max_site_length = restriction_enzymes
            .iter()
            .map(|enzyme| enzyme.sequence.len())
            .max()
            .unwrap_or(0);
        Ok(Self {
            restriction_enzymes,
            max_site_length,
        })
    }

    pub fn restriction_enzymes(&self) -> &[RestrictionEnzyme] {
        &self.restriction_enzymes
    }

    pub fn restriction_enzymes_by_name(&self, names: &[&str]) -> Vec<RestrictionEnzyme> {
        self.restriction_enzymes
            .iter()
            .filter(|enzyme| names.contains(&enzyme.name.as_str()))
            .cloned()
            .collect()
    }

    pub fn max_site_length(&self) -> usize {
        self.max_site_length
    }
}

impl Default for Enzymes {
    fn default() -> Self {
        Enzymes::new(BUILTIN_ENZYMES_JSON).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_loads() {
        let enzymes = Enzymes::default();
        assert!(
            enzymes
                .restriction_enzymes()
                .iter()
                .any(|e| e.name == "EcoRI")
        );
        assert_eq!(enzymes.max_site_length(), 8); // NotI
    }

    #[test]
    fn lookup_by_name() {
        let enzymes = Enzymes::default();
        let picked = enzymes.restriction_enzymes_by_name(&["BamHI", "NotI"]);
        assert_eq!(picked.len(), 2);
    }
}
