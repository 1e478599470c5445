use crate::ENZYMES;
use crate::error::Result;
use crate::restriction_enzyme::RestrictionMatch;
use crate::sequence_text::{clean_optional_sequence, clean_sequence};
use crate::thermodynamics::{self, ThermoParams, ThermoReport};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A stored oligo: validated sequence, optional 5' overhang, and the derived
/// thermodynamic attributes. The derived fields are recomputed on every
/// sequence change and are never stale relative to the stored sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primer {
    name: String,
    sequence: String,
    overhang_sequence: String,
    length: usize,
    gc_content: f64,
    tm: f64,
    hairpin_dg: f64,
    self_dimer_dg: f64,
    hairpin: bool,
    self_dimer: bool,
    #[serde(default)]
    created_by: Option<String>,
}

impl Primer {
    pub fn new(name: &str, sequence: &str) -> Result<Self> {
        Self::with_overhang(name, sequence, "")
    }

    /// Primer sequences may carry N positions; overhangs must be unambiguous
    /// so their restriction sites stay scannable.
    pub fn with_overhang(name: &str, sequence: &str, overhang: &str) -> Result<Self> {
        let sequence = clean_sequence(sequence, true)?;
        let overhang_sequence = clean_optional_sequence(overhang, false)?;
        let report = thermodynamics::analyze_primer(&sequence, &ThermoParams::default())?;
        Ok(Self {
            name: name.to_string(),
            length: sequence.len(),
            sequence,
            overhang_sequence,
            gc_content: report.gc_content,
            tm: report.tm,
            hairpin_dg: report.hairpin_dg,
            self_dimer_dg: report.self_dimer_dg,
            hairpin: report.hairpin,
            self_dimer: report.self_dimer,
            created_by: None,
        })
    }

    pub fn set_sequence(&mut self, sequence: &str) -> Result<()> {
        let sequence = clean_sequence(sequence, true)?;
        let report = thermodynamics::analyze_primer(&sequence, &ThermoParams::default())?;
        self.length = sequence.len();
        self.sequence = sequence;
        self.apply_report(&report);
        Ok(())
    }

    pub fn set_overhang(&mut self, overhang: &str) -> Result<()> {
        self.overhang_sequence = clean_optional_sequence(overhang, false)?;
        Ok(())
    }

    pub fn set_created_by(&mut self, creator: Option<String>) {
        self.created_by = creator;
    }

    fn apply_report(&mut self, report: &ThermoReport) {
        self.gc_content = report.gc_content;
        self.tm = report.tm;
        self.hairpin_dg = report.hairpin_dg;
        self.self_dimer_dg = report.self_dimer_dg;
        self.hairpin = report.hairpin;
        self.self_dimer = report.self_dimer;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn overhang_sequence(&self) -> &str {
        &self.overhang_sequence
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn gc_content(&self) -> f64 {
        self.gc_content
    }

    pub fn tm(&self) -> f64 {
        self.tm
    }

    pub fn hairpin_dg(&self) -> f64 {
        self.hairpin_dg
    }

    pub fn self_dimer_dg(&self) -> f64 {
        self.self_dimer_dg
    }

    pub fn hairpin(&self) -> bool {
        self.hairpin
    }

    pub fn self_dimer(&self) -> bool {
        self.self_dimer
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Overhang and binding region as ordered on the synthesized oligo.
    pub fn full_sequence(&self) -> String {
        format!("{}{}", self.overhang_sequence, self.sequence)
    }

    /// Every recognition-site occurrence in the overhang, table order,
    /// 1-based starts.
    pub fn overhang_restriction_sites(&self) -> Vec<RestrictionMatch> {
        ENZYMES
            .restriction_enzymes()
            .iter()
            .flat_map(|enzyme| enzyme.get_matches(&self.overhang_sequence))
            .collect()
    }

    /// Enzymes whose site occurs in the overhang, one entry each,
    /// e.g. `"EcoRI (GAATTC), BamHI (GGATCC)"`.
    pub fn restriction_site_summary(&self) -> String {
        ENZYMES
            .restriction_enzymes()
            .iter()
            .filter(|enzyme| !enzyme.get_sites(&self.overhang_sequence).is_empty())
            .map(|enzyme| format!("{} ({})", enzyme.name, enzyme.sequence))
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerPair {
    name: String,
    #[serde(default)]
    description: Option<String>,
    forward: Primer,
    reverse: Primer,
    #[serde(default)]
    created_by: Option<String>,
}

impl PrimerPair {
    pub fn new(name: &str, forward: Primer, reverse: Primer) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            forward,
            reverse,
            created_by: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_created_by(&mut self, creator: Option<String>) {
        self.created_by = creator;
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn forward(&self) -> &Primer {
        &self.forward
    }

    pub fn reverse(&self) -> &Primer {
        &self.reverse
    }

    /// Heterodimer free energy between the two members, kcal/mol.
    pub fn cross_dimer_dg(&self, params: &ThermoParams) -> f64 {
        thermodynamics::round2(
            thermodynamics::heterodimer(&self.forward.sequence, &self.reverse.sequence, params).dg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OligostoreError;
    use crate::sequence_text::reverse_complement;

    #[test]
    fn derived_attributes_follow_the_sequence() {
        let primer = Primer::new("p1", " ac gc ").unwrap();
        assert_eq!(primer.sequence(), "ACGC");
        assert_eq!(primer.length(), 4);
        assert_eq!(primer.gc_content(), 0.75);
    }

    #[test]
    fn set_sequence_recomputes_derived_attributes() {
        let mut primer = Primer::new("p1", "ACGC").unwrap();
        primer.set_sequence("ATAT").unwrap();
        assert_eq!(primer.sequence(), "ATAT");
        assert_eq!(primer.length(), 4);
        assert_eq!(primer.gc_content(), 0.0);
    }

    #[test]
    fn invalid_sequence_is_rejected() {
        let err = Primer::new("bad", "ACGTQ").unwrap_err();
        assert!(matches!(err, OligostoreError::InvalidSequence(chars) if chars == vec!['Q']));
    }

    #[test]
    fn n_is_allowed_in_the_binding_region_but_not_the_overhang() {
        assert!(Primer::new("p", "ACGTN").is_ok());
        assert!(Primer::with_overhang("p", "ACGT", "NN").is_err());
    }

    #[test]
    fn full_sequence_prepends_the_overhang() {
        let primer = Primer::with_overhang("p", "ACGTACGT", "GAATTC").unwrap();
        assert_eq!(primer.full_sequence(), "GAATTCACGTACGT");
    }

    #[test]
    fn overhang_sites_are_one_based() {
        let primer = Primer::with_overhang("p", "ACGTACGT", "AAGAATTCAA").unwrap();
        let sites = primer.overhang_restriction_sites();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].enzyme, "EcoRI");
        assert_eq!(sites[0].start, 3);
    }

    #[test]
    fn summary_lists_each_enzyme_once_in_table_order() {
        let primer = Primer::with_overhang("p", "ACGTACGT", "GAATTCGGATCC").unwrap();
        assert_eq!(
            primer.restriction_site_summary(),
            "EcoRI (GAATTC), BamHI (GGATCC)"
        );
    }

    #[test]
    fn empty_overhang_has_no_sites() {
        let primer = Primer::new("p", "ACGTACGT").unwrap();
        assert!(primer.overhang_restriction_sites().is_empty());
        assert_eq!(primer.restriction_site_summary(), "");
    }

    #[test]
    fn pair_cross_dimer_is_stable_for_complementary_members() {
        let forward = Primer::new("f", "ACGTGCATGGCC").unwrap();
        let reverse = Primer::new("r", &reverse_complement("ACGTGCATGGCC")).unwrap();
        let pair = PrimerPair::new("pp", forward, reverse);
        assert!(pair.cross_dimer_dg(&ThermoParams::default()) < -5.0);
    }
}
