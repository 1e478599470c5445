//! Primer thermodynamics: melting temperature, hairpin and dimer free
//! energies. Nearest-neighbor model with the SantaLucia (1998) unified
//! parameter set; salt correction after SantaLucia (2004), divalent cations
//! folded into an equivalent monovalent concentration (von Ahsen 2001).

use crate::error::{OligostoreError, Result};
use crate::sequence_text::{gc_fraction, reverse_complement};
use serde::{Deserialize, Serialize};

const GAS_CONSTANT: f64 = 1.987; // cal/(mol*K)
const KELVIN: f64 = 273.15;

const MIN_STEM: usize = 3;
const MIN_LOOP: usize = 3;
const MAX_LOOP: usize = 30;

/// Reaction conditions. Concentrations in mM except the primer itself (nM).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermoParams {
    pub monovalent_mm: f64,
    pub divalent_mm: f64,
    pub dntp_mm: f64,
    pub dna_nm: f64,
    pub temperature_c: f64,
}

impl Default for ThermoParams {
    fn default() -> Self {
        Self {
            monovalent_mm: 50.0,
            divalent_mm: 1.5,
            dntp_mm: 0.2,
            dna_nm: 50.0,
            temperature_c: 37.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermoStructure {
    /// Free energy in kcal/mol; 0.0 when no structure was found.
    pub dg: f64,
    pub found: bool,
}

impl ThermoStructure {
    fn none() -> Self {
        Self {
            dg: 0.0,
            found: false,
        }
    }

    fn from_dg(dg: f64) -> Self {
        Self { dg, found: dg < 0.0 }
    }
}

/// Per-primer report in user-facing units: GC as a fraction, Tm in deg C,
/// free energies in kcal/mol, everything rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermoReport {
    pub gc_content: f64,
    pub tm: f64,
    pub hairpin_dg: f64,
    pub self_dimer_dg: f64,
    pub hairpin: bool,
    pub self_dimer: bool,
}

/// Enthalpy (kcal/mol) and entropy (cal/(mol*K)) of one dinucleotide stack,
/// unified parameters. Stacks containing a base outside {A,C,G,T} have no
/// tabulated value and contribute nothing.
fn nn_params(a: u8, b: u8) -> Option<(f64, f64)> {
    let value = match (a, b) {
        (b'A', b'A') | (b'T', b'T') => (-7.9, -22.2),
        (b'A', b'T') => (-7.2, -20.4),
        (b'T', b'A') => (-7.2, -21.3),
        (b'C', b'A') | (b'T', b'G') => (-8.5, -22.7),
        (b'G', b'T') | (b'A', b'C') => (-8.4, -22.4),
        (b'C', b'T') | (b'A', b'G') => (-7.8, -21.0),
        (b'G', b'A') | (b'T', b'C') => (-8.2, -22.2),
        (b'C', b'G') => (-10.6, -27.2),
        (b'G', b'C') => (-9.8, -24.4),
        (b'G', b'G') | (b'C', b'C') => (-8.0, -19.9),
        _ => return None,
    };
    Some(value)
}

fn initiation_params(terminal: u8) -> (f64, f64) {
    match terminal {
        b'G' | b'C' => (0.1, -2.8),
        _ => (2.3, 4.1),
    }
}

/// Monovalent-equivalent salt concentration in mol/l.
fn na_equivalent_molar(params: &ThermoParams) -> f64 {
    let free_divalent = (params.divalent_mm - params.dntp_mm).max(0.0);
    (params.monovalent_mm + 120.0 * free_divalent.sqrt()) / 1000.0
}

fn salt_corrected_entropy(ds: f64, stacks: usize, params: &ThermoParams) -> f64 {
    ds + 0.368 * stacks as f64 * na_equivalent_molar(params).ln()
}

fn stack_sum(seq: &[u8]) -> (f64, f64, usize) {
    let mut dh = 0.0;
    let mut ds = 0.0;
    let mut stacks = 0;
    for pair in seq.windows(2) {
        if let Some((h, s)) = nn_params(pair[0], pair[1]) {
            dh += h;
            ds += s;
            stacks += 1;
        }
    }
    (dh, ds, stacks)
}

fn is_self_complementary(seq: &str) -> bool {
    reverse_complement(seq) == seq
}

/// Duplex melting temperature in deg C. Sequences shorter than one
/// dinucleotide stack have no defined nearest-neighbor Tm and report 0.
pub fn melting_temperature(seq: &str, params: &ThermoParams) -> f64 {
    let upper = seq.to_uppercase();
    let bytes = upper.as_bytes();
    if bytes.len() < 2 {
        return 0.0;
    }

    let (mut dh, mut ds, _) = stack_sum(bytes);
    for terminal in [bytes[0], bytes[bytes.len() - 1]] {
        let (h, s) = initiation_params(terminal);
        dh += h;
        ds += s;
    }

    let symmetry_factor = if is_self_complementary(&upper) {
        ds += -1.4;
        1.0
    } else {
        4.0
    };

    ds = salt_corrected_entropy(ds, bytes.len() - 1, params);
    let ct = params.dna_nm * 1e-9;
    let tm_kelvin = dh * 1000.0 / (ds + GAS_CONSTANT * (ct / symmetry_factor).ln());
    tm_kelvin - KELVIN
}

/// Unimolecular free energy of a stem at the given conditions.
fn stem_dg(stem: &[u8], params: &ThermoParams) -> f64 {
    let (dh, ds, stacks) = stack_sum(stem);
    let ds = salt_corrected_entropy(ds, stacks, params);
    dh - (params.temperature_c + KELVIN) * ds / 1000.0
}

/// Bimolecular free energy of one contiguous paired run, initiation included.
fn duplex_run_dg(run: &[u8], params: &ThermoParams) -> f64 {
    let (mut dh, mut ds, stacks) = stack_sum(run);
    for terminal in [run[0], run[run.len() - 1]] {
        let (h, s) = initiation_params(terminal);
        dh += h;
        ds += s;
    }
    let ds = salt_corrected_entropy(ds, stacks, params);
    dh - (params.temperature_c + KELVIN) * ds / 1000.0
}

/// Destabilizing contribution of a hairpin loop, tabulated at 37 deg C for
/// small loops and extrapolated logarithmically past the table.
fn hairpin_loop_dg(len: usize) -> f64 {
    const TABLE: [f64; 7] = [3.5, 3.5, 3.3, 4.0, 4.2, 4.3, 4.5]; // loops 3..=9
    if len <= 9 {
        TABLE[len - MIN_LOOP]
    } else {
        TABLE[6] + 1.75 * GAS_CONSTANT / 1000.0 * (37.0 + KELVIN) * (len as f64 / 9.0).ln()
    }
}

/// Most stable stem/loop fold: stems of at least three pairs, loops of
/// three to thirty bases.
pub fn hairpin(seq: &str, params: &ThermoParams) -> ThermoStructure {
    let upper = seq.to_uppercase();
    let bytes = upper.as_bytes();
    let n = bytes.len();
    if n < 2 * MIN_STEM + MIN_LOOP {
        return ThermoStructure::none();
    }

    let mut best: Option<f64> = None;
    for start in 0..n {
        for stem_len in MIN_STEM..=(n - start) / 2 {
            let arm = &upper[start..start + stem_len];
            let arm_rc = reverse_complement(arm);
            let loop_floor = start + stem_len + MIN_LOOP;
            let loop_ceiling = (start + stem_len + MAX_LOOP).min(n - stem_len);
            for other in loop_floor..=loop_ceiling {
                if upper[other..other + stem_len] == arm_rc {
                    let loop_len = other - (start + stem_len);
                    let dg = stem_dg(arm.as_bytes(), params) + hairpin_loop_dg(loop_len);
                    if best.is_none_or(|b| dg < b) {
                        best = Some(dg);
                    }
                }
            }
        }
    }

    match best {
        Some(dg) => ThermoStructure::from_dg(dg),
        None => ThermoStructure::none(),
    }
}

/// Best ungapped antiparallel duplex between two oligos: slide one reverse
/// complement along the other and score every contiguous complementary run.
pub fn heterodimer(a: &str, b: &str, params: &ThermoParams) -> ThermoStructure {
    let a = a.to_uppercase();
    let b_rc = reverse_complement(&b.to_uppercase());
    let a_bytes = a.as_bytes();
    let b_bytes = b_rc.as_bytes();
    let n = a_bytes.len() as isize;
    let m = b_bytes.len() as isize;
    if n == 0 || m == 0 {
        return ThermoStructure::none();
    }

    let mut best: Option<f64> = None;
    for shift in (1 - m)..n {
        let lo = shift.max(0);
        let hi = n.min(shift + m);
        let mut run_start: Option<isize> = None;
        for i in lo..=hi {
            let paired = i < hi && a_bytes[i as usize] == b_bytes[(i - shift) as usize];
            match (paired, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    run_start = None;
                    if i - start >= 2 {
                        let run = &a_bytes[start as usize..i as usize];
                        let dg = duplex_run_dg(run, params);
                        if best.is_none_or(|b| dg < b) {
                            best = Some(dg);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    match best {
        Some(dg) => ThermoStructure::from_dg(dg),
        None => ThermoStructure::none(),
    }
}

pub fn homodimer(seq: &str, params: &ThermoParams) -> ThermoStructure {
    heterodimer(seq, seq, params)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Full per-primer report as presented to users.
pub fn analyze_primer(seq: &str, params: &ThermoParams) -> Result<ThermoReport> {
    if seq.is_empty() {
        return Err(OligostoreError::Thermodynamics(
            "empty sequence".to_string(),
        ));
    }
    let hairpin = hairpin(seq, params);
    let self_dimer = homodimer(seq, params);
    Ok(ThermoReport {
        gc_content: round2(gc_fraction(seq)),
        tm: round2(melting_temperature(seq, params)),
        hairpin_dg: round2(hairpin.dg),
        self_dimer_dg: round2(self_dimer.dg),
        hairpin: hairpin.found,
        self_dimer: self_dimer.found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tm_of_standard_20mer_is_plausible() {
        let tm = melting_temperature("ACGATTGACCAGTATTCGAC", &ThermoParams::default());
        assert!((40.0..75.0).contains(&tm), "tm = {tm}");
    }

    #[test]
    fn tm_grows_with_gc_content() {
        let params = ThermoParams::default();
        let at = melting_temperature("ATATATATATATATATATAT", &params);
        let mixed = melting_temperature("ACGATTGACCAGTATTCGAC", &params);
        let gc = melting_temperature("GCGCGCGCGCGCGCGCGCGC", &params);
        assert!(at < mixed);
        assert!(mixed < gc);
    }

    #[test]
    fn tm_grows_with_salt() {
        let low = ThermoParams {
            monovalent_mm: 10.0,
            ..ThermoParams::default()
        };
        let high = ThermoParams {
            monovalent_mm: 200.0,
            ..ThermoParams::default()
        };
        let seq = "ACGATTGACCAGTATTCGAC";
        assert!(melting_temperature(seq, &low) < melting_temperature(seq, &high));
    }

    #[test]
    fn short_input_has_no_tm() {
        assert_eq!(melting_temperature("A", &ThermoParams::default()), 0.0);
    }

    #[test]
    fn stem_loop_oligo_forms_a_hairpin() {
        let result = hairpin("GCGCTTTTGCGC", &ThermoParams::default());
        assert!(result.found);
        assert!(result.dg < 0.0);
    }

    #[test]
    fn poly_a_forms_no_hairpin() {
        let result = hairpin("AAAAAAAAAAAA", &ThermoParams::default());
        assert!(!result.found);
        assert_eq!(result.dg, 0.0);
    }

    #[test]
    fn self_complementary_oligo_dimerizes() {
        let result = homodimer("GCGCGCGC", &ThermoParams::default());
        assert!(result.found);
        assert!(result.dg < -3.0);
    }

    #[test]
    fn poly_a_does_not_dimerize_with_itself() {
        let result = homodimer("AAAAAAAA", &ThermoParams::default());
        assert!(!result.found);
    }

    #[test]
    fn heterodimer_of_complementary_oligos_is_stable() {
        let params = ThermoParams::default();
        let stable = heterodimer("ACGTGCAT", &reverse_complement("ACGTGCAT"), &params);
        let weak = heterodimer("ACGTGCAT", "ACGTGCAT", &params);
        assert!(stable.found);
        assert!(stable.dg < weak.dg);
    }

    #[test]
    fn report_rounds_to_two_decimals() {
        let report = analyze_primer("ACGC", &ThermoParams::default()).unwrap();
        assert_eq!(report.gc_content, 0.75);
        assert_eq!(report.tm, round2(report.tm));
        assert_eq!(report.hairpin_dg, round2(report.hairpin_dg));
    }

    #[test]
    fn empty_sequence_fails_analysis() {
        let err = analyze_primer("", &ThermoParams::default()).unwrap_err();
        assert!(err.to_string().starts_with("Analysis failed"));
    }
}
