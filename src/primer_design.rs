use crate::error::{OligostoreError, Result};
use crate::sequence_text::{gc_fraction, reverse_complement};
use crate::thermodynamics::{ThermoParams, melting_temperature};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::fmt;

/// Candidate lists are cut down to this many entries per side before
/// pairing, keeping the cross product bounded on long templates.
const CANDIDATE_CAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesignMode {
    #[serde(rename = "PAIR")]
    Pair,
    #[serde(rename = "LEFT")]
    Left,
    #[serde(rename = "RIGHT")]
    Right,
    #[serde(rename = "NONE")]
    None,
}

impl fmt::Display for DesignMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self {
            DesignMode::Pair => "PAIR",
            DesignMode::Left => "LEFT",
            DesignMode::Right => "RIGHT",
            DesignMode::None => "NONE",
        };
        write!(f, "{tag}")
    }
}

/// Global design parameters. Defaults follow the usual primer3 settings:
/// 18-27 bases around an optimum of 20, 57-63 deg C around 60, 40-60% GC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignParams {
    pub pick_left: bool,
    pub pick_right: bool,
    pub num_return: usize,
    pub product_size_ranges: Vec<(usize, usize)>,
    pub min_size: usize,
    pub opt_size: usize,
    pub max_size: usize,
    pub min_tm: f64,
    pub opt_tm: f64,
    pub max_tm: f64,
    pub min_gc: f64,
    pub opt_gc: f64,
    pub max_gc: f64,
    pub max_poly_x: usize,
    pub gc_clamp: usize,
    pub thermo: ThermoParams,
}

impl Default for DesignParams {
    fn default() -> Self {
        Self {
            pick_left: true,
            pick_right: true,
            num_return: 5,
            product_size_ranges: vec![(100, 300)],
            min_size: 18,
            opt_size: 20,
            max_size: 27,
            min_tm: 57.0,
            opt_tm: 60.0,
            max_tm: 63.0,
            min_gc: 40.0,
            opt_gc: 50.0,
            max_gc: 60.0,
            max_poly_x: 4,
            gc_clamp: 1,
            thermo: ThermoParams::default(),
        }
    }
}

/// Parses `"min-max"` ranges, several separated by whitespace,
/// e.g. `"100-300 400-600"`.
pub fn parse_product_size_ranges(text: &str) -> Result<Vec<(usize, usize)>> {
    let mut ranges = Vec::new();
    for part in text.split_whitespace() {
        let bounds = part
            .split_once('-')
            .and_then(|(lo, hi)| Some((lo.parse::<usize>().ok()?, hi.parse::<usize>().ok()?)));
        match bounds {
            Some((lo, hi)) if lo <= hi => ranges.push((lo, hi)),
            _ => {
                return Err(OligostoreError::Parse(format!(
                    "Invalid product size range '{part}': expected min-max with min <= max"
                )));
            }
        }
    }
    if ranges.is_empty() {
        return Err(OligostoreError::Parse(
            "No product size range given".to_string(),
        ));
    }
    Ok(ranges)
}

/// One accepted primer candidate. For right primers `start` is still the
/// 0-based template offset of the binding window; `sequence` is the reverse
/// complement of that window, written 5'->3' on its own strand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignCandidate {
    pub sequence: String,
    pub start: usize,
    pub length: usize,
    pub tm: f64,
    pub gc_percent: f64,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignedPair {
    pub left: DesignCandidate,
    pub right: DesignCandidate,
    pub product_size: usize,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    pub mode: DesignMode,
    pub pairs: Vec<DesignedPair>,
    pub singles: Vec<DesignCandidate>,
}

fn longest_base_run(seq: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut previous = None;
    for c in seq.chars() {
        run = if previous == Some(c) { run + 1 } else { 1 };
        longest = longest.max(run);
        previous = Some(c);
    }
    longest
}

fn has_gc_clamp(seq: &str, clamp: usize) -> bool {
    if clamp == 0 {
        return true;
    }
    if seq.len() < clamp {
        return false;
    }
    seq[seq.len() - clamp..]
        .chars()
        .all(|c| matches!(c, 'G' | 'C'))
}

fn evaluate_window(
    template: &str,
    start: usize,
    length: usize,
    right: bool,
    params: &DesignParams,
) -> Option<DesignCandidate> {
    let window = &template[start..start + length];
    let sequence = if right {
        reverse_complement(window)
    } else {
        window.to_string()
    };
    if sequence.contains('N') {
        return None;
    }
    let gc_percent = gc_fraction(&sequence) * 100.0;
    if gc_percent < params.min_gc || gc_percent > params.max_gc {
        return None;
    }
    if longest_base_run(&sequence) > params.max_poly_x {
        return None;
    }
    if !has_gc_clamp(&sequence, params.gc_clamp) {
        return None;
    }
    let tm = melting_temperature(&sequence, &params.thermo);
    if tm < params.min_tm || tm > params.max_tm {
        return None;
    }
    let penalty = (tm - params.opt_tm).abs()
        + (length as f64 - params.opt_size as f64).abs()
        + 0.01 * (gc_percent - params.opt_gc).abs();
    Some(DesignCandidate {
        sequence,
        start,
        length,
        tm,
        gc_percent,
        penalty,
    })
}

fn candidate_order(a: &DesignCandidate, b: &DesignCandidate) -> Ordering {
    a.penalty
        .partial_cmp(&b.penalty)
        .unwrap_or(Ordering::Equal)
        .then(a.start.cmp(&b.start))
        .then(a.length.cmp(&b.length))
}

fn enumerate_candidates(template: &str, right: bool, params: &DesignParams) -> Vec<DesignCandidate> {
    let n = template.len();
    let windows: Vec<(usize, usize)> = (params.min_size..=params.max_size)
        .filter(|length| *length > 0 && *length <= n)
        .flat_map(|length| (0..=n - length).map(move |start| (start, length)))
        .collect();

    let mut candidates: Vec<DesignCandidate> = windows
        .par_iter()
        .filter_map(|&(start, length)| evaluate_window(template, start, length, right, params))
        .collect();
    candidates.sort_by(candidate_order);
    candidates.truncate(CANDIDATE_CAP);
    candidates
}

fn pair_candidates(
    lefts: &[DesignCandidate],
    rights: &[DesignCandidate],
    params: &DesignParams,
) -> Vec<DesignedPair> {
    let mut pairs = Vec::new();
    for left in lefts {
        for right in rights {
            if right.start < left.start + left.length {
                continue;
            }
            let product_size = right.start + right.length - left.start;
            let in_range = params
                .product_size_ranges
                .iter()
                .any(|&(lo, hi)| (lo..=hi).contains(&product_size));
            if !in_range {
                continue;
            }
            pairs.push(DesignedPair {
                left: left.clone(),
                right: right.clone(),
                product_size,
                penalty: left.penalty + right.penalty,
            });
        }
    }
    pairs.sort_by(|a, b| {
        a.penalty
            .partial_cmp(&b.penalty)
            .unwrap_or(Ordering::Equal)
            .then(a.left.start.cmp(&b.left.start))
            .then(a.right.start.cmp(&b.right.start))
    });
    pairs
}

/// Enumerates, filters, scores and pairs candidates over the template.
/// Mode cascade: pairs beat single left primers beat single right primers;
/// `NONE` when nothing was requested or nothing passed the filters.
pub fn design_primers(template: &str, params: &DesignParams) -> Result<DesignReport> {
    let template = template.to_uppercase();
    if template.is_empty() {
        return Err(OligostoreError::EmptyInput);
    }

    let lefts = if params.pick_left {
        enumerate_candidates(&template, false, params)
    } else {
        Vec::new()
    };
    let rights = if params.pick_right {
        enumerate_candidates(&template, true, params)
    } else {
        Vec::new()
    };

    let mut pairs = if params.pick_left && params.pick_right {
        pair_candidates(&lefts, &rights, params)
    } else {
        Vec::new()
    };

    let report = if !pairs.is_empty() {
        pairs.truncate(params.num_return);
        DesignReport {
            mode: DesignMode::Pair,
            pairs,
            singles: Vec::new(),
        }
    } else if params.pick_left && !lefts.is_empty() {
        let mut singles = lefts;
        singles.truncate(params.num_return);
        DesignReport {
            mode: DesignMode::Left,
            pairs: Vec::new(),
            singles,
        }
    } else if params.pick_right && !rights.is_empty() {
        let mut singles = rights;
        singles.truncate(params.num_return);
        DesignReport {
            mode: DesignMode::Right,
            pairs: Vec::new(),
            singles,
        }
    } else {
        DesignReport {
            mode: DesignMode::None,
            pairs: Vec::new(),
            singles: Vec::new(),
        }
    };
    Ok(report)
}

impl DesignReport {
    /// Flat result map in the conventional field naming
    /// (`PRIMER_PAIR_NUM_RETURNED`, `PRIMER_LEFT_0_SEQUENCE`, ...), for
    /// callers keyed to that contract.
    pub fn result_map(&self) -> Value {
        let mut map = serde_json::Map::new();
        match self.mode {
            DesignMode::Pair => {
                let n = self.pairs.len();
                map.insert("PRIMER_PAIR_NUM_RETURNED".into(), json!(n));
                map.insert("PRIMER_LEFT_NUM_RETURNED".into(), json!(n));
                map.insert("PRIMER_RIGHT_NUM_RETURNED".into(), json!(n));
                for (i, pair) in self.pairs.iter().enumerate() {
                    map.insert(
                        format!("PRIMER_LEFT_{i}_SEQUENCE"),
                        json!(pair.left.sequence),
                    );
                    map.insert(
                        format!("PRIMER_RIGHT_{i}_SEQUENCE"),
                        json!(pair.right.sequence),
                    );
                    map.insert(format!("PRIMER_LEFT_{i}_TM"), json!(pair.left.tm));
                    map.insert(format!("PRIMER_RIGHT_{i}_TM"), json!(pair.right.tm));
                    map.insert(format!("PRIMER_LEFT_{i}_PENALTY"), json!(pair.left.penalty));
                    map.insert(
                        format!("PRIMER_RIGHT_{i}_PENALTY"),
                        json!(pair.right.penalty),
                    );
                    map.insert(
                        format!("PRIMER_PAIR_{i}_PRODUCT_SIZE"),
                        json!(pair.product_size),
                    );
                    map.insert(format!("PRIMER_PAIR_{i}_PENALTY"), json!(pair.penalty));
                }
            }
            DesignMode::Left | DesignMode::Right => {
                let side = if self.mode == DesignMode::Left {
                    "LEFT"
                } else {
                    "RIGHT"
                };
                let other = if self.mode == DesignMode::Left {
                    "RIGHT"
                } else {
                    "LEFT"
                };
                map.insert("PRIMER_PAIR_NUM_RETURNED".into(), json!(0));
                map.insert(
                    format!("PRIMER_{side}_NUM_RETURNED"),
                    json!(self.singles.len()),
                );
                map.insert(format!("PRIMER_{other}_NUM_RETURNED"), json!(0));
                for (i, single) in self.singles.iter().enumerate() {
                    map.insert(
                        format!("PRIMER_{side}_{i}_SEQUENCE"),
                        json!(single.sequence),
                    );
                    map.insert(format!("PRIMER_{side}_{i}_TM"), json!(single.tm));
                    map.insert(format!("PRIMER_{side}_{i}_PENALTY"), json!(single.penalty));
                }
            }
            DesignMode::None => {
                map.insert("PRIMER_PAIR_NUM_RETURNED".into(), json!(0));
                map.insert("PRIMER_LEFT_NUM_RETURNED".into(), json!(0));
                map.insert("PRIMER_RIGHT_NUM_RETURNED".into(), json!(0));
            }
        }
        Value::Object(map)
    }
}
