use crate::primer::{Primer, PrimerPair};
use crate::sequence_text::reverse_complement;
use crate::window_render::find_binding_site;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const PRIMER_HEADERS: [&str; 10] = [
    "Name",
    "Sequence",
    "5' Overhang",
    "Restriction Sites",
    "Length",
    "GC Content",
    "Temperature",
    "Hairpin",
    "Self Dimer",
    "Creator",
];

fn primer_fields(primer: &Primer) -> Vec<String> {
    vec![
        primer.name().to_string(),
        primer.sequence().to_string(),
        primer.overhang_sequence().to_string(),
        primer.restriction_site_summary(),
        primer.length().to_string(),
        primer.gc_content().to_string(),
        primer.tm().to_string(),
        primer.hairpin_dg().to_string(),
        primer.self_dimer_dg().to_string(),
        primer.created_by().unwrap_or("").to_string(),
    ]
}

/// One header row, then one row per primer, columns as `PRIMER_HEADERS`.
pub fn write_primer_csv<W: Write>(writer: W, primers: &[Primer]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(PRIMER_HEADERS)?;
    for primer in primers {
        out.write_record(primer_fields(primer))?;
    }
    out.flush()?;
    Ok(())
}

/// Pair table: pair name and description, then every primer column prefixed
/// with `Forward ` and `Reverse `.
pub fn write_primer_pair_csv<W: Write>(writer: W, pairs: &[PrimerPair]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    let mut headers = vec!["Pair Name".to_string(), "Description".to_string()];
    headers.extend(PRIMER_HEADERS.iter().map(|h| format!("Forward {h}")));
    headers.extend(PRIMER_HEADERS.iter().map(|h| format!("Reverse {h}")));
    out.write_record(&headers)?;
    for pair in pairs {
        let mut row = vec![
            pair.name().to_string(),
            pair.description().unwrap_or("").to_string(),
        ];
        row.extend(primer_fields(pair.forward()));
        row.extend(primer_fields(pair.reverse()));
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

/// The amplicon a primer pair produces on a template: from the forward
/// primer's first exact site through the end of the reverse primer's site
/// (located via its reverse complement on the plus strand).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcrProduct {
    pub sequence: String,
    pub length: usize,
    pub forward_pos: usize,
    pub reverse_pos: usize,
}

/// `None` when either primer has no exact site, or when the sites are not
/// in forward-then-reverse order (no amplicon).
pub fn pcr_product(template: &str, forward: &str, reverse: &str) -> Option<PcrProduct> {
    let template = template.to_uppercase();
    let forward = forward.to_uppercase();
    let reverse_rc = reverse_complement(&reverse.to_uppercase());

    let forward_pos = find_binding_site(&template, &forward)?;
    let reverse_pos = find_binding_site(&template, &reverse_rc)?;
    let end = reverse_pos + reverse_rc.len();
    if end <= forward_pos {
        return None;
    }

    let sequence = template[forward_pos..end].to_string();
    Some(PcrProduct {
        length: sequence.len(),
        sequence,
        forward_pos,
        reverse_pos,
    })
}

/// Two-line FASTA record labelled `PCR_product_pair_{index}`.
pub fn write_product_fasta<W: Write>(writer: W, pair_index: usize, product: &str) -> Result<()> {
    let mut out = bio::io::fasta::Writer::new(writer);
    out.write(
        &format!("PCR_product_pair_{pair_index}"),
        None,
        product.as_bytes(),
    )?;
    Ok(())
}

pub fn product_fasta(pair_index: usize, product: &str) -> Result<String> {
    let mut buffer = Vec::new();
    write_product_fasta(&mut buffer, pair_index, product)?;
    Ok(String::from_utf8(buffer)?)
}
