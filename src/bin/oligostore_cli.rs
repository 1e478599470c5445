use oligostore::ENZYMES;
use oligostore::export::{pcr_product, product_fasta, write_primer_csv};
use oligostore::primer::Primer;
use oligostore::primer_binding::{DEFAULT_MAX_MISMATCHES, analyze_primer_binding};
use oligostore::primer_design::{DesignParams, design_primers, parse_product_size_ranges};
use oligostore::sequence_loader::{SequenceFormat, SequenceSource};
use oligostore::sequence_text::{clean_sequence, reverse_complement};
use oligostore::thermodynamics::{ThermoParams, analyze_primer, heterodimer, round2};
use oligostore::window_render::{
    DEFAULT_FLANK, find_binding_site, highlight_binding, render_binding_line,
    render_windowed_line, window_sequence,
};
use serde::Serialize;
use serde_json::json;
use std::io::Read;
use std::{env, fs};

fn usage() {
    eprintln!(
        "Usage:\n  \
  oligostore_cli clean SEQ [--allow-n]\n  \
  oligostore_cli revcomp SEQ\n  \
  oligostore_cli analyze SEQ\n  \
  oligostore_cli pair FWD REV\n  \
  oligostore_cli scan PRIMER FILE --format fasta|genbank [--max-mismatches N] [--allow-3prime-mismatch]\n  \
  oligostore_cli bind PRIMER SEQ [--flank N]\n  \
  oligostore_cli design SEQ|FILE [--format fasta|genbank] [--num-return N] [--product-sizes \"MIN-MAX ...\"]\n  \
  oligostore_cli product FWD REV TEMPLATE\n  \
  oligostore_cli sites SEQ\n  \
  oligostore_cli export-primers OUT.csv [PRIMERS.json]\n\n  \
  Primer JSON for export-primers is an array of {{name, sequence, overhang}} objects;\n  \
  with no path it is read from stdin"
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|at| args.get(at + 1))
        .cloned()
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    match flag_value(args, flag) {
        None => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|_| format!("Invalid value '{text}' for {flag}")),
    }
}

fn positional(args: &[String], index: usize, what: &str) -> Result<String, String> {
    let mut seen = 0;
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(stripped) = arg.strip_prefix("--") {
            // Boolean flags take no value
            skip_next = !matches!(stripped, "allow-n" | "allow-3prime-mismatch");
            continue;
        }
        if seen == index {
            return Ok(arg.clone());
        }
        seen += 1;
    }
    usage();
    Err(format!("Missing {what}"))
}

#[derive(serde::Deserialize)]
struct PrimerInput {
    name: String,
    sequence: String,
    #[serde(default)]
    overhang: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        usage();
        return Err("Missing command".to_string());
    };

    match command.as_str() {
        "clean" => {
            let raw = positional(rest, 0, "sequence")?;
            let allow_n = rest.iter().any(|a| a == "--allow-n");
            let cleaned = clean_sequence(&raw, allow_n).map_err(|e| e.to_string())?;
            print_json(&json!({ "sequence": cleaned, "length": cleaned.len() }))
        }
        "revcomp" => {
            let raw = positional(rest, 0, "sequence")?;
            let cleaned = clean_sequence(&raw, false).map_err(|e| e.to_string())?;
            print_json(&json!({ "reverse_complement": reverse_complement(&cleaned) }))
        }
        "analyze" => {
            let raw = positional(rest, 0, "sequence")?;
            let cleaned = clean_sequence(&raw, false).map_err(|e| e.to_string())?;
            let report =
                analyze_primer(&cleaned, &ThermoParams::default()).map_err(|e| e.to_string())?;
            print_json(&report)
        }
        "pair" => {
            let fwd = clean_sequence(&positional(rest, 0, "forward primer")?, false)
                .map_err(|e| e.to_string())?;
            let rev = clean_sequence(&positional(rest, 1, "reverse primer")?, false)
                .map_err(|e| e.to_string())?;
            let params = ThermoParams::default();
            let forward = analyze_primer(&fwd, &params).map_err(|e| e.to_string())?;
            let reverse = analyze_primer(&rev, &params).map_err(|e| e.to_string())?;
            let cross = heterodimer(&fwd, &rev, &params);
            print_json(&json!({
                "forward": forward,
                "reverse": reverse,
                "hetero_dimer_dg": round2(cross.dg),
                "hetero_dimer": cross.found,
            }))
        }
        "scan" => {
            let primer = clean_sequence(&positional(rest, 0, "primer")?, false)
                .map_err(|e| e.to_string())?;
            let path = positional(rest, 1, "template file")?;
            let tag = flag_value(rest, "--format")
                .ok_or_else(|| "scan requires --format fasta|genbank".to_string())?;
            let format = SequenceFormat::from_tag(&tag).map_err(|e| e.to_string())?;
            let max_mismatches = parse_flag::<usize>(rest, "--max-mismatches")?
                .unwrap_or(DEFAULT_MAX_MISMATCHES);
            let block_3prime = !rest.iter().any(|a| a == "--allow-3prime-mismatch");

            let source = SequenceSource::new(path, format);
            let hits = analyze_primer_binding(&primer, &source, max_mismatches, block_3prime)
                .map_err(|e| e.to_string())?;
            print_json(&json!({ "hit_count": hits.len(), "hits": hits }))
        }
        "bind" => {
            let primer = clean_sequence(&positional(rest, 0, "primer")?, false)
                .map_err(|e| e.to_string())?;
            let template = clean_sequence(&positional(rest, 1, "template")?, false)
                .map_err(|e| e.to_string())?;
            let flank = parse_flag::<usize>(rest, "--flank")?.unwrap_or(DEFAULT_FLANK);

            let position = find_binding_site(&template, &primer);
            let window = window_sequence(&template, position, primer.len(), flank);
            print_json(&json!({
                "position": position,
                "window": window.as_ref().map(|w| w.text.clone()),
                "windowed_line": render_windowed_line(window.as_ref()),
                "binding_line": render_binding_line(&template, &primer, position),
                "highlighted": window.as_ref().map(highlight_binding),
            }))
        }
        "design" => {
            let target = positional(rest, 0, "template sequence or file")?;
            let template = match flag_value(rest, "--format") {
                Some(tag) => {
                    let format = SequenceFormat::from_tag(&tag).map_err(|e| e.to_string())?;
                    let records = SequenceSource::new(&target, format)
                        .load()
                        .map_err(|e| e.to_string())?;
                    records
                        .first()
                        .map(|r| r.sequence().to_string())
                        .ok_or_else(|| format!("No records in '{target}'"))?
                }
                None => clean_sequence(&target, true).map_err(|e| e.to_string())?,
            };

            let mut params = DesignParams::default();
            if let Some(n) = parse_flag::<usize>(rest, "--num-return")? {
                params.num_return = n;
            }
            if let Some(ranges) = flag_value(rest, "--product-sizes") {
                params.product_size_ranges =
                    parse_product_size_ranges(&ranges).map_err(|e| e.to_string())?;
            }
            let report = design_primers(&template, &params).map_err(|e| e.to_string())?;

            // Windowed view of each pair's product on the template
            let products: Vec<_> = report
                .pairs
                .iter()
                .map(|pair| {
                    let window = window_sequence(
                        &template,
                        Some(pair.left.start),
                        pair.product_size,
                        DEFAULT_FLANK,
                    );
                    json!({
                        "product_size": pair.product_size,
                        "window": window.as_ref().map(|w| w.text.clone()),
                        "windowed_line": render_windowed_line(window.as_ref()),
                    })
                })
                .collect();

            let mut output = report.result_map();
            output["products"] = json!(products);
            print_json(&output)
        }
        "product" => {
            let fwd = clean_sequence(&positional(rest, 0, "forward primer")?, false)
                .map_err(|e| e.to_string())?;
            let rev = clean_sequence(&positional(rest, 1, "reverse primer")?, false)
                .map_err(|e| e.to_string())?;
            let template = clean_sequence(&positional(rest, 2, "template")?, false)
                .map_err(|e| e.to_string())?;
            match pcr_product(&template, &fwd, &rev) {
                Some(product) => {
                    let fasta = product_fasta(0, &product.sequence).map_err(|e| e.to_string())?;
                    print_json(&json!({ "product": product, "fasta": fasta }))
                }
                None => print_json(&json!({ "product": null })),
            }
        }
        "sites" => {
            let seq = clean_sequence(&positional(rest, 0, "sequence")?, false)
                .map_err(|e| e.to_string())?;
            let matches: Vec<_> = ENZYMES
                .restriction_enzymes()
                .iter()
                .flat_map(|enzyme| enzyme.get_matches(&seq))
                .collect();
            print_json(&json!({ "site_count": matches.len(), "sites": matches }))
        }
        "export-primers" => {
            let out_path = positional(rest, 0, "output CSV path")?;
            let text = match rest.get(1).filter(|a| !a.starts_with("--")) {
                Some(path) => fs::read_to_string(path)
                    .map_err(|e| format!("Could not read primer JSON '{path}': {e}"))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .map_err(|e| format!("Could not read primer JSON from stdin: {e}"))?;
                    buffer
                }
            };
            let inputs: Vec<PrimerInput> =
                serde_json::from_str(&text).map_err(|e| format!("Invalid primer JSON: {e}"))?;
            let primers = inputs
                .iter()
                .map(|p| {
                    Primer::with_overhang(&p.name, &p.sequence, &p.overhang)
                        .map_err(|e| format!("Primer '{}': {e}", p.name))
                })
                .collect::<Result<Vec<_>, String>>()?;
            let file = fs::File::create(&out_path)
                .map_err(|e| format!("Could not create '{out_path}': {e}"))?;
            write_primer_csv(file, &primers).map_err(|e| e.to_string())?;
            println!("Wrote {} primers to '{out_path}'", primers.len());
            Ok(())
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
