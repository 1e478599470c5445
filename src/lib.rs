use enzymes::Enzymes;
use lazy_static::lazy_static;

pub mod enzymes;
pub mod error;
pub mod export;
pub mod primer;
pub mod primer_binding;
pub mod primer_design;
pub mod restriction_enzyme;
pub mod sequence_loader;
pub mod sequence_text;
pub mod tasks;
pub mod thermodynamics;
pub mod window_render;

pub use error::{OligostoreError, Result};
pub use primer::{Primer, PrimerPair};
pub use primer_binding::{BindingHit, Strand, find_binding_sites, scan_sequence};
pub use sequence_loader::{SequenceFormat, SequenceRecord, SequenceSource};
pub use sequence_text::{clean_sequence, reverse_complement};

lazy_static! {
    // Restriction enzymes shipped with the crate
    pub static ref ENZYMES: Enzymes = Enzymes::default();
}
