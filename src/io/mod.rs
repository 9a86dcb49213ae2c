pub mod fasta_input;
pub mod sam_output;

pub use fasta_input::{spawn_reader, FastaReader, ReadBatch};
pub use sam_output::SamWriter;
