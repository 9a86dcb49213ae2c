// FASTA reads input with transparent gzip decoding, batched so the search
// can start while the reader thread is still pulling records off the disk.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::thread;

use bio::io::fasta;
use crossbeam_channel::{bounded, Receiver};
use flate2::read::GzDecoder;

use crate::error::{Error, Result};

const DEFAULT_BATCH: usize = 512;

pub struct ReadBatch {
    pub names: Vec<String>,
    pub seqs: Vec<Vec<u8>>,
}

impl ReadBatch {
    pub fn new() -> Self {
        ReadBatch {
            names: Vec::new(),
            seqs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ReadBatch {
    fn default() -> Self {
        ReadBatch::new()
    }
}

pub struct FastaReader {
    records: fasta::Records<std::io::BufReader<Box<dyn Read + Send>>>,
    path: PathBuf,
}

impl FastaReader {
    /// Opens a FASTA file; `.gz` suffixes decode transparently.
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let reader: Box<dyn Read + Send> = if path.to_string_lossy().ends_with(".gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(FastaReader {
            records: fasta::Reader::new(reader).records(),
            path: path.to_path_buf(),
        })
    }

    /// Pulls up to `batch_size` records; empty at end of input.
    pub fn read_batch(&mut self, batch_size: usize) -> Result<ReadBatch> {
        let mut batch = ReadBatch::new();
        for _ in 0..batch_size {
            match self.records.next() {
                Some(Ok(record)) => {
                    batch.names.push(record.id().to_string());
                    batch.seqs.push(record.seq().to_ascii_uppercase());
                }
                Some(Err(e)) => {
                    return Err(Error::InvalidInput(format!(
                        "{}: {}",
                        self.path.display(),
                        e
                    )))
                }
                None => break,
            }
        }
        Ok(batch)
    }

    /// Drains the whole file into one batch.
    pub fn read_all(&mut self) -> Result<ReadBatch> {
        let mut all = ReadBatch::new();
        loop {
            let mut batch = self.read_batch(DEFAULT_BATCH)?;
            if batch.is_empty() {
                break;
            }
            all.names.append(&mut batch.names);
            all.seqs.append(&mut batch.seqs);
        }
        Ok(all)
    }
}

/// Reader thread feeding batches through a bounded channel.
pub fn spawn_reader(
    path: PathBuf,
    batch_size: usize,
) -> (Receiver<Result<ReadBatch>>, thread::JoinHandle<()>) {
    let (tx, rx) = bounded(4);
    let handle = thread::spawn(move || {
        let mut reader = match FastaReader::new(&path) {
            Ok(reader) => reader,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };
        loop {
            match reader.read_batch(batch_size) {
                Ok(batch) if batch.is_empty() => break,
                Ok(batch) => {
                    if tx.send(Ok(batch)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });
    (rx, handle)
}
