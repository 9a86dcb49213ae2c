use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use panmap::error::Result;
use panmap::io::{spawn_reader, SamWriter};
use panmap::matcher::SeedMatcherKind;
use panmap::options::{default_threads, SearchOptions};
use panmap::search::{run_search, CancelToken, PassThroughFilter};
use panmap::serialize::load_store_file;
use panmap::utils;
use panmap::variant::VariantKind;

#[derive(Parser)]
#[command(name = "panmap")]
#[command(about = "Approximate read search over a referentially compressed pan-genome", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search reads against a pan-genome store
    Search {
        /// Pan-genome store (.jst)
        #[arg(value_name = "STORE.JST")]
        store: PathBuf,

        /// Reads to search (.fa/.fasta, optionally .gz)
        #[arg(value_name = "READS.FA")]
        reads: PathBuf,

        /// Match output (.sam/.bam)
        #[arg(value_name = "OUT.SAM")]
        out: PathBuf,

        /// Allowed error rate per read
        #[arg(short = 'e', long, value_name = "FLOAT", default_value = "0.0")]
        error_rate: f64,

        /// Worker threads (default: OMP_NUM_THREADS, then all cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,

        /// Interleaved-Bloom-filter prefilter (.ibf)
        #[arg(short = 'i', long, value_name = "FILE")]
        prefilter: Option<PathBuf>,

        /// Matcher driving the seed phase
        #[arg(long, value_enum, value_name = "KIND", default_value = "shift-or")]
        seed_matcher: SeedMatcherArg,

        /// Reference chunk size per worker task
        #[arg(long, value_name = "INT")]
        chunk_size: Option<usize>,

        /// Abort the search after this many seconds, keeping partial output
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// Errors only
        #[arg(short = 'q', long, conflicts_with = "verbose")]
        quiet: bool,

        /// Debug output
        #[arg(short = 'v', long)]
        verbose: bool,
    },

    /// Print a store summary
    View {
        /// Pan-genome store (.jst)
        #[arg(value_name = "STORE.JST")]
        store: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SeedMatcherArg {
    Horspool,
    ShiftOr,
    Myers,
    Naive,
}

impl From<SeedMatcherArg> for SeedMatcherKind {
    fn from(arg: SeedMatcherArg) -> Self {
        match arg {
            SeedMatcherArg::Horspool => SeedMatcherKind::Horspool,
            SeedMatcherArg::ShiftOr => SeedMatcherKind::ShiftOr,
            SeedMatcherArg::Myers => SeedMatcherKind::Myers,
            SeedMatcherArg::Naive => SeedMatcherKind::Naive,
        }
    }
}

fn init_logger(verbosity: i32) {
    let level = match verbosity {
        v if v <= 0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Search {
            store,
            reads,
            out,
            error_rate,
            threads,
            prefilter,
            seed_matcher,
            chunk_size,
            timeout,
            quiet,
            verbose,
        } => {
            let verbosity = if quiet {
                0
            } else if verbose {
                2
            } else {
                1
            };
            init_logger(verbosity);
            let options = SearchOptions {
                store_path: store,
                reads_path: reads,
                out_path: out,
                prefilter_path: prefilter,
                error_rate,
                threads: default_threads(threads),
                chunk_size,
                timeout: timeout.map(Duration::from_secs),
                seed_matcher: seed_matcher.into(),
                verbosity,
            };
            run_search_command(options)
        }
        Commands::View { store } => {
            init_logger(1);
            run_view_command(&store)
        }
    };

    if let Err(e) = outcome {
        log::error!("[{}] {}", e.category(), e);
        std::process::exit(-1);
    }
}

fn run_search_command(options: SearchOptions) -> Result<()> {
    options.validate()?;

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build_global()
    {
        log::warn!("thread pool already configured: {}", e);
    }
    log::info!("using {} worker threads", options.threads);

    if options.prefilter_path.is_some() {
        log::warn!("prefilter given but no filter implementation is linked; searching every chunk");
    }
    if options
        .out_path
        .to_string_lossy()
        .ends_with(".bam")
    {
        log::warn!("BAM output is delegated to downstream tooling; writing SAM text");
    }

    let t0 = utils::realtime();
    let store = load_store_file(&options.store_path)?;
    log::info!(
        "store: {} bp reference, {} variants, {} haplotypes ({:.2}s)",
        store.source().len(),
        store.rows().len(),
        store.haplotypes(),
        utils::realtime() - t0
    );

    let out_file = File::create(&options.out_path)
        .map_err(|e| panmap::Error::io(&options.out_path, e))?;
    let mut writer = SamWriter::new(BufWriter::new(out_file));
    writer.write_header(&store)?;

    // reads stream in batches from a dedicated thread while workers search
    let (batches, reader) = spawn_reader(options.reads_path.clone(), 512);
    let config = options.search_config();
    let token = CancelToken::new();
    let mut total = 0usize;
    let mut mapped = 0usize;
    let mut failed_chunks = 0usize;
    let mut cancelled = false;

    for batch in batches {
        let batch = batch?;
        let outcome = run_search(&store, &batch.seqs, &config, &PassThroughFilter, &token)?;
        for (i, (name, seq)) in batch.names.iter().zip(&batch.seqs).enumerate() {
            match outcome.matches.get(&i).filter(|m| !m.is_empty()) {
                Some(matches) => {
                    mapped += 1;
                    for m in matches {
                        writer.write_match(&store, name, seq, m)?;
                    }
                }
                None => writer.write_unmapped(name, seq)?,
            }
        }
        total += batch.len();
        failed_chunks += outcome.failures.len();
        cancelled |= outcome.cancelled;
        if cancelled {
            break;
        }
    }
    reader.join().ok();
    writer.flush()?;
    log::info!(
        "{} of {} reads matched, output written to {}",
        mapped,
        total,
        options.out_path.display()
    );

    if failed_chunks > 0 {
        return Err(panmap::Error::InvalidInput(format!(
            "{} chunks failed; see the log",
            failed_chunks
        )));
    }
    if cancelled {
        return Err(panmap::Error::Cancelled);
    }
    Ok(())
}

fn run_view_command(path: &PathBuf) -> Result<()> {
    let store = load_store_file(path)?;
    let mut counts = [0usize; 4];
    for row in store.rows() {
        let slot = match row.variant.kind() {
            VariantKind::Snv => 0,
            VariantKind::Insertion => 1,
            VariantKind::Deletion => 2,
            VariantKind::Substitution => 3,
        };
        counts[slot] += 1;
    }
    println!("store:          {}", path.display());
    println!("reference:      {} bp", store.source().len());
    println!("haplotypes:     {}", store.haplotypes());
    println!("variants:       {}", store.rows().len());
    println!("  snvs:         {}", counts[0]);
    println!("  insertions:   {}", counts[1]);
    println!("  deletions:    {}", counts[2]);
    println!("  substitutions:{}", counts[3]);
    Ok(())
}
