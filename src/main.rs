use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use quickgt::pileup::{PileupConfig, MAX_DEPTH};

const NOTES: &str = "\
Notes:
  Input BAM index required

  Output format (goes to stdout):
      CHR   contig name
      POS   1-based genomic coordinate
      REF   base on reference
      DEP   depth of coverage
      A     base A (on read mapped fwd;rev)
      C     base C (on read mapped fwd;rev)
      G     base G (on read mapped fwd;rev)
      T     base T (on read mapped fwd;rev)
      N     base N (on read mapped)
      INS   insertions (length insensitive, fwd;rev)
      DEL   deletions (length insensitive, fwd;rev)

  BAM filter criteria:
      QC fail, unmapped, secondary, duplicate, supplementary";

#[derive(Parser)]
#[command(name = "quickgt")]
#[command(version)]
#[command(about = "Quickly get genotype info from bam for given region", long_about = None)]
#[command(after_help = NOTES)]
struct Cli
{
	/// Coordinate-sorted BAM with a .bai index
	bam: PathBuf,

	/// Reference FASTA; a .fai next to it is used when present
	reference: PathBuf,

	/// Region as chr:beg-end, both coordinates 1-based
	region: String,

	/// Maximum number of reads piled up at one position
	#[arg(long, default_value_t = MAX_DEPTH, value_parser = clap::value_parser!(u32).range(1..))]
	max_depth: u32,

	/// Warn whenever the depth cap drops reads
	#[arg(long)]
	warn_depth_cap: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()>
{
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	let cli = Cli::parse();

	let config = PileupConfig {
		max_depth: cli.max_depth,
		warn_on_cap: cli.warn_depth_cap,
	};

	let summary = quickgt::pipeline::run(
		&cli.bam,
		&cli.reference,
		&cli.region,
		&config,
		tokio::io::stdout(),
	)
	.await
	.with_context(|| format!("unable to report {}", cli.region))?;

	info!("{} positions reported", summary.rows);

	if summary.dropped_reads > 0 && !cli.warn_depth_cap
	{
		warn!(
			"{} reads dropped by the depth cap of {}",
			summary.dropped_reads, cli.max_depth
		);
	}

	Ok(())
}
