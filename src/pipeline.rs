//! Region in, report out.

use std::path::Path;

use tokio::io::AsyncWrite;

use log::{debug, info};

use crate::bam;
use crate::error;
use crate::fasta;
use crate::pileup::{Pileup, PileupConfig};
use crate::region::Region;
use crate::report;
use crate::tally;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary
{
	/// Data rows written, header excluded.
	pub rows: u64,
	/// Reads dropped by the depth cap.
	pub dropped_reads: u64,
}

/// Write the report for `region` of the BAM at `bam_path` to `output`.
///
/// The region is checked and every input opened before anything is written,
/// so failures leave `output` empty.
pub async fn run<P, Q, W>(
	bam_path: P,
	reference_path: Q,
	region: &str,
	config: &PileupConfig,
	output: W,
) -> error::Result<Summary>
where
	P: AsRef<Path>,
	Q: AsRef<Path>,
	W: AsyncWrite + std::marker::Unpin,
{
	let region = Region::parse(region)?;

	let mut reference = fasta::IndexedReader::from_path(reference_path).await?;
	let mut reader = bam::IndexedReader::from_path(bam_path).await?;

	let region = region.resolve(reader.header())?;

	if !reference.contains(&region.contig)
	{
		return Err(error::Error::MissingReferenceContig(region.contig.clone()));
	}

	info!("piling up {}:{}-{}", region.contig, region.begin + 1, region.end);

	let mut writer = report::Writer::new(output);
	writer.write_header().await?;

	let mut pileup = Pileup::new(reader.query(&region), *config);
	let mut summary = Summary::default();

	while let Some(column) = pileup.advance().await?
	{
		// reads overlapping the region edges produce columns outside it
		if column.tid != region.tid as i32 || column.pos < region.begin
		{
			continue;
		}

		if column.pos >= region.end
		{
			break;
		}

		let tally = tally::aggregate(&column);
		if tally.depth == 0
		{
			debug!("no base calls at {}:{}", region.contig, column.pos + 1);
			continue;
		}

		let ref_base = reference
			.fetch_base(&region.contig, column.pos as u64)
			.await?;

		writer
			.write_row(&region.contig, column.pos + 1, ref_base, &tally)
			.await?;
		summary.rows += 1;
	}

	summary.dropped_reads = pileup.dropped_reads();
	writer.finish().await?;

	Ok(summary)
}
