//! Tab-separated report, one row per position.

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error;
use crate::tally::{Base, PositionTally, StrandCounts};

pub const HEADER: &str = "CHR\tPOS\tREF\tDEP\tA\tC\tG\tT\tN\tINS\tDEL";

pub struct Writer<W>
where
	W: AsyncWrite + std::marker::Unpin,
{
	writer: BufWriter<W>,
	itoa_buf: itoa::Buffer,
	line: Vec<u8>,
}

impl<W> Writer<W>
where
	W: AsyncWrite + std::marker::Unpin,
{
	pub fn new(output: W) -> Self
	{
		Writer {
			writer: BufWriter::new(output),
			itoa_buf: itoa::Buffer::new(),
			line: Vec::with_capacity(128),
		}
	}

	pub async fn write_header(&mut self) -> error::Result<()>
	{
		self.writer.write_all(HEADER.as_bytes()).await?;
		self.writer.write_all(b"\n").await?;
		Ok(())
	}

	/// Write one row; `pos` is 1-based.
	pub async fn write_row(
		&mut self,
		contig: &str,
		pos: u32,
		ref_base: u8,
		tally: &PositionTally,
	) -> error::Result<()>
	{
		self.line.clear();

		self.line.extend_from_slice(contig.as_bytes());
		self.line.push(b'\t');
		self.push_number(pos);
		self.line.push(b'\t');
		self.line.push(ref_base);
		self.line.push(b'\t');
		self.push_number(tally.depth);

		for base in [Base::A, Base::C, Base::G, Base::T]
		{
			self.line.push(b'\t');
			self.push_pair(tally.base_count(base));
		}

		self.line.push(b'\t');
		self.push_number(tally.n_count());
		self.line.push(b'\t');
		self.push_pair(tally.insertions);
		self.line.push(b'\t');
		self.push_pair(tally.deletions);
		self.line.push(b'\n');

		self.writer.write_all(&self.line).await?;
		Ok(())
	}

	/// Flush buffered rows and hand back the output.
	pub async fn finish(mut self) -> error::Result<W>
	{
		self.writer.flush().await?;
		Ok(self.writer.into_inner())
	}

	fn push_number(&mut self, value: u32)
	{
		self.line
			.extend_from_slice(self.itoa_buf.format(value).as_bytes());
	}

	// forward;reverse
	fn push_pair(&mut self, counts: StrandCounts)
	{
		self.push_number(counts.forward);
		self.line.push(b';');
		self.push_number(counts.reverse);
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use crate::bam::Strand;
	use crate::pileup::PileupEntry;

	fn add(tally: &mut PositionTally, strand: Strand, indel_length: i32, base: u8)
	{
		let entry = PileupEntry {
			slot: 0,
			is_deletion: false,
			is_ref_skip: false,
			indel_length,
			query_offset: 0,
			strand,
		};
		tally.add(&entry, Some(base));
	}

	#[tokio::test]
	async fn writes_header_and_rows()
	{
		let mut tally = PositionTally::default();
		add(&mut tally, Strand::Forward, 0, b'A');
		add(&mut tally, Strand::Reverse, 0, b'A');
		add(&mut tally, Strand::Forward, 2, b'T');
		add(&mut tally, Strand::Reverse, -1, b'N');
		add(&mut tally, Strand::Forward, 0, b'N');

		let mut writer = Writer::new(Vec::new());
		writer.write_header().await.unwrap();
		writer.write_row("chr1", 1001, b'A', &tally).await.unwrap();
		let out = String::from_utf8(writer.finish().await.unwrap()).unwrap();

		assert_eq!(
			out,
			"CHR\tPOS\tREF\tDEP\tA\tC\tG\tT\tN\tINS\tDEL\n\
			 chr1\t1001\tA\t5\t1;1\t0;0\t0;0\t1;0\t2\t1;0\t0;1\n"
		);
	}
}
