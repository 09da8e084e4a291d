//! Per-position tallies of bases and indels.

use crate::bam::Strand;
use crate::pileup::{Column, PileupEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base
{
	A,
	C,
	G,
	T,
	N,
}

impl Base
{
	/// Any symbol other than A, C, G or T (in either case) is an N.
	pub fn from_byte(byte: u8) -> Base
	{
		match byte.to_ascii_uppercase()
		{
			b'A' => Base::A,
			b'C' => Base::C,
			b'G' => Base::G,
			b'T' => Base::T,
			_ => Base::N,
		}
	}

	fn index(self) -> usize
	{
		self as usize
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StrandCounts
{
	pub forward: u32,
	pub reverse: u32,
}

impl StrandCounts
{
	fn add(&mut self, strand: Strand)
	{
		match strand
		{
			Strand::Forward => self.forward += 1,
			Strand::Reverse => self.reverse += 1,
		}
	}

	pub fn total(&self) -> u32
	{
		self.forward + self.reverse
	}
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PositionTally
{
	/// Reads contributing a base; deletions and skips excluded.
	pub depth: u32,
	/// Reads deleted or skipped at this position.
	pub gaps: u32,
	pub insertions: StrandCounts,
	pub deletions: StrandCounts,
	bases: [StrandCounts; 5],
}

impl PositionTally
{
	pub fn base_count(&self, base: Base) -> StrandCounts
	{
		self.bases[base.index()]
	}

	/// N is reported without strand.
	pub fn n_count(&self) -> u32
	{
		self.bases[Base::N.index()].total()
	}

	/// Count one pileup entry. `base` is the read base at the entry's query
	/// offset and is ignored for gaps; a missing base counts as N.
	pub fn add(&mut self, entry: &PileupEntry, base: Option<u8>)
	{
		if entry.indel_length > 0
		{
			self.insertions.add(entry.strand);
		}
		else if entry.indel_length < 0
		{
			self.deletions.add(entry.strand);
		}

		if entry.is_gap()
		{
			self.gaps += 1;
			return;
		}

		let base = base.map_or(Base::N, Base::from_byte);
		self.bases[base.index()].add(entry.strand);
		self.depth += 1;
	}
}

/// Reduce a pileup column to counts.
pub fn aggregate(column: &Column<'_>) -> PositionTally
{
	let mut tally = PositionTally::default();

	for (entry, record) in column.iter()
	{
		let base = if entry.is_gap()
		{
			None
		}
		else
		{
			record.base(entry.query_offset)
		};
		tally.add(entry, base);
	}

	tally
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn entry(strand: Strand, indel_length: i32, gap: bool) -> PileupEntry
	{
		PileupEntry {
			slot: 0,
			is_deletion: gap,
			is_ref_skip: false,
			indel_length,
			query_offset: 0,
			strand,
		}
	}

	#[test]
	fn maps_bases_case_insensitively()
	{
		assert_eq!(Base::from_byte(b'a'), Base::A);
		assert_eq!(Base::from_byte(b'T'), Base::T);
		assert_eq!(Base::from_byte(b'='), Base::N);
		assert_eq!(Base::from_byte(b'R'), Base::N);
	}

	#[test]
	fn counts_bases_by_strand()
	{
		let mut tally = PositionTally::default();
		tally.add(&entry(Strand::Forward, 0, false), Some(b'A'));
		tally.add(&entry(Strand::Reverse, 0, false), Some(b'a'));
		tally.add(&entry(Strand::Reverse, 0, false), Some(b'G'));
		tally.add(&entry(Strand::Forward, 0, false), Some(b'N'));
		tally.add(&entry(Strand::Reverse, 0, false), Some(b'Y'));

		assert_eq!(tally.depth, 5);
		assert_eq!(tally.base_count(Base::A), StrandCounts { forward: 1, reverse: 1 });
		assert_eq!(tally.base_count(Base::G), StrandCounts { forward: 0, reverse: 1 });
		assert_eq!(tally.base_count(Base::C).total(), 0);
		assert_eq!(tally.n_count(), 2);
	}

	#[test]
	fn gaps_leave_depth_but_still_count_indels()
	{
		let mut tally = PositionTally::default();
		tally.add(&entry(Strand::Forward, 0, true), None);
		// a deleted base followed by an insertion
		tally.add(&entry(Strand::Reverse, 2, true), None);
		tally.add(&entry(Strand::Forward, -3, false), Some(b'C'));
		tally.add(&entry(Strand::Forward, 1, false), Some(b'C'));

		assert_eq!(tally.depth, 2);
		assert_eq!(tally.gaps, 2);
		assert_eq!(tally.insertions, StrandCounts { forward: 1, reverse: 1 });
		assert_eq!(tally.deletions, StrandCounts { forward: 1, reverse: 0 });
		assert_eq!(tally.base_count(Base::C).forward, 2);
	}

	#[test]
	fn base_counts_sum_to_depth()
	{
		let mut tally = PositionTally::default();
		for (i, base) in b"ACGTNXacgt".iter().enumerate()
		{
			let strand = if i % 2 == 0 { Strand::Forward } else { Strand::Reverse };
			tally.add(&entry(strand, 0, i == 3), Some(*base));
		}

		let acgt: u32 = [Base::A, Base::C, Base::G, Base::T]
			.iter()
			.map(|&base| tally.base_count(base).total())
			.sum();
		assert_eq!(acgt + tally.n_count(), tally.depth);
		assert_eq!(tally.depth, 9);
	}

	#[test]
	fn missing_base_counts_as_n()
	{
		let mut tally = PositionTally::default();
		tally.add(&entry(Strand::Forward, 0, false), None);
		assert_eq!(tally.n_count(), 1);
	}
}
