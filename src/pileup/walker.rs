use crate::bam::{AlignedRecord, Cigar};
use crate::pileup::PileupEntry;

/// Position of one read's alignment relative to the pileup cursor.
///
/// The cursor only moves forward, so the walker keeps the CIGAR operation it
/// stopped on together with the reference and query coordinates at which that
/// operation starts.
#[derive(Debug, Clone)]
pub(crate) struct CigarWalker
{
	op_index: usize,
	ref_start: i64,
	query_start: usize,
}

impl CigarWalker
{
	pub(crate) fn new(record: &AlignedRecord) -> Self
	{
		CigarWalker {
			op_index: 0,
			ref_start: record.pos as i64,
			query_start: 0,
		}
	}

	/// Describe the read at reference position `pos`. `pos` must not be
	/// smaller than on the previous call.
	pub(crate) fn resolve(&mut self, record: &AlignedRecord, pos: i64, slot: usize) -> Option<PileupEntry>
	{
		let cigar = &record.cigar;

		while let Some(op) = cigar.get(self.op_index)
		{
			let length = op.len() as i64;

			if op.consumes_reference()
			{
				if pos < self.ref_start + length
				{
					break;
				}
				self.ref_start += length;
			}

			if op.consumes_query()
			{
				self.query_start += length as usize;
			}

			self.op_index += 1;
		}

		let op = cigar.get(self.op_index)?;

		if pos < self.ref_start
		{
			return None;
		}

		let mut entry = PileupEntry {
			slot,
			is_deletion: false,
			is_ref_skip: false,
			indel_length: 0,
			query_offset: self.query_start,
			strand: record.strand(),
		};

		if pos == self.ref_start + op.len() as i64 - 1
		{
			entry.indel_length = indel_after(cigar, self.op_index);
		}

		match op
		{
			Cigar::Deletion(_) => entry.is_deletion = true,
			Cigar::RefSkip(_) =>
			{
				entry.is_deletion = true;
				entry.is_ref_skip = true;
			}
			_ => entry.query_offset = self.query_start + (pos - self.ref_start) as usize,
		}

		Some(entry)
	}
}

// Indel starting right after operation `k`: positive for an insertion,
// negative for a deletion, zero otherwise.
fn indel_after(cigar: &[Cigar], k: usize) -> i32
{
	let Some(next) = cigar.get(k + 1)
	else
	{
		return 0;
	};

	match *next
	{
		Cigar::Deletion(length) if !matches!(cigar[k], Cigar::Deletion(_)) => -(length as i32),
		Cigar::Insertion(length) => length as i32,
		Cigar::Padding(_) =>
		{
			// insertions separated by padding still count
			let inserted: u32 = cigar[k + 2..]
				.iter()
				.take_while(|op| !op.consumes_reference())
				.filter_map(|op| match op
				{
					Cigar::Insertion(length) => Some(*length),
					_ => None,
				})
				.sum();
			inserted as i32
		}
		_ => 0,
	}
}
