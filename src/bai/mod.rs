mod reader;

use std::ops::Range;

use rustc_hash::FxHashMap;

// pseudo-bin carrying mapped/unmapped counts rather than chunks
pub(crate) const METADATA_BIN: u32 = 37450;

// linear index window
const LINEAR_SHIFT: u32 = 14;

pub(crate) type Region = Vec<Range<u64>>;

#[derive(Default)]
pub(crate) struct Reference
{
	pub(crate) bins: FxHashMap<u32, Region>,
	pub(crate) intervals: Vec<u64>,
}

impl Reference
{
	pub(crate) fn flatten_bins(&self, search_bins: &[u32]) -> Vec<Range<u64>>
	{
		search_bins
			.iter()
			.filter_map(|bin| self.bins.get(bin))
			.flat_map(|region| region.iter().cloned())
			.collect()
	}

	/// Smallest virtual offset a record overlapping `start` can have.
	pub(crate) fn min_offset(&self, start: u64) -> u64
	{
		if self.intervals.is_empty()
		{
			return 0;
		}

		let window = ((start >> LINEAR_SHIFT) as usize).min(self.intervals.len() - 1);
		self.intervals[window]
	}

	/// Chunks to scan for records overlapping `[start, stop)`, sorted by
	/// offset with overlapping chunks merged.
	pub(crate) fn query_chunks(&self, start: u64, stop: u64) -> Vec<Range<u64>>
	{
		let min_offset = self.min_offset(start);

		let mut chunks: Vec<Range<u64>> = self
			.flatten_bins(&region_to_bins(start, stop))
			.into_iter()
			.filter(|chunk| chunk.end > min_offset)
			.collect();

		chunks.sort_by_key(|chunk| chunk.start);

		let mut merged: Vec<Range<u64>> = Vec::with_capacity(chunks.len());
		for chunk in chunks
		{
			match merged.last_mut()
			{
				Some(last) if chunk.start <= last.end =>
				{
					last.end = last.end.max(chunk.end);
				}
				_ => merged.push(chunk),
			}
		}

		for chunk in merged.iter_mut()
		{
			chunk.start = chunk.start.max(min_offset);
		}

		merged
	}
}

pub(crate) struct Index
{
	pub(crate) ref_indices: Vec<Reference>,
}

impl Index
{
	pub(crate) fn query(&self, tid: usize, start: u64, stop: u64) -> Vec<Range<u64>>
	{
		self.ref_indices
			.get(tid)
			.map(|reference| reference.query_chunks(start, stop))
			.unwrap_or_default()
	}
}

pub(crate) fn region_to_bins(start: u64, stop: u64) -> Vec<u32>
{
	let mut bins = Vec::new();
	let stop = stop.saturating_sub(1).max(start);

	bins.push(0);

	for k in (1 + (start >> 26))..=(1 + (stop >> 26))
	{
		bins.push(k as u32);
	}

	for k in (9 + (start >> 23))..=(9 + (stop >> 23))
	{
		bins.push(k as u32);
	}

	for k in (73 + (start >> 20))..=(73 + (stop >> 20))
	{
		bins.push(k as u32);
	}

	for k in (585 + (start >> 17))..=(585 + (stop >> 17))
	{
		bins.push(k as u32);
	}

	for k in (4681 + (start >> 14))..=(4681 + (stop >> 14))
	{
		bins.push(k as u32);
	}

	bins
}
