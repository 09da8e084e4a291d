//! Multi-read pileup over a coordinate-sorted record stream.
//!
//! [`Pileup`] sweeps a cursor along the reference. Records are admitted into
//! the active set when the cursor reaches their start and retired once the
//! cursor passes their end; every position covered by at least one active
//! read is reported as a [`Column`] with one [`PileupEntry`] per read.

mod walker;

use log::{debug, warn};

use crate::bam::{AlignedRecord, RecordSource, Strand};
use crate::error;
use crate::pileup::walker::CigarWalker;

/// Default cap on simultaneously active reads.
pub const MAX_DEPTH: u32 = 0xFFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PileupConfig
{
	/// Reads arriving while this many are active are dropped.
	pub max_depth: u32,
	/// Log a warning at every position where the cap drops reads.
	pub warn_on_cap: bool,
}

impl Default for PileupConfig
{
	fn default() -> Self
	{
		PileupConfig {
			max_depth: MAX_DEPTH,
			warn_on_cap: false,
		}
	}
}

/// One read's state at one reference position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PileupEntry
{
	/// Index of the read in the active set, valid for the current column only.
	pub slot: usize,
	pub is_deletion: bool,
	pub is_ref_skip: bool,
	/// Length of an insertion (> 0) or deletion (< 0) starting after this base.
	pub indel_length: i32,
	/// Offset into the read sequence; meaningless for deletions and skips.
	pub query_offset: usize,
	pub strand: Strand,
}

impl PileupEntry
{
	pub fn is_gap(&self) -> bool
	{
		self.is_deletion || self.is_ref_skip
	}
}

struct ActiveRead
{
	record: AlignedRecord,
	end: i64,
	walker: CigarWalker,
}

impl ActiveRead
{
	fn new(record: AlignedRecord) -> Self
	{
		ActiveRead {
			end: record.end(),
			walker: CigarWalker::new(&record),
			record,
		}
	}
}

/// All reads overlapping one reference position.
pub struct Column<'a>
{
	pub tid: i32,
	/// 0-based reference position.
	pub pos: u32,
	entries: &'a [PileupEntry],
	reads: &'a [ActiveRead],
}

impl<'a> Column<'a>
{
	pub fn entries(&self) -> &'a [PileupEntry]
	{
		self.entries
	}

	pub fn len(&self) -> usize
	{
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.entries.is_empty()
	}

	/// Entries in arrival order, each with the record it describes.
	pub fn iter(&self) -> impl Iterator<Item = (&'a PileupEntry, &'a AlignedRecord)> + 'a
	{
		let reads = self.reads;
		self.entries
			.iter()
			.map(move |entry| (entry, &reads[entry.slot].record))
	}
}

pub struct Pileup<S>
{
	source: S,
	config: PileupConfig,
	pending: Option<AlignedRecord>,
	exhausted: bool,
	last_start: Option<(i32, i32)>,
	active: Vec<ActiveRead>,
	entries: Vec<PileupEntry>,
	tid: i32,
	pos: i64,
	emitted: bool,
	dropped: u64,
}

impl<S> Pileup<S>
where
	S: RecordSource,
{
	pub fn new(source: S, config: PileupConfig) -> Self
	{
		let config = PileupConfig {
			max_depth: config.max_depth.max(1),
			..config
		};

		Pileup {
			source,
			config,
			pending: None,
			exhausted: false,
			last_start: None,
			active: Vec::new(),
			entries: Vec::new(),
			tid: -1,
			pos: -1,
			emitted: false,
			dropped: 0,
		}
	}

	/// Reads discarded so far because the active set was full.
	pub fn dropped_reads(&self) -> u64
	{
		self.dropped
	}

	/// Number of reads overlapping the cursor.
	pub fn active_reads(&self) -> usize
	{
		self.active.len()
	}

	/// The next covered position, in increasing (contig, position) order, or
	/// `None` once the record stream is exhausted.
	pub async fn advance(&mut self) -> error::Result<Option<Column<'_>>>
	{
		if self.emitted
		{
			self.emitted = false;
			self.step();
		}

		if self.active.is_empty()
		{
			if !self.fill_pending().await?
			{
				return Ok(None);
			}

			if let Some(next) = &self.pending
			{
				if next.ref_id != self.tid
				{
					debug!("pileup moving to reference {}", next.ref_id);
				}
				self.tid = next.ref_id;
				self.pos = next.pos as i64;
			}
		}

		self.admit().await?;

		let pos = self.pos;
		self.entries.clear();
		for (slot, read) in self.active.iter_mut().enumerate()
		{
			if let Some(entry) = read.walker.resolve(&read.record, pos, slot)
			{
				self.entries.push(entry);
			}
		}

		self.emitted = true;

		Ok(Some(Column {
			tid: self.tid,
			pos: pos as u32,
			entries: &self.entries,
			reads: &self.active,
		}))
	}

	// Move the cursor one base on and retire reads that ended before it.
	fn step(&mut self)
	{
		self.pos += 1;
		let pos = self.pos;
		self.active.retain(|read| read.end > pos);
	}

	// Admit every record starting at or before the cursor.
	async fn admit(&mut self) -> error::Result<()>
	{
		let mut dropped_here = 0u64;

		while self.fill_pending().await?
		{
			let starts_here = self
				.pending
				.as_ref()
				.is_some_and(|next| next.ref_id == self.tid && next.pos as i64 <= self.pos);

			if !starts_here
			{
				break;
			}

			let Some(record) = self.pending.take()
			else
			{
				break;
			};

			if self.active.len() >= self.config.max_depth as usize
			{
				dropped_here += 1;
				continue;
			}

			self.active.push(ActiveRead::new(record));
		}

		if dropped_here > 0
		{
			self.dropped += dropped_here;

			if self.config.warn_on_cap
			{
				warn!(
					"depth cap of {} reached at {}:{}, dropped {} reads",
					self.config.max_depth,
					self.tid,
					self.pos + 1,
					dropped_here
				);
			}
		}

		Ok(())
	}

	// Make sure `pending` holds the next usable record; false at end of stream.
	async fn fill_pending(&mut self) -> error::Result<bool>
	{
		while self.pending.is_none() && !self.exhausted
		{
			let Some(record) = self.source.next_record().await?
			else
			{
				self.exhausted = true;
				break;
			};

			if record.ref_id < 0 || record.end() <= record.pos as i64
			{
				debug!("ignoring {} without reference span", record.read_name_as_str());
				continue;
			}

			if let Some((prev_tid, prev_pos)) = self.last_start
			{
				if (record.ref_id, record.pos) < (prev_tid, prev_pos)
				{
					return Err(error::Error::UnsortedInput {
						tid: record.ref_id,
						pos: record.pos,
						prev_tid,
						prev_pos,
					});
				}
			}

			self.last_start = Some((record.ref_id, record.pos));
			self.pending = Some(record);
		}

		Ok(self.pending.is_some())
	}
}
