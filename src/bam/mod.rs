mod cigar;
mod header;
mod reader;

pub use crate::bam::cigar::*;
pub use crate::bam::header::*;
pub use crate::bam::reader::*;

use crate::error;

use log::debug;

use bitflags::bitflags;

const ALPHABET: [u8; 16] = [
	b'=', b'A', b'C', b'M', b'G', b'R', b'S', b'V', b'T', b'W', b'Y', b'H', b'K', b'D', b'B', b'N',
];

// fixed-size part of an alignment record, after block_size
const FIXED_FIELDS: usize = 32;

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct Flags: u16 {
		const PAIRED = 0x1;
		const PROPER_PAIR = 0x2;
		const UNMAPPED = 0x4;
		const MATE_UNMAPPED = 0x8;
		const REVERSE = 0x10;
		const MATE_REVERSE = 0x20;
		const READ1 = 0x40;
		const READ2 = 0x80;
		const SECONDARY = 0x100;
		const QC_FAIL = 0x200;
		const DUPLICATE = 0x400;
		const SUPPLEMENTARY = 0x800;
	}
}

impl Flags
{
	/// Reads excluded from every pileup.
	pub const FILTER: Flags = Flags::QC_FAIL
		.union(Flags::UNMAPPED)
		.union(Flags::SECONDARY)
		.union(Flags::DUPLICATE)
		.union(Flags::SUPPLEMENTARY);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand
{
	Forward,
	Reverse,
}

impl Strand
{
	pub fn index(self) -> usize
	{
		match self
		{
			Strand::Forward => 0,
			Strand::Reverse => 1,
		}
	}
}

#[derive(Debug, Clone)]
pub struct AlignedRecord
{
	pub ref_id: i32,
	pub pos: i32,
	pub mapq: u8,
	pub flags: Flags,
	pub read_name: Box<[u8]>,
	pub cigar: Vec<Cigar>,
	pub sequence: Box<[u8]>,
}

impl AlignedRecord
{
	pub fn new(ref_id: i32, pos: i32, flags: Flags, cigar: Vec<Cigar>, sequence: &[u8]) -> Self
	{
		AlignedRecord {
			ref_id,
			pos,
			mapq: 60,
			flags,
			read_name: Box::from(&b"*"[..]),
			cigar,
			sequence: Box::from(sequence),
		}
	}

	pub fn strand(&self) -> Strand
	{
		if self.flags.contains(Flags::REVERSE)
		{
			Strand::Reverse
		}
		else
		{
			Strand::Forward
		}
	}

	/// Exclusive 0-based end of the alignment on the reference.
	pub fn end(&self) -> i64
	{
		self.pos as i64 + reference_length(&self.cigar) as i64
	}

	pub fn base(&self, query_offset: usize) -> Option<u8>
	{
		self.sequence.get(query_offset).copied()
	}

	pub fn read_name_as_str(&self) -> &str
	{
		std::str::from_utf8(&self.read_name).unwrap_or("*")
	}

	pub fn sequence_as_str(&self) -> &str
	{
		std::str::from_utf8(&self.sequence).unwrap_or("")
	}
}

/// Decode one alignment record, `bytes` starting just after `block_size`.
pub(crate) fn decode_record(bytes: &[u8]) -> error::Result<AlignedRecord>
{
	if bytes.len() < FIXED_FIELDS
	{
		return Err(error::Error::BamFormat);
	}

	let ref_id = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
	let pos = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
	let l_read_name = bytes[8] as usize;
	let mapq = bytes[9];
	// bytes[10..12] is the bin
	let n_cigar_op = u16::from_le_bytes([bytes[12], bytes[13]]) as usize;
	let flag = u16::from_le_bytes([bytes[14], bytes[15]]);
	let l_seq = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]) as usize;
	// next_ref_id, next_pos and tlen follow and are not needed

	let mut offset = FIXED_FIELDS;

	// read_name - char[l_read_name], NUL terminated
	let read_name = bytes
		.get(offset..offset + l_read_name)
		.ok_or(error::Error::BamFormat)?;
	let read_name = Box::from(&read_name[..l_read_name.saturating_sub(1)]);
	offset += l_read_name;

	// cigar - uint32_t[n_cigar_op]
	let cigar = process_cigar(&bytes[offset..], n_cigar_op)?;
	offset += n_cigar_op * 4;

	// seq - uint8_t[(l_seq + 1) / 2]
	let packed = bytes
		.get(offset..offset + (l_seq + 1) / 2)
		.ok_or(error::Error::BamFormat)?;
	let sequence = process_sequence(packed, l_seq);
	offset += (l_seq + 1) / 2;

	// qual - char[l_seq]; tags follow and are skipped
	if bytes.len() < offset + l_seq
	{
		return Err(error::Error::BamFormat);
	}

	let record = AlignedRecord {
		ref_id,
		pos,
		mapq,
		flags: Flags::from_bits_retain(flag),
		read_name,
		cigar,
		sequence,
	};

	debug!(
		"record {} {}:{} flags {:#x} cigar ops {}",
		record.read_name_as_str(),
		ref_id,
		pos,
		flag,
		record.cigar.len()
	);

	Ok(record)
}

fn process_sequence(bytes: &[u8], l_seq: usize) -> Box<[u8]>
{
	let mut seq = Vec::with_capacity(l_seq);

	for byte in bytes
	{
		seq.push(ALPHABET[(byte >> 4) as usize]);
		seq.push(ALPHABET[(byte & 0x0F) as usize]);
	}

	// odd lengths carry a padding nibble
	seq.truncate(l_seq);

	seq.into_boxed_slice()
}
