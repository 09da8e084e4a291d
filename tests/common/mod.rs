//! Fixture writers: BGZF-compressed BAM with a BAI, and FASTA with a .fai.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use quickgt::bam::parse_cigar;
use quickgt::pileup::PileupConfig;

const CIGAR_CODES: &[u8] = b"MIDNSHP=X";
const SEQ_CODES: &[u8] = b"=ACMGRSVTWYHKDBN";

pub const BGZF_EOF: [u8; 28] = [
	0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
	0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub fn crc32(data: &[u8]) -> u32
{
	let mut crc = 0xFFFF_FFFFu32;
	for &byte in data
	{
		crc ^= byte as u32;
		for _ in 0..8
		{
			if crc & 1 != 0
			{
				crc = (crc >> 1) ^ 0xEDB8_8320;
			}
			else
			{
				crc >>= 1;
			}
		}
	}
	!crc
}

/// One BGZF block holding `data` in a stored (uncompressed) deflate block.
pub fn bgzf_block(data: &[u8]) -> Vec<u8>
{
	assert!(data.len() <= 60_000);

	let len = data.len() as u16;
	let total = 18 + 5 + data.len() + 8;

	let mut block = vec![
		0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0xff, 0x06, 0x00, b'B', b'C', 0x02, 0x00,
	];
	block.extend_from_slice(&((total - 1) as u16).to_le_bytes());
	block.push(0x01);
	block.extend_from_slice(&len.to_le_bytes());
	block.extend_from_slice(&(!len).to_le_bytes());
	block.extend_from_slice(data);
	block.extend_from_slice(&crc32(data).to_le_bytes());
	block.extend_from_slice(&(data.len() as u32).to_le_bytes());
	block
}

#[derive(Debug, Clone)]
pub struct TestRead
{
	pub name: String,
	pub tid: i32,
	pub pos: i32,
	pub flag: u16,
	pub cigar: String,
	pub seq: String,
}

/// A read at 0-based `pos`.
pub fn read(tid: i32, pos: i32, cigar: &str, seq: &str) -> TestRead
{
	TestRead {
		name: format!("r{}_{}", tid, pos),
		tid,
		pos,
		flag: 0,
		cigar: cigar.to_string(),
		seq: seq.to_string(),
	}
}

impl TestRead
{
	pub fn reverse(mut self) -> Self
	{
		self.flag |= 0x10;
		self
	}

	pub fn flag(mut self, flag: u16) -> Self
	{
		self.flag |= flag;
		self
	}

	pub fn named(mut self, name: &str) -> Self
	{
		self.name = name.to_string();
		self
	}

	/// Alignment record including its `block_size` prefix.
	pub fn encode(&self) -> Vec<u8>
	{
		let cigar = parse_cigar(&self.cigar).expect("valid cigar");
		let seq = self.seq.as_bytes();

		let mut body = Vec::new();
		body.extend_from_slice(&self.tid.to_le_bytes());
		body.extend_from_slice(&self.pos.to_le_bytes());
		body.push(self.name.len() as u8 + 1);
		body.push(60);
		body.extend_from_slice(&4680u16.to_le_bytes());
		body.extend_from_slice(&(cigar.len() as u16).to_le_bytes());
		body.extend_from_slice(&self.flag.to_le_bytes());
		body.extend_from_slice(&(seq.len() as u32).to_le_bytes());
		body.extend_from_slice(&(-1i32).to_le_bytes());
		body.extend_from_slice(&(-1i32).to_le_bytes());
		body.extend_from_slice(&0i32.to_le_bytes());
		body.extend_from_slice(self.name.as_bytes());
		body.push(0);

		for op in &cigar
		{
			let code = CIGAR_CODES.iter().position(|&c| c == op.opcode()).unwrap() as u32;
			body.extend_from_slice(&((op.len() << 4) | code).to_le_bytes());
		}

		let code = |base: u8| {
			SEQ_CODES
				.iter()
				.position(|&c| c == base.to_ascii_uppercase())
				.unwrap_or(15) as u8
		};
		for pair in seq.chunks(2)
		{
			let high = code(pair[0]) << 4;
			let low = pair.get(1).map_or(0, |&b| code(b));
			body.push(high | low);
		}
		body.extend(std::iter::repeat(30u8).take(seq.len()));
		// a tag, skipped by the reader
		body.extend_from_slice(b"RGZgroup1\0");

		let mut record = (body.len() as u32).to_le_bytes().to_vec();
		record.extend_from_slice(&body);
		record
	}
}

fn header_bytes(references: &[(&str, u32)]) -> Vec<u8>
{
	let mut text = String::from("@HD\tVN:1.6\tSO:coordinate\n");
	for (name, length) in references
	{
		text.push_str(&format!("@SQ\tSN:{}\tLN:{}\n", name, length));
	}

	let mut bytes = b"BAM\x01".to_vec();
	bytes.extend_from_slice(&(text.len() as u32).to_le_bytes());
	bytes.extend_from_slice(text.as_bytes());
	bytes.extend_from_slice(&(references.len() as u32).to_le_bytes());
	for (name, length) in references
	{
		bytes.extend_from_slice(&(name.len() as u32 + 1).to_le_bytes());
		bytes.extend_from_slice(name.as_bytes());
		bytes.push(0);
		bytes.extend_from_slice(&length.to_le_bytes());
	}
	bytes
}

/// Write `<dir>/<name>.bam` and its `.bam.bai`; `reads` must be sorted.
/// Records are packed `records_per_block` to a BGZF block.
pub fn write_bam(
	dir: &Path,
	name: &str,
	references: &[(&str, u32)],
	reads: &[TestRead],
	records_per_block: usize,
) -> PathBuf
{
	let mut bam = bgzf_block(&header_bytes(references));

	// (first start, last end) virtual offsets per reference
	let mut spans: Vec<Option<(u64, u64)>> = vec![None; references.len()];

	for group in reads.chunks(records_per_block.max(1))
	{
		let block_offset = bam.len() as u64;
		let mut data = Vec::new();

		for read in group
		{
			let start = (block_offset << 16) | data.len() as u64;
			data.extend_from_slice(&read.encode());
			let end = (block_offset << 16) | data.len() as u64;

			if read.tid >= 0
			{
				let span = &mut spans[read.tid as usize];
				*span = Some(span.map_or((start, end), |(first, _)| (first, end)));
			}
		}

		bam.extend_from_slice(&bgzf_block(&data));
	}

	bam.extend_from_slice(&BGZF_EOF);

	let mut bai = b"BAI\x01".to_vec();
	bai.extend_from_slice(&(references.len() as u32).to_le_bytes());
	for span in &spans
	{
		match span
		{
			Some((start, end)) =>
			{
				bai.extend_from_slice(&1u32.to_le_bytes());
				bai.extend_from_slice(&0u32.to_le_bytes());
				bai.extend_from_slice(&1u32.to_le_bytes());
				bai.extend_from_slice(&start.to_le_bytes());
				bai.extend_from_slice(&end.to_le_bytes());
			}
			None => bai.extend_from_slice(&0u32.to_le_bytes()),
		}
		bai.extend_from_slice(&0u32.to_le_bytes());
	}

	let bam_path = dir.join(format!("{}.bam", name));
	fs::write(&bam_path, bam).unwrap();
	fs::write(dir.join(format!("{}.bam.bai", name)), bai).unwrap();
	bam_path
}

/// Write `<dir>/<name>` with `line_bases` bases per line, plus a `.fai`
/// when `with_fai` is set.
pub fn write_fasta(
	dir: &Path,
	name: &str,
	contigs: &[(&str, &str)],
	line_bases: usize,
	with_fai: bool,
) -> PathBuf
{
	let mut fasta = String::new();
	let mut fai = String::new();

	for (contig, sequence) in contigs
	{
		fasta.push_str(&format!(">{} test contig\n", contig));
		let offset = fasta.len();

		for line in sequence.as_bytes().chunks(line_bases)
		{
			fasta.push_str(std::str::from_utf8(line).unwrap());
			fasta.push('\n');
		}

		fai.push_str(&format!(
			"{}\t{}\t{}\t{}\t{}\n",
			contig,
			sequence.len(),
			offset,
			line_bases,
			line_bases + 1
		));
	}

	let path = dir.join(name);
	fs::write(&path, fasta).unwrap();
	if with_fai
	{
		fs::write(dir.join(format!("{}.fai", name)), fai).unwrap();
	}
	path
}

/// `ACGT` repeated to `length` bases.
pub fn reference_sequence(length: usize) -> String
{
	b"ACGT".iter().cycle().take(length).map(|&b| b as char).collect()
}

/// Report text for `region`.
pub async fn report(bam: &Path, fasta: &Path, region: &str, config: &PileupConfig) -> String
{
	let mut out = Vec::new();
	quickgt::pipeline::run(bam, fasta, region, config, &mut out)
		.await
		.expect("report");
	String::from_utf8(out).unwrap()
}

/// Data rows split into columns.
pub fn rows(report: &str) -> Vec<Vec<String>>
{
	report
		.lines()
		.skip(1)
		.map(|line| line.split('\t').map(str::to_string).collect())
		.collect()
}
