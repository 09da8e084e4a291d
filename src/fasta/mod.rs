//! Random access to single bases of a FASTA file through its `.fai` index.

mod reader;

pub use crate::fasta::reader::*;

use rustc_hash::FxHashMap;

use crate::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord
{
	pub name: String,
	pub length: u64,
	pub offset: u64,
	pub line_bases: u64,
	pub line_width: u64,
}

impl IndexRecord
{
	/// Byte offset of the 0-based position `pos` in the FASTA file.
	pub fn byte_offset(&self, pos: u64) -> u64
	{
		self.offset + pos / self.line_bases * self.line_width + pos % self.line_bases
	}
}

#[derive(Debug, Default)]
pub struct Index
{
	records: Vec<IndexRecord>,
	by_name: FxHashMap<String, usize>,
}

impl Index
{
	pub fn get(&self, name: &str) -> Option<&IndexRecord>
	{
		self.by_name.get(name).map(|&i| &self.records[i])
	}

	pub fn records(&self) -> &[IndexRecord]
	{
		&self.records
	}

	fn push(&mut self, record: IndexRecord) -> error::Result<()>
	{
		if (record.line_bases == 0 && record.length > 0) || record.line_width < record.line_bases
		{
			return Err(error::Error::FaiFormat(format!(
				"bad line layout for '{}'",
				record.name
			)));
		}

		if self.by_name.contains_key(&record.name)
		{
			return Err(error::Error::FaiFormat(format!("duplicate sequence '{}'", record.name)));
		}

		self.by_name.insert(record.name.clone(), self.records.len());
		self.records.push(record);
		Ok(())
	}

	/// Parse the five-column `.fai` text format.
	pub fn parse(text: &str) -> error::Result<Index>
	{
		let mut index = Index::default();

		for (line_number, line) in text.lines().enumerate()
		{
			if line.trim().is_empty()
			{
				continue;
			}

			let fields: Vec<&str> = line.split('\t').collect();
			if fields.len() < 5
			{
				return Err(error::Error::FaiFormat(format!(
					"line {} has {} columns",
					line_number + 1,
					fields.len()
				)));
			}

			let number = |i: usize| -> error::Result<u64> {
				fields[i].trim().parse().map_err(|_| {
					error::Error::FaiFormat(format!("line {}: '{}' is not a number", line_number + 1, fields[i]))
				})
			};

			index.push(IndexRecord {
				name: fields[0].to_string(),
				length: number(1)?,
				offset: number(2)?,
				line_bases: number(3)?,
				line_width: number(4)?,
			})?;
		}

		Ok(index)
	}

	/// Build an index by scanning FASTA text. Every line of a sequence but the
	/// last must have the same length.
	pub fn build(fasta: &[u8]) -> error::Result<Index>
	{
		let mut index = Index::default();
		let mut current: Option<Builder> = None;
		let mut offset = 0u64;

		for line in fasta.split_inclusive(|&b| b == b'\n')
		{
			let width = line.len() as u64;
			let bases = line
				.iter()
				.take_while(|&&b| b != b'\n' && b != b'\r')
				.count() as u64;

			if line.first() == Some(&b'>')
			{
				if let Some(builder) = current.take()
				{
					index.push(builder.finish())?;
				}

				let name = String::from_utf8_lossy(&line[1..bases as usize])
					.split_whitespace()
					.next()
					.unwrap_or("")
					.to_string();

				current = Some(Builder::new(name, offset + width));
			}
			else if let Some(builder) = current.as_mut()
			{
				builder.add_line(bases, width)?;
			}
			else if bases > 0
			{
				return Err(error::Error::FaiFormat("sequence data before first header".to_string()));
			}

			offset += width;
		}

		if let Some(builder) = current.take()
		{
			index.push(builder.finish())?;
		}

		Ok(index)
	}
}

struct Builder
{
	record: IndexRecord,
	short_line_seen: bool,
}

impl Builder
{
	fn new(name: String, offset: u64) -> Self
	{
		Builder {
			record: IndexRecord {
				name,
				length: 0,
				offset,
				line_bases: 0,
				line_width: 0,
			},
			short_line_seen: false,
		}
	}

	fn add_line(&mut self, bases: u64, width: u64) -> error::Result<()>
	{
		if bases == 0
		{
			self.short_line_seen = true;
			return Ok(());
		}

		if self.record.line_bases == 0
		{
			self.record.line_bases = bases;
			self.record.line_width = width;
		}
		else if self.short_line_seen || bases > self.record.line_bases
		{
			return Err(error::Error::FaiFormat(format!(
				"different line length in sequence '{}'",
				self.record.name
			)));
		}

		if bases < self.record.line_bases || width < self.record.line_width
		{
			self.short_line_seen = true;
		}

		self.record.length += bases;
		Ok(())
	}

	fn finish(self) -> IndexRecord
	{
		self.record
	}
}
