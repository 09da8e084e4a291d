//! `contig:beg-end` regions.
//!
//! Coordinates on the command line are 1-based and inclusive; internally a
//! region is 0-based and half-open.

use std::fmt;

use crate::bam::Header;
use crate::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region
{
	pub contig: String,
	pub begin: u64,
	pub end: u64,
}

/// A region checked against a BAM header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegion
{
	pub tid: usize,
	pub contig: String,
	pub begin: u32,
	pub end: u32,
}

impl Region
{
	pub fn parse(text: &str) -> error::Result<Region>
	{
		let invalid = || error::Error::InvalidRegion(text.to_string());

		// contig names may themselves contain ':'
		let (contig, range) = text.rsplit_once(':').ok_or_else(invalid)?;
		let (beg, end) = range.split_once('-').ok_or_else(invalid)?;

		if contig.is_empty()
		{
			return Err(invalid());
		}

		let beg = parse_coordinate(beg).ok_or_else(invalid)?.max(1);
		let end = parse_coordinate(end).ok_or_else(invalid)?;

		if end < beg
		{
			return Err(invalid());
		}

		Ok(Region {
			contig: contig.to_string(),
			begin: beg - 1,
			end,
		})
	}

	pub fn resolve(&self, header: &Header) -> error::Result<ResolvedRegion>
	{
		let tid = header
			.tid(&self.contig)
			.ok_or_else(|| error::Error::UnknownContig(self.contig.clone()))?;

		let length = header.references[tid].length;

		if self.begin >= length as u64
		{
			return Err(error::Error::RegionOutOfBounds {
				contig: self.contig.clone(),
				begin: self.begin + 1,
				length,
			});
		}

		Ok(ResolvedRegion {
			tid,
			contig: self.contig.clone(),
			begin: self.begin as u32,
			end: self.end.min(length as u64) as u32,
		})
	}
}

impl ResolvedRegion
{
	pub fn contains(&self, pos: u32) -> bool
	{
		pos >= self.begin && pos < self.end
	}
}

impl fmt::Display for Region
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		write!(f, "{}:{}-{}", self.contig, self.begin + 1, self.end)
	}
}

// digits with optional thousands separators
fn parse_coordinate(text: &str) -> Option<u64>
{
	let digits: String = text.chars().filter(|&c| c != ',').collect();

	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())
	{
		return None;
	}

	digits.parse().ok()
}
