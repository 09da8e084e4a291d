use rustc_hash::FxHashMap;

use tokio::io::{AsyncRead, AsyncSeek};

use log::debug;

use crate::bgzf;
use crate::error;

#[derive(Debug)]
pub struct TID
{
	pub name: Box<[u8]>,
	pub length: u32,
}

impl TID
{
	pub fn name_as_str(&self) -> &str
	{
		std::str::from_utf8(&self.name).unwrap_or("")
	}
}

#[derive(Debug)]
pub struct Header
{
	pub header: Box<[u8]>,
	pub references: Vec<TID>,
	by_name: FxHashMap<Box<[u8]>, usize>,
}

impl Header
{
	pub fn new(header: Box<[u8]>, references: Vec<TID>) -> Self
	{
		let by_name = references
			.iter()
			.enumerate()
			.map(|(tid, reference)| (reference.name.clone(), tid))
			.collect();

		Header {
			header,
			references,
			by_name,
		}
	}

	pub fn ref_name(&self, ref_id: i32) -> Option<&TID>
	{
		usize::try_from(ref_id)
			.ok()
			.and_then(|tid| self.references.get(tid))
	}

	pub fn tid(&self, name: &str) -> Option<usize>
	{
		self.by_name.get(name.as_bytes()).copied()
	}

	pub fn header_as_str(&self) -> &str
	{
		std::str::from_utf8(&self.header).unwrap_or("")
	}
}

pub(crate) async fn read_bam_header<R>(reader: &mut bgzf::Reader<R>) -> error::Result<Header>
where
	R: AsyncRead + AsyncSeek + Send + std::marker::Unpin,
{
	let mut magic = [0u8; 4];
	if !reader.read_exact(&mut magic).await? || !is_valid_bam(&magic)
	{
		return Err(error::Error::BamFormat);
	}

	let l_text = read_u32(reader).await? as usize;
	let mut text = vec![0u8; l_text];
	if !reader.read_exact(&mut text).await?
	{
		return Err(error::Error::BamFormat);
	}

	// header text may be NUL padded
	while text.last() == Some(&0)
	{
		text.pop();
	}

	let n_ref = read_u32(reader).await?;
	debug!("n_ref: {}", n_ref);

	let mut references = Vec::<TID>::with_capacity(n_ref as usize);

	for _ in 0..n_ref
	{
		let l_name = read_u32(reader).await? as usize;
		if l_name == 0
		{
			return Err(error::Error::BamFormat);
		}

		let mut name = vec![0u8; l_name];
		if !reader.read_exact(&mut name).await?
		{
			return Err(error::Error::BamFormat);
		}
		name.truncate(l_name - 1);

		let l_ref = read_u32(reader).await?;

		debug!("reference {} length {}", String::from_utf8_lossy(&name), l_ref);

		references.push(TID {
			name: name.into_boxed_slice(),
			length: l_ref,
		});
	}

	Ok(Header::new(text.into_boxed_slice(), references))
}

async fn read_u32<R>(reader: &mut bgzf::Reader<R>) -> error::Result<u32>
where
	R: AsyncRead + AsyncSeek + Send + std::marker::Unpin,
{
	let mut bytes = [0u8; 4];
	if !reader.read_exact(&mut bytes).await?
	{
		return Err(error::Error::BamFormat);
	}
	Ok(u32::from_le_bytes(bytes))
}

pub(crate) fn is_valid_bam(bytes: &[u8]) -> bool
{
	// check for magic BAM string ('BAM\1')
	bytes.len() >= 4 && bytes[0] == b'B' && bytes[1] == b'A' && bytes[2] == b'M' && bytes[3] == 1
}
