//! Block gzip (BGZF) reading with virtual offsets.
//!
//! A virtual offset packs the compressed offset of a block into the upper 48
//! bits and the offset inside the inflated block into the lower 16 bits.

use async_compression::tokio::bufread::GzipDecoder;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, BufReader as TokioBufReader, SeekFrom};

use log::debug;

use crate::error;

const BGZF_HEADER_SIZE: usize = 18;

pub struct Reader<R>
{
	reader: TokioBufReader<R>,
	block: Vec<u8>,
	position: usize,
	block_offset: u64,
	next_block_offset: u64,
}

impl<R> Reader<R>
where
	R: AsyncRead + AsyncSeek + std::marker::Send + std::marker::Unpin,
{
	pub fn new(reader: R) -> Self
	{
		Reader {
			reader: TokioBufReader::new(reader),
			block: Vec::new(),
			position: 0,
			block_offset: 0,
			next_block_offset: 0,
		}
	}

	/// Virtual offset of the next unread byte. An exhausted block reports the
	/// start of the following block.
	pub fn virtual_position(&self) -> u64
	{
		if self.position >= self.block.len()
		{
			self.next_block_offset << 16
		}
		else
		{
			(self.block_offset << 16) | self.position as u64
		}
	}

	pub async fn seek(&mut self, virtual_offset: u64) -> error::Result<()>
	{
		let (block_start, within_block) = (virtual_offset >> 16, (virtual_offset & 0xFFFF) as usize);

		debug!("seeking to block {} offset {}", block_start, within_block);

		self.reader
			.seek(SeekFrom::Start(block_start))
			.await
			.map_err(|_| error::Error::BamSeek(block_start))?;

		self.block.clear();
		self.position = 0;
		self.block_offset = block_start;
		self.next_block_offset = block_start;

		if within_block > 0
		{
			if !self.read_block().await?
			{
				return Err(error::Error::BamSeek(virtual_offset));
			}
			if within_block > self.block.len()
			{
				return Err(error::Error::BamSeek(virtual_offset));
			}
			self.position = within_block;
		}

		Ok(())
	}

	/// Fill `buf` completely. Returns `Ok(false)` on a clean end of stream
	/// before any byte was read.
	pub async fn read_exact(&mut self, buf: &mut [u8]) -> error::Result<bool>
	{
		let mut filled = 0;

		while filled < buf.len()
		{
			if self.position >= self.block.len()
			{
				if !self.read_block().await?
				{
					if filled == 0
					{
						return Ok(false);
					}
					return Err(error::Error::BGZTruncated);
				}
				continue;
			}

			let available = self.block.len() - self.position;
			let n = available.min(buf.len() - filled);
			buf[filled..filled + n].copy_from_slice(&self.block[self.position..self.position + n]);
			self.position += n;
			filled += n;
		}

		Ok(true)
	}

	// Loads the next non-empty block; false once the underlying stream ends.
	async fn read_block(&mut self) -> error::Result<bool>
	{
		loop
		{
			let mut header = [0u8; BGZF_HEADER_SIZE];

			if self.reader.read(&mut header[..1]).await? == 0
			{
				debug!("BGZF EOF at {}", self.next_block_offset);
				self.block.clear();
				self.position = 0;
				self.block_offset = self.next_block_offset;
				return Ok(false);
			}

			self.reader
				.read_exact(&mut header[1..])
				.await
				.map_err(|_| error::Error::BGZTruncated)?;

			if !is_valid_bgzf_header(&header)
			{
				return Err(error::Error::BGZInvalidHeader(header));
			}

			// BSIZE is the total block size minus one
			let bsize = u16::from_le_bytes([header[16], header[17]]) as usize + 1;

			let mut compressed_block = vec![0; bsize];
			compressed_block[..BGZF_HEADER_SIZE].copy_from_slice(&header);
			self.reader
				.read_exact(&mut compressed_block[BGZF_HEADER_SIZE..])
				.await
				.map_err(|_| error::Error::BGZTruncated)?;

			self.block_offset = self.next_block_offset;
			self.next_block_offset += bsize as u64;
			self.position = 0;

			if is_bgzf_eof(&compressed_block)
			{
				debug!("EOF marker block at {}", self.block_offset);
				self.block.clear();
				continue;
			}

			self.block = decompress_block(&compressed_block).await?;

			if !self.block.is_empty()
			{
				return Ok(true);
			}
		}
	}
}

pub(crate) fn is_bgzf_eof(bytes: &[u8]) -> bool
{
	bytes.len() == 28
		&& bytes[16..=27]
			== [
				0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
			]
}

pub(crate) fn is_valid_bgzf_header(header: &[u8]) -> bool
{
	if header.len() != BGZF_HEADER_SIZE
	{
		return false;
	}

	// gzip magic, deflate, FEXTRA set
	if header[0] != 0x1f || header[1] != 0x8b || header[2] != 0x08 || header[3] & 0x04 == 0
	{
		return false;
	}

	// XLEN = 6, SI1 = 'B', SI2 = 'C', SLEN = 2
	if header[10] != 0x06 || header[11] != 0x00 ||
	   header[12] != 0x42 || header[13] != 0x43 ||
	   header[14] != 0x02 || header[15] != 0x00
	{
		return false;
	}

	u16::from_le_bytes([header[16], header[17]]) as usize >= BGZF_HEADER_SIZE
}

async fn decompress_block(compressed_block: &[u8]) -> error::Result<Vec<u8>>
{
	let mut bytes: Vec<u8> = Vec::with_capacity(u16::MAX as usize + 1);
	let mut decoder = GzipDecoder::new(compressed_block);
	decoder
		.read_to_end(&mut bytes)
		.await
		.map_err(|_| error::Error::BGZDecompress)?;
	Ok(bytes)
}

#[cfg(test)]
mod tests
{
	use super::*;

	const EOF_BLOCK: [u8; 28] = [
		0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02,
		0x00, 0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
	];

	#[test]
	fn recognises_eof_marker()
	{
		assert!(is_valid_bgzf_header(&EOF_BLOCK[..18]));
		assert!(is_bgzf_eof(&EOF_BLOCK));
	}

	#[test]
	fn rejects_plain_gzip_header()
	{
		let mut header = [0u8; 18];
		header.copy_from_slice(&EOF_BLOCK[..18]);
		header[3] = 0;
		assert!(!is_valid_bgzf_header(&header));

		header.copy_from_slice(&EOF_BLOCK[..18]);
		header[12] = b'X';
		assert!(!is_valid_bgzf_header(&header));
	}

	#[tokio::test]
	async fn eof_only_stream_reads_nothing()
	{
		let mut reader = Reader::new(std::io::Cursor::new(EOF_BLOCK.to_vec()));
		let mut buf = [0u8; 4];
		assert!(!reader.read_exact(&mut buf).await.unwrap());
		assert_eq!(reader.virtual_position(), 28 << 16);
	}

	#[tokio::test]
	async fn garbage_is_rejected()
	{
		let mut reader = Reader::new(std::io::Cursor::new(vec![0u8; 40]));
		let mut buf = [0u8; 4];
		assert!(matches!(
			reader.read_exact(&mut buf).await,
			Err(error::Error::BGZInvalidHeader(_))
		));
	}
}
