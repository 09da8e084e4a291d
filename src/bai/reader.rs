use std::path::Path;
use std::ops::Range;

use rustc_hash::FxHashMap;

use tokio::fs::File as TokioFile;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader as TokioBufReader};

use log::debug;

use crate::bai::{Index, Reference, Region, METADATA_BIN};
use crate::error;

const BAI_MAGIC: [u8; 4] = [b'B', b'A', b'I', 1];

impl Index
{
	pub(crate) async fn from_reader<R>(reader: R) -> error::Result<Index>
	where
		R: AsyncRead + std::marker::Send + std::marker::Unpin,
	{
		let mut reader = TokioBufReader::new(reader);

		let mut bytes = [0u8; 4];
		reader
			.read_exact(&mut bytes)
			.await
			.map_err(|_| error::Error::BaiFormat)?;

		if bytes != BAI_MAGIC
		{
			return Err(error::Error::BaiFormat);
		}

		let n_refs = read_u32(&mut reader).await?;
		debug!("n_refs = {}", n_refs);

		let mut ref_indices = Vec::with_capacity(n_refs as usize);

		for _ in 0..n_refs
		{
			let n_bin = read_u32(&mut reader).await?;

			let mut bins = FxHashMap::default();

			for _ in 0..n_bin
			{
				let bin = read_u32(&mut reader).await?;
				let n_chunk = read_u32(&mut reader).await?;

				let mut chunks = Region::with_capacity(n_chunk as usize);

				for _ in 0..n_chunk
				{
					let chunk_beg = read_u64(&mut reader).await?;
					let chunk_end = read_u64(&mut reader).await?;

					chunks.push(Range {
						start: chunk_beg,
						end: chunk_end,
					});
				}

				if bin != METADATA_BIN
				{
					bins.insert(bin, chunks);
				}
			}

			let n_intv = read_u32(&mut reader).await?;

			let mut intervals = Vec::with_capacity(n_intv as usize);
			for _ in 0..n_intv
			{
				intervals.push(read_u64(&mut reader).await?);
			}

			ref_indices.push(Reference { bins, intervals });
		}

		Ok(Index { ref_indices })
	}

	pub(crate) async fn from_path(path: &Path) -> error::Result<Index>
	{
		let bai_file = TokioFile::open(path)
			.await
			.map_err(|_| error::Error::IOError(path.to_string_lossy().to_string()))?;

		Self::from_reader(bai_file).await
	}
}

async fn read_u32<R>(reader: &mut TokioBufReader<R>) -> error::Result<u32>
where
	R: AsyncRead + std::marker::Unpin,
{
	let mut bytes = [0u8; 4];
	reader
		.read_exact(&mut bytes)
		.await
		.map_err(|_| error::Error::BaiFormat)?;
	Ok(u32::from_le_bytes(bytes))
}

async fn read_u64<R>(reader: &mut TokioBufReader<R>) -> error::Result<u64>
where
	R: AsyncRead + std::marker::Unpin,
{
	let mut bytes = [0u8; 8];
	reader
		.read_exact(&mut bytes)
		.await
		.map_err(|_| error::Error::BaiFormat)?;
	Ok(u64::from_le_bytes(bytes))
}
