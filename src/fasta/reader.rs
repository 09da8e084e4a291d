use std::path::Path;

use tokio::fs::File as TokioFile;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

use log::{debug, info};

use crate::error;
use crate::fasta::Index;
use crate::AsyncReadSeek;

/// Base returned for positions past the end of a contig.
pub const UNKNOWN_BASE: u8 = b'N';

pub struct IndexedReader<R>
where
	R: AsyncReadSeek + std::marker::Send + std::marker::Unpin,
{
	reader: R,
	index: Index,
}

impl IndexedReader<TokioFile>
{
	/// Open `path`, using `path.fai` when present and scanning the FASTA
	/// otherwise.
	pub async fn from_path<P>(path: P) -> error::Result<Self>
	where
		P: AsRef<Path>,
	{
		let path = path.as_ref();
		let open_error = || error::Error::IOError(path.to_string_lossy().to_string());

		let mut fai_path = path.as_os_str().to_owned();
		fai_path.push(".fai");
		let fai_path = Path::new(&fai_path);

		let mut file = TokioFile::open(path).await.map_err(|_| open_error())?;

		let index = if fai_path.exists()
		{
			debug!("Reading FASTA index {:?}", fai_path);
			let text = tokio::fs::read_to_string(fai_path)
				.await
				.map_err(|_| error::Error::IOError(fai_path.to_string_lossy().to_string()))?;
			Index::parse(&text)?
		}
		else
		{
			info!("{:?} has no .fai, indexing in memory", path);
			let mut fasta = Vec::new();
			file.read_to_end(&mut fasta).await.map_err(|_| open_error())?;
			Index::build(&fasta)?
		};

		Ok(IndexedReader::new(file, index))
	}
}

impl<R> IndexedReader<R>
where
	R: AsyncReadSeek + std::marker::Send + std::marker::Unpin,
{
	pub fn new(reader: R, index: Index) -> Self
	{
		IndexedReader { reader, index }
	}

	pub fn index(&self) -> &Index
	{
		&self.index
	}

	pub fn contains(&self, contig: &str) -> bool
	{
		self.index.get(contig).is_some()
	}

	/// The base at 0-based `pos` of `contig`, as stored in the file.
	pub async fn fetch_base(&mut self, contig: &str, pos: u64) -> error::Result<u8>
	{
		let record = self
			.index
			.get(contig)
			.ok_or_else(|| error::Error::MissingReferenceContig(contig.to_string()))?;

		if pos >= record.length
		{
			return Ok(UNKNOWN_BASE);
		}

		let offset = record.byte_offset(pos);

		self.reader.seek(SeekFrom::Start(offset)).await?;

		let mut base = [0u8; 1];
		self.reader.read_exact(&mut base).await?;

		Ok(base[0])
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use std::io::Cursor;

	#[tokio::test]
	async fn fetches_bases_across_lines()
	{
		let fasta = b">chr1\nACGTA\ncgtac\nGT\n".to_vec();
		let index = Index::build(&fasta).unwrap();
		let mut reader = IndexedReader::new(Cursor::new(fasta), index);

		assert_eq!(reader.fetch_base("chr1", 0).await.unwrap(), b'A');
		assert_eq!(reader.fetch_base("chr1", 4).await.unwrap(), b'A');
		// case is preserved
		assert_eq!(reader.fetch_base("chr1", 5).await.unwrap(), b'c');
		assert_eq!(reader.fetch_base("chr1", 11).await.unwrap(), b'T');
		assert_eq!(reader.fetch_base("chr1", 12).await.unwrap(), UNKNOWN_BASE);
	}

	#[tokio::test]
	async fn unknown_contig_is_an_error()
	{
		let fasta = b">chr1\nACGT\n".to_vec();
		let index = Index::build(&fasta).unwrap();
		let mut reader = IndexedReader::new(Cursor::new(fasta), index);

		assert!(reader.contains("chr1"));
		assert!(matches!(
			reader.fetch_base("chrX", 0).await,
			Err(error::Error::MissingReferenceContig(_))
		));
	}
}
