use std::path::{Path, PathBuf};
use std::ops::Range;

use tokio::fs::File as TokioFile;

use futures::stream::{self, Stream};

use log::{debug, info};

use crate::bai;
use crate::bam::{self, AlignedRecord, Flags, Header};
use crate::bgzf;
use crate::error;
use crate::region::ResolvedRegion;
use crate::AsyncReadSeek;

/// A coordinate-ordered supply of alignment records.
#[allow(async_fn_in_trait)]
pub trait RecordSource
{
	async fn next_record(&mut self) -> error::Result<Option<AlignedRecord>>;
}

impl RecordSource for std::vec::IntoIter<AlignedRecord>
{
	async fn next_record(&mut self) -> error::Result<Option<AlignedRecord>>
	{
		Ok(self.next())
	}
}

pub struct IndexedReader<R>
where
	R: AsyncReadSeek + std::marker::Send + std::marker::Unpin,
{
	reader: bgzf::Reader<R>,
	header: Header,
	index: bai::Index,
}

impl IndexedReader<TokioFile>
{
	pub async fn from_path<P>(path: P) -> error::Result<Self>
	where
		P: AsRef<Path>,
	{
		let path = path.as_ref();

		let file = TokioFile::open(path)
			.await
			.map_err(|_| error::Error::IOError(path.to_string_lossy().to_string()))?;

		let bai_file = index_candidates(path)
			.into_iter()
			.find(|candidate| candidate.exists())
			.ok_or_else(|| error::Error::NoIndex(path.to_string_lossy().to_string()))?;

		debug!("Setting up for indexed reading with {:?}", bai_file);

		let index = bai::Index::from_path(&bai_file).await?;

		Self::with_index(file, index).await
	}
}

impl<R> IndexedReader<R>
where
	R: AsyncReadSeek + std::marker::Send + std::marker::Unpin,
{
	pub async fn from_reader<I>(reader: R, bai_reader: I) -> error::Result<Self>
	where
		I: tokio::io::AsyncRead + std::marker::Send + std::marker::Unpin,
	{
		let index = bai::Index::from_reader(bai_reader).await?;
		Self::with_index(reader, index).await
	}

	async fn with_index(reader: R, index: bai::Index) -> error::Result<Self>
	{
		let mut reader = bgzf::Reader::new(reader);
		let header = bam::read_bam_header(&mut reader).await?;

		info!(
			"BAM with {} references, index covers {}",
			header.references.len(),
			index.ref_indices.len()
		);

		Ok(IndexedReader {
			reader,
			header,
			index,
		})
	}

	pub fn header(&self) -> &Header
	{
		&self.header
	}

	/// Records overlapping `region`, excluding reads flagged in [`Flags::FILTER`].
	pub fn query(&mut self, region: &ResolvedRegion) -> Query<'_, R>
	{
		let chunks = self
			.index
			.query(region.tid, region.begin as u64, region.end as u64);

		debug!(
			"{} chunks for {}:{}-{}",
			chunks.len(),
			region.contig,
			region.begin,
			region.end
		);

		Query {
			reader: &mut self.reader,
			chunks,
			chunk_index: 0,
			in_chunk: false,
			tid: region.tid as i32,
			begin: region.begin as i64,
			end: region.end as i64,
			filter: Flags::FILTER,
			buf: Vec::new(),
		}
	}
}

pub struct Query<'r, R>
{
	reader: &'r mut bgzf::Reader<R>,
	chunks: Vec<Range<u64>>,
	chunk_index: usize,
	in_chunk: bool,
	tid: i32,
	begin: i64,
	end: i64,
	filter: Flags,
	buf: Vec<u8>,
}

impl<'r, R> Query<'r, R>
where
	R: AsyncReadSeek + std::marker::Send + std::marker::Unpin,
{
	async fn read_next(&mut self) -> error::Result<Option<AlignedRecord>>
	{
		while self.chunk_index < self.chunks.len()
		{
			let chunk = self.chunks[self.chunk_index].clone();

			if !self.in_chunk
			{
				self.reader.seek(chunk.start).await?;
				self.in_chunk = true;
			}

			if self.reader.virtual_position() >= chunk.end
			{
				self.chunk_index += 1;
				self.in_chunk = false;
				continue;
			}

			let mut block_size = [0u8; 4];
			if !self.reader.read_exact(&mut block_size).await?
			{
				debug!("BAM EOF!");
				self.chunk_index = self.chunks.len();
				break;
			}

			let block_size = u32::from_le_bytes(block_size) as usize;
			self.buf.resize(block_size, 0);
			if !self.reader.read_exact(&mut self.buf).await?
			{
				return Err(error::Error::BamFormat);
			}

			let record = bam::decode_record(&self.buf)?;

			if record.ref_id != self.tid
			{
				continue;
			}

			if record.pos as i64 >= self.end
			{
				// coordinate sorted, nothing later can overlap
				self.chunk_index = self.chunks.len();
				break;
			}

			if record.flags.intersects(self.filter) || record.end() <= self.begin
			{
				continue;
			}

			if bam::reference_length(&record.cigar) == 0
			{
				debug!("skipping {} without aligned bases", record.read_name_as_str());
				continue;
			}

			return Ok(Some(record));
		}

		Ok(None)
	}

	/// Adapt the query into a [`Stream`] of records.
	pub fn into_stream(self) -> impl Stream<Item = error::Result<AlignedRecord>> + 'r
	where
		R: 'r,
	{
		stream::try_unfold(self, |mut query| async move {
			let record = query.read_next().await?;
			Ok::<_, error::Error>(record.map(|record| (record, query)))
		})
	}
}

impl<'r, R> RecordSource for Query<'r, R>
where
	R: AsyncReadSeek + std::marker::Send + std::marker::Unpin,
{
	async fn next_record(&mut self) -> error::Result<Option<AlignedRecord>>
	{
		self.read_next().await
	}
}

/// `reads.bam.bai`, then `reads.bai`.
fn index_candidates(path: &Path) -> Vec<PathBuf>
{
	let mut with_suffix = path.as_os_str().to_owned();
	with_suffix.push(".bai");

	let mut candidates = vec![PathBuf::from(with_suffix)];

	if path.extension().is_some_and(|extension| extension == "bam")
	{
		candidates.push(path.with_extension("bai"));
	}

	candidates
}
