use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error
{
	#[error("Unable to open file {0}")]
	IOError(String),
	#[error("Not in BAM format")]
	BamFormat,
	#[error("Not in BAI format")]
	BaiFormat,
	#[error("Unable to decompress BGZ block")]
	BGZDecompress,
	#[error("Invalid BGZ header: {0:?}")]
	BGZInvalidHeader([u8; 18]),
	#[error("Truncated BGZ stream")]
	BGZTruncated,
	#[error("No BAI index found for {0}")]
	NoIndex(String),
	#[error("Unable to seek to {0} in BAM")]
	BamSeek(u64),
	#[error("Invalid region: {0}\nValid region format: chr:beg-end\nBoth beg and end coordinates are 1-based")]
	InvalidRegion(String),
	#[error("Contig '{0}' is not present in the BAM header")]
	UnknownContig(String),
	#[error("Region start {begin} lies beyond the end of '{contig}' (length {length})")]
	RegionOutOfBounds
	{
		contig: String,
		begin: u64,
		length: u32,
	},
	#[error("Invalid FASTA index: {0}")]
	FaiFormat(String),
	#[error("Contig '{0}' is not present in the reference")]
	MissingReferenceContig(String),
	#[error("Alignments are not coordinate sorted: {tid}:{pos} after {prev_tid}:{prev_pos}")]
	UnsortedInput
	{
		tid: i32,
		pos: i32,
		prev_tid: i32,
		prev_pos: i32,
	},
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
