use crate::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cigar
{
	Match(u32),
	Insertion(u32),
	Deletion(u32),
	RefSkip(u32),
	Softclip(u32),
	Hardclip(u32),
	Padding(u32),
	SeqMatch(u32),
	SeqMismatch(u32),
}

const CIGAR_OPS: [u8; 9] = [b'M', b'I', b'D', b'N', b'S', b'H', b'P', b'=', b'X'];

impl Cigar
{
	pub fn from(opcode: u8, length: u32) -> Option<Self>
	{
		let op = match opcode
		{
			b'M' => Cigar::Match(length),
			b'I' => Cigar::Insertion(length),
			b'D' => Cigar::Deletion(length),
			b'N' => Cigar::RefSkip(length),
			b'S' => Cigar::Softclip(length),
			b'H' => Cigar::Hardclip(length),
			b'P' => Cigar::Padding(length),
			b'=' => Cigar::SeqMatch(length),
			b'X' => Cigar::SeqMismatch(length),
			_ => return None,
		};

		Some(op)
	}

	pub fn len(&self) -> u32
	{
		match *self
		{
			Cigar::Match(length)
			| Cigar::Insertion(length)
			| Cigar::Deletion(length)
			| Cigar::RefSkip(length)
			| Cigar::Softclip(length)
			| Cigar::Hardclip(length)
			| Cigar::Padding(length)
			| Cigar::SeqMatch(length)
			| Cigar::SeqMismatch(length) => length,
		}
	}

	pub fn is_empty(&self) -> bool
	{
		self.len() == 0
	}

	pub fn opcode(&self) -> u8
	{
		match self
		{
			Cigar::Match(_) => b'M',
			Cigar::Insertion(_) => b'I',
			Cigar::Deletion(_) => b'D',
			Cigar::RefSkip(_) => b'N',
			Cigar::Softclip(_) => b'S',
			Cigar::Hardclip(_) => b'H',
			Cigar::Padding(_) => b'P',
			Cigar::SeqMatch(_) => b'=',
			Cigar::SeqMismatch(_) => b'X',
		}
	}

	/// M, =, X: one read base per reference base.
	pub fn is_aligned(&self) -> bool
	{
		matches!(self, Cigar::Match(_) | Cigar::SeqMatch(_) | Cigar::SeqMismatch(_))
	}

	pub fn consumes_reference(&self) -> bool
	{
		matches!(
			self,
			Cigar::Match(_)
				| Cigar::Deletion(_)
				| Cigar::RefSkip(_)
				| Cigar::SeqMatch(_)
				| Cigar::SeqMismatch(_)
		)
	}

	pub fn consumes_query(&self) -> bool
	{
		matches!(
			self,
			Cigar::Match(_)
				| Cigar::Insertion(_)
				| Cigar::Softclip(_)
				| Cigar::SeqMatch(_)
				| Cigar::SeqMismatch(_)
		)
	}
}

/// Number of reference bases spanned by an alignment.
pub fn reference_length(cigar: &[Cigar]) -> u32
{
	cigar
		.iter()
		.filter(|op| op.consumes_reference())
		.map(Cigar::len)
		.sum()
}

pub(crate) fn process_cigar(bytes: &[u8], n_cigar_op: usize) -> error::Result<Vec<Cigar>>
{
	if bytes.len() < n_cigar_op * 4
	{
		return Err(error::Error::BamFormat);
	}

	bytes[..n_cigar_op * 4]
		.chunks_exact(4)
		.map(|chunk| {
			let cigar_enc = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
			let op = *CIGAR_OPS
				.get((cigar_enc & 0xF) as usize)
				.ok_or(error::Error::BamFormat)?;
			Cigar::from(op, cigar_enc >> 4).ok_or(error::Error::BamFormat)
		})
		.collect()
}

/// Parse a textual CIGAR such as `10M2I5M`. `*` is the empty alignment.
pub fn parse_cigar(text: &str) -> Option<Vec<Cigar>>
{
	if text == "*"
	{
		return Some(Vec::new());
	}

	let mut cigar = Vec::new();
	let mut length: u32 = 0;
	let mut has_digits = false;

	for byte in text.bytes()
	{
		if byte.is_ascii_digit()
		{
			length = length.checked_mul(10)?.checked_add((byte - b'0') as u32)?;
			has_digits = true;
			continue;
		}

		if !has_digits
		{
			return None;
		}

		cigar.push(Cigar::from(byte, length)?);
		length = 0;
		has_digits = false;
	}

	if has_digits
	{
		return None;
	}

	Some(cigar)
}
