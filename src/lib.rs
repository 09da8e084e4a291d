//! Per-position genotype evidence from an indexed BAM.
//!
//! Reads overlapping a region are swept position by position by the
//! [`pileup::Pileup`] engine, each column is reduced to strand-resolved base
//! and indel counts by [`tally::aggregate`], and rows are written by
//! [`report::Writer`]. [`pipeline::run`] wires the pieces together.

mod bai;
pub mod bam;
pub mod bgzf;
pub mod error;
pub mod fasta;
pub mod pileup;
pub mod pipeline;
pub mod region;
pub mod report;
pub mod tally;

pub trait AsyncReadSeek: tokio::io::AsyncRead + tokio::io::AsyncSeek {}
impl<T: tokio::io::AsyncRead + tokio::io::AsyncSeek + ?Sized> AsyncReadSeek for T {}
