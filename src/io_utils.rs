//! Encoding resolution and CSV reader/writer construction.
//!
//! Input decoding goes through `encoding_rs` (UTF-8 by default, BOM removed).
//! Output is always UTF-8; exports can opt into a leading BOM for spreadsheet
//! tools and into gzip compression.

use std::{
    borrow::Cow,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use flate2::{Compression, write::GzEncoder};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

/// Decodes `bytes`, dropping a byte-order mark that matches `encoding`.
///
/// Returns `None` when any sequence is malformed for the encoding.
pub fn decode_bytes<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors { None } else { Some(text) }
}

pub fn open_csv_reader<R>(reader: R) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(b',')
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn csv_writer<W>(writer: W) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

/// Plain or gzip-compressed output. [`OutputSink::finish`] must be called so
/// the gzip trailer is written and its errors surface.
pub enum OutputSink<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> OutputSink<W> {
    pub fn new(inner: W, gzip: bool) -> Self {
        if gzip {
            OutputSink::Gzip(GzEncoder::new(inner, Compression::default()))
        } else {
            OutputSink::Plain(inner)
        }
    }

    pub fn finish(self) -> io::Result<W> {
        match self {
            OutputSink::Plain(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
            OutputSink::Gzip(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for OutputSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Plain(inner) => inner.write(buf),
            OutputSink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Plain(inner) => inner.flush(),
            OutputSink::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Appends `.gz` to the file name when compression is enabled.
pub fn compressed_path(path: &Path, gzip: bool) -> PathBuf {
    if !gzip {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}
