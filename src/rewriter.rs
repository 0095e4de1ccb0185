//! Rewriting file contents in place.
//!
//! Output always goes to a temporary file in the same directory as the
//! original, which is then persisted over the original with one rename. The
//! original is never truncated or partially written.
//!
//! Two modes:
//!
//! - **Line based**: the file is decoded and matched one line at a time, so
//!   memory stays bounded. In first-match mode only one replacement happens
//!   for the whole file. Lines are written back terminated by `\n`.
//! - **Whole document**: the file is decoded into one string so patterns can
//!   span lines.
//!
//! In both modes a file without any match is left untouched.

use crate::config::RunConfig;
use crate::pattern::FindReplace;
use anyhow::{Context, Result, bail};
use encoding_rs::{Decoder, DecoderResult, Encoding, UTF_16BE, UTF_16LE};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const CHUNK_SIZE: usize = 8 * 1024;

/// What happened to a file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rewritten,
    /// No match; the file was not touched.
    Unchanged,
    /// The bytes are not valid in the configured encoding; the file was not touched.
    Undecodable,
}

/// Rewrites `file` according to the content mode in `config`.
pub fn rewrite(file: &Path, config: &RunConfig) -> Result<Outcome> {
    if config.line_based {
        rewrite_lines(file, &config.find_replace, config.encoding)
    } else {
        rewrite_document(file, &config.find_replace, config.encoding)
    }
}

/// Line-based rewrite.
pub fn rewrite_lines(
    file: &Path,
    find_replace: &FindReplace,
    encoding: &'static Encoding,
) -> Result<Outcome> {
    let input = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let mut lines = DecodedLines::new(input, encoding);
    let mut temp = create_temp(file)?;
    let mut matched = false;
    let mut replaced_once = false;

    {
        let mut out = BufWriter::new(temp.as_file_mut());
        loop {
            let line = match lines.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => return Ok(Outcome::Undecodable),
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", file.display()));
                }
            };

            let mut text = Cow::Borrowed(line.as_str());
            if find_replace.is_match(&line) {
                if find_replace.replace_all() {
                    text = find_replace.replace(&line, true);
                    matched = true;
                } else if !replaced_once {
                    text = find_replace.replace(&line, false);
                    replaced_once = true;
                    matched = true;
                }
            }

            write_encoded(&mut out, &text, encoding, file)?;
            write_encoded(&mut out, "\n", encoding, file)?;
        }
        out.flush()
            .with_context(|| format!("Failed to write rewritten {}", file.display()))?;
    }
    drop(lines);

    if !matched {
        return Ok(Outcome::Unchanged);
    }

    swap(temp, file)?;
    Ok(Outcome::Rewritten)
}

/// Whole-document rewrite.
pub fn rewrite_document(
    file: &Path,
    find_replace: &FindReplace,
    encoding: &'static Encoding,
) -> Result<Outcome> {
    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(&bytes) else {
        return Ok(Outcome::Undecodable);
    };
    if !find_replace.is_match(&text) {
        return Ok(Outcome::Unchanged);
    }

    let replaced = find_replace.apply(&text);
    let mut temp = create_temp(file)?;
    write_encoded(temp.as_file_mut(), &replaced, encoding, file)?;

    swap(temp, file)?;
    Ok(Outcome::Rewritten)
}

/// Number of replacements a rewrite would make, or `None` if the file cannot
/// be decoded. Reads without writing.
pub fn planned_replacements(file: &Path, config: &RunConfig) -> Result<Option<usize>> {
    let find_replace = &config.find_replace;
    let total = if config.line_based {
        let input = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
        let mut lines = DecodedLines::new(input, config.encoding);
        let mut total = 0;
        loop {
            match lines.next_line() {
                Ok(Some(line)) => total += find_replace.count_matches(&line),
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => return Ok(None),
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", file.display()));
                }
            }
        }
        total
    } else {
        let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        match config
            .encoding
            .decode_without_bom_handling_and_without_replacement(&bytes)
        {
            Some(text) => find_replace.count_matches(&text),
            None => return Ok(None),
        }
    };

    if find_replace.replace_all() {
        Ok(Some(total))
    } else {
        Ok(Some(total.min(1)))
    }
}

fn create_temp(original: &Path) -> Result<NamedTempFile> {
    let parent = match original.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".far")
        .suffix(".tmp")
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))
}

/// Moves the finished temp file over `original`, keeping its permissions.
fn swap(temp: NamedTempFile, original: &Path) -> Result<()> {
    let permissions = fs::metadata(original)
        .with_context(|| format!("Failed to stat {}", original.display()))?
        .permissions();
    fs::set_permissions(temp.path(), permissions)
        .with_context(|| format!("Failed to set permissions on {}", temp.path().display()))?;
    temp.persist(original)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {} with rewritten contents", original.display()))?;
    Ok(())
}

fn write_encoded<W: Write>(
    out: &mut W,
    text: &str,
    encoding: &'static Encoding,
    file: &Path,
) -> Result<()> {
    // `Encoding::encode` substitutes UTF-8 for the UTF-16 family.
    let bytes: Cow<'_, [u8]> = if encoding == UTF_16LE {
        Cow::Owned(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
    } else if encoding == UTF_16BE {
        Cow::Owned(text.encode_utf16().flat_map(u16::to_be_bytes).collect())
    } else {
        let (bytes, used, unmappable) = encoding.encode(text);
        if unmappable {
            bail!(
                "Rewritten contents of {} cannot be represented in {}",
                file.display(),
                used.name()
            );
        }
        bytes
    };
    out.write_all(&bytes)
        .with_context(|| format!("Failed to write rewritten {}", file.display()))
}

/// Incrementally decodes a byte stream and splits it into lines.
///
/// Accepts `\n`, `\r\n` and a lone `\r` as terminators; terminators are not
/// part of the returned line. Malformed input yields an
/// [`io::ErrorKind::InvalidData`] error.
pub struct DecodedLines<R> {
    reader: R,
    decoder: Decoder,
    chunk: Vec<u8>,
    pending: String,
    /// Prefix of `pending` already known to hold no terminator.
    scanned: usize,
    eof: bool,
}

impl<R: Read> DecodedLines<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            decoder: encoding.new_decoder_without_bom_handling(),
            chunk: vec![0; CHUNK_SIZE],
            pending: String::new(),
            scanned: 0,
            eof: false,
        }
    }

    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(found) = self.pending[self.scanned..].find(['\n', '\r']) {
                let idx = self.scanned + found;
                let bytes = self.pending.as_bytes();
                let is_cr = bytes[idx] == b'\r';
                // A trailing `\r` may be the first half of `\r\n`.
                if is_cr && idx + 1 == bytes.len() && !self.eof {
                    self.scanned = idx;
                    self.fill()?;
                    continue;
                }
                let width = if is_cr && bytes.get(idx + 1) == Some(&b'\n') {
                    2
                } else {
                    1
                };
                let line = self.pending[..idx].to_string();
                self.pending.drain(..idx + width);
                self.scanned = 0;
                return Ok(Some(line));
            }

            if self.eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                self.scanned = 0;
                return Ok(Some(std::mem::take(&mut self.pending)));
            }

            self.scanned = self.pending.len();
            self.fill()?;
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let read = loop {
            match self.reader.read(&mut self.chunk) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other?,
            }
        };
        let last = read == 0;
        let mut src = &self.chunk[..read];

        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length_without_replacement(src.len())
                .unwrap_or(src.len() * 4 + 16);
            self.pending.reserve(needed);
            let (result, consumed) =
                self.decoder
                    .decode_to_string_without_replacement(src, &mut self.pending, last);
            src = &src[consumed..];
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(_, _) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("input is not valid {}", self.decoder.encoding().name()),
                    ));
                }
            }
        }

        self.eof = last;
        Ok(())
    }
}

impl<R: Read> Iterator for DecodedLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
