//! Locates the sample data inside a RIFF/WAVE stream.
//!
//! The scanner does not walk the chunk list. After validating the fixed header
//! it reads 4-byte aligned tag words until it meets `data`, which tolerates
//! files whose chunk sizes are wrong or whose extra chunks are unknown.

use std::io::{self, BufReader, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::header::{WaveHeader, HEADER_LEN};

/// Maximum number of bytes scanned for the `data` tag.
pub const SCAN_BUDGET: u64 = 1_000_000;

/// First tag word after the `RIFF`, size and `WAVE` preamble.
const SCAN_ORIGIN: u64 = 12;
const DATA_ID: [u8; 4] = *b"data";
const SCAN_BUFFER_CAPACITY: usize = 1024 * 16;

/// Where the sample data of a stream lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiffLayout {
    /// No usable container: samples start at byte 0.
    Headerless,
    /// A RIFF/WAVE container whose samples start at `data_start`. A start of 0
    /// means the `data` chunk could not be located.
    Container { header: WaveHeader, data_start: u64 },
}

impl RiffLayout {
    /// Byte offset of the first sample.
    pub fn data_start(&self) -> u64 {
        match self {
            RiffLayout::Headerless => 0,
            RiffLayout::Container { data_start, .. } => *data_start,
        }
    }

    pub fn header(&self) -> Option<&WaveHeader> {
        match self {
            RiffLayout::Headerless => None,
            RiffLayout::Container { header, .. } => Some(header),
        }
    }
}

/// Scans a seekable stream for its RIFF header and `data` chunk.
pub struct RiffScanner<'a, R: Read + Seek> {
    reader: &'a mut R,
    file_len: u64,
    budget: u64,
}

impl<'a, R: Read + Seek> RiffScanner<'a, R> {
    /// Creates a scanner over `reader`, measuring its length.
    pub fn new(reader: &'a mut R) -> Result<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.rewind()?;
        Ok(Self {
            reader,
            file_len,
            budget: SCAN_BUDGET,
        })
    }

    /// Overrides the number of bytes scanned for the `data` tag.
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }

    /// Total length of the stream in bytes.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Detects the container and the data start offset.
    ///
    /// Streams without the RIFF/WAVE/fmt signatures are reported as
    /// [`RiffLayout::Headerless`]. A container without a `data` tag inside the
    /// budget, or whose data would start past the end of the file, keeps its
    /// header but gets a data start of 0. The reader is left at byte 0.
    ///
    /// # Errors
    /// Only I/O errors are returned.
    pub fn scan(self) -> Result<RiffLayout> {
        let Self {
            reader,
            file_len,
            budget,
        } = self;

        let Some(header) = Self::read_header(reader)? else {
            debug!("No RIFF/WAVE signature, treating input as raw samples");
            reader.rewind()?;
            return Ok(RiffLayout::Headerless);
        };

        let layout = match Self::find_data_start(reader, budget) {
            Ok(data_start) if data_start > file_len => {
                warn!(
                    data_start,
                    file_len,
                    "'data' chunk starts past the end of the file, reading samples from byte 0"
                );
                RiffLayout::Container {
                    header,
                    data_start: 0,
                }
            }
            Ok(data_start) => {
                debug!(data_start, "Found 'data' chunk");
                RiffLayout::Container { header, data_start }
            }
            Err(Error::ScanExhausted(scanned)) => {
                warn!(scanned, "No 'data' chunk found, reading samples from byte 0");
                RiffLayout::Container {
                    header,
                    data_start: 0,
                }
            }
            Err(e) => return Err(e),
        };

        reader.rewind()?;
        Ok(layout)
    }

    /// Reads the fixed header, returning `None` if the stream is too short or
    /// does not carry the three signatures.
    fn read_header(reader: &mut R) -> Result<Option<WaveHeader>> {
        let mut bytes = [0u8; HEADER_LEN];
        match reader.read_exact(&mut bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        match WaveHeader::parse(&bytes) {
            Ok(header) => Ok(Some(header)),
            Err(Error::ContainerDecode(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Walks 4-byte tag words from [`SCAN_ORIGIN`] and returns the offset just
    /// past the size field of the first `data` tag.
    fn find_data_start(reader: &mut R, budget: u64) -> Result<u64> {
        reader.seek(SeekFrom::Start(SCAN_ORIGIN))?;
        let mut buf_reader = BufReader::with_capacity(SCAN_BUFFER_CAPACITY, reader);
        let mut cursor = SCAN_ORIGIN;
        let mut scanned = 0u64;

        while scanned <= budget {
            let mut tag = [0u8; 4];
            match buf_reader.read_exact(&mut tag) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            cursor += 4;

            if tag == DATA_ID {
                // Skip the chunk size field.
                return Ok(cursor + 4);
            }
            scanned += 4;
        }

        Err(Error::ScanExhausted(scanned))
    }
}
