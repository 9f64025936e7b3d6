//! MP4 container inspection
//!
//! Extracts the playable duration of an MP4-family file from its movie
//! header (`mvhd`) atom. This is not a full ISO BMFF parser: the buffer is
//! scanned for the first `mvhd` tag and the timing fields are read at a
//! fixed distance from it. Fragmented or edited files carrying several
//! movie headers are not treated specially.

use crate::error::{Error, Result};

/// Four-character atom tag
pub type FourCc = [u8; 4];

const FOURCC_LEN: usize = 4;

/// Movie header atom tag
pub const MVHD: FourCc = *b"mvhd";

/// Distance from the start of the `mvhd` tag to the time-scale field
pub const MVHD_TIMESCALE_OFFSET: usize = 17;

/// An atom located inside a byte buffer
#[derive(Debug, Clone, Copy)]
pub struct Atom<'a> {
    /// Four-character tag
    pub tag: FourCc,
    /// Position of the tag within the scanned buffer
    pub tag_offset: usize,
    buffer: &'a [u8],
}

impl<'a> Atom<'a> {
    /// Read a big-endian `u32` located `offset` bytes after the tag start
    ///
    /// Offsets inside the tag itself yield `None`.
    pub fn read_u32_be(&self, offset: usize) -> Option<u32> {
        let start = offset.checked_sub(FOURCC_LEN)?;
        let bytes = self.payload().get(start..start.checked_add(4)?)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Declared atom length from the big-endian size field preceding the tag
    ///
    /// `None` when the tag sits at the very start of the buffer.
    pub fn declared_len(&self) -> Option<u32> {
        let start = self.tag_offset.checked_sub(4)?;
        let bytes = self.buffer.get(start..self.tag_offset)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Bytes following the tag up to the end of the buffer
    pub fn payload(&self) -> &'a [u8] {
        &self.buffer[self.tag_offset + FOURCC_LEN..]
    }
}

/// Minimal tag locator over an in-memory buffer
#[derive(Debug, Clone, Copy)]
pub struct AtomReader<'a> {
    buffer: &'a [u8],
}

impl<'a> AtomReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// First occurrence of `tag` anywhere in the buffer
    pub fn find(&self, tag: FourCc) -> Option<Atom<'a>> {
        self.buffer
            .windows(tag.len())
            .position(|window| window == tag)
            .map(|tag_offset| Atom {
                tag,
                tag_offset,
                buffer: self.buffer,
            })
    }
}

/// Raw timing fields of a movie header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieHeader {
    pub timescale: u32,
    pub duration: u32,
}

impl MovieHeader {
    /// Parse the timing fields of the first `mvhd` atom in `buffer`
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let atom = AtomReader::new(buffer)
            .find(MVHD)
            .ok_or_else(|| Error::UnsupportedMediaFormat("movie header (mvhd) not found".into()))?;

        tracing::trace!(
            tag_offset = atom.tag_offset,
            declared_len = ?atom.declared_len(),
            "Found movie header atom"
        );

        let timescale = atom.read_u32_be(MVHD_TIMESCALE_OFFSET);
        let duration = atom.read_u32_be(MVHD_TIMESCALE_OFFSET + 4);

        match (timescale, duration) {
            (Some(0), Some(_)) => Err(Error::UnsupportedMediaFormat(
                "movie header has a zero time scale".into(),
            )),
            (Some(timescale), Some(duration)) => Ok(Self {
                timescale,
                duration,
            }),
            _ => Err(Error::UnsupportedMediaFormat(
                "movie header is truncated".into(),
            )),
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration as f64 / self.timescale as f64 * 1000.0
    }
}

/// Duration of the video in `buffer`, in milliseconds
pub fn video_duration_ms(buffer: &[u8]) -> Result<f64> {
    let header = MovieHeader::parse(buffer)?;
    let duration_ms = header.duration_ms();
    tracing::debug!(
        timescale = header.timescale,
        duration = header.duration,
        duration_ms,
        "Parsed movie header"
    );
    Ok(duration_ms)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Buffer with some leading noise and an `mvhd` tag carrying the given fields
    pub(crate) fn mp4_with_duration(timescale: u32, duration: u32) -> Vec<u8> {
        let mut buf = vec![0u8, 0, 0, 0x20];
        buf.extend_from_slice(b"ftypisom");
        buf.extend_from_slice(&[0u8; 12]);
        buf.extend_from_slice(b"moov");
        let tag_start = buf.len();
        buf.extend_from_slice(b"mvhd");
        buf.resize(tag_start + MVHD_TIMESCALE_OFFSET, 0);
        buf.extend_from_slice(&timescale.to_be_bytes());
        buf.extend_from_slice(&duration.to_be_bytes());
        buf.extend_from_slice(&[0u8; 16]);
        buf
    }

    #[test]
    fn test_duration_exact() {
        let buf = mp4_with_duration(1000, 5000);
        assert_eq!(video_duration_ms(&buf).unwrap(), 5000.0);

        let buf = mp4_with_duration(600, 3000);
        assert_eq!(video_duration_ms(&buf).unwrap(), 3000.0 / 600.0 * 1000.0);
    }

    #[test]
    fn test_fractional_duration() {
        let buf = mp4_with_duration(90000, 1_234_567);
        let ms = video_duration_ms(&buf).unwrap();
        assert_eq!(ms, 1_234_567f64 / 90000f64 * 1000.0);
        assert!(ms > 13717.0 && ms < 13718.0);
    }

    #[test]
    fn test_declared_len() {
        let mut buf = 0x6cu32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"mvhd");
        let atom = AtomReader::new(&buf).find(MVHD).unwrap();
        assert_eq!(atom.declared_len(), Some(0x6c));

        let bare = AtomReader::new(b"mvhd").find(MVHD).unwrap();
        assert_eq!(bare.declared_len(), None);
    }

    #[test]
    fn test_missing_mvhd() {
        let buf = b"ftypisom\0\0\0\0moovtrak".to_vec();
        let err = video_duration_ms(&buf).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaFormat(_)));
    }

    #[test]
    fn test_empty_buffer() {
        assert!(matches!(
            video_duration_ms(&[]),
            Err(Error::UnsupportedMediaFormat(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let mut buf = b"mvhd".to_vec();
        buf.resize(MVHD_TIMESCALE_OFFSET + 6, 1);
        assert!(matches!(
            video_duration_ms(&buf),
            Err(Error::UnsupportedMediaFormat(_))
        ));
    }

    #[test]
    fn test_zero_timescale() {
        let buf = mp4_with_duration(0, 5000);
        assert!(matches!(
            video_duration_ms(&buf),
            Err(Error::UnsupportedMediaFormat(_))
        ));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut buf = mp4_with_duration(1000, 2000);
        buf.extend(mp4_with_duration(1000, 9000));
        assert_eq!(video_duration_ms(&buf).unwrap(), 2000.0);
    }

    #[test]
    fn test_atom_reader() {
        let buf = b"xxmvhdyy";
        let atom = AtomReader::new(buf).find(MVHD).unwrap();
        assert_eq!(atom.tag_offset, 2);
        assert_eq!(atom.payload(), b"yy");
        assert_eq!(atom.read_u32_be(4), None);
        // Inside the tag
        assert_eq!(atom.read_u32_be(0), None);

        let mut buf = b"mvhd".to_vec();
        buf.extend_from_slice(&7u32.to_be_bytes());
        let atom = AtomReader::new(&buf).find(MVHD).unwrap();
        assert_eq!(atom.read_u32_be(4), Some(7));
        assert!(AtomReader::new(&buf).find(*b"moov").is_none());
    }
}
