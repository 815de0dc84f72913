//! HTTP Range request parsing module
//!
//! Single `bytes=<start>-[<end>]` ranges only, checked against the file
//! size before anything is opened for streaming.

/// Inclusive byte window inside a file
///
/// Only obtainable through [`ByteRange::new`] or [`parse_range_header`],
/// so `start <= end < file_size` always holds for the size it was checked
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

/// Range header rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Header does not follow the accepted grammar - 400
    Malformed,
    /// Well-formed but outside the file - 416
    NotSatisfiable { size: u64 },
}

impl ByteRange {
    /// Validate an inclusive window against `file_size`
    pub const fn new(start: u64, end: u64, file_size: u64) -> Result<Self, RangeError> {
        if file_size == 0 || start >= file_size || end >= file_size || start > end {
            return Err(RangeError::NotSatisfiable { size: file_size });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> u64 {
        self.start
    }

    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes in the window (never zero)
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a 206 response
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{total_size}", self.start, self.end)
    }
}

/// Parse an HTTP `Range` header value against a file of `file_size` bytes
///
/// Returns `Ok(None)` when there is no header (serve the full file).
///
/// # Examples
/// ```
/// use media_range_server::http::range::{parse_range_header, RangeError};
///
/// let range = parse_range_header(Some("bytes=0-99"), 1000).unwrap().unwrap();
/// assert_eq!(range.len(), 100);
///
/// assert_eq!(parse_range_header(None, 1000), Ok(None));
/// assert_eq!(
///     parse_range_header(Some("bytes=0-9,20-29"), 1000),
///     Err(RangeError::Malformed)
/// );
/// ```
pub fn parse_range_header(
    range_header: Option<&str>,
    file_size: u64,
) -> Result<Option<ByteRange>, RangeError> {
    let Some(header) = range_header else {
        return Ok(None);
    };

    let range_set = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Malformed)?;

    // Multi-range is rejected outright rather than truncated to the first
    let (start_str, end_str) = range_set.split_once('-').ok_or(RangeError::Malformed)?;

    let start = parse_digits(start_str)?;
    let end = if end_str.is_empty() {
        None
    } else {
        Some(parse_digits(end_str)?)
    };

    if file_size == 0 {
        return Err(RangeError::NotSatisfiable { size: 0 });
    }

    let end = end.unwrap_or(file_size - 1);
    ByteRange::new(start, end, file_size).map(Some)
}

/// Strict ASCII digits; no sign, whitespace, or separators
fn parse_digits(s: &str) -> Result<u64, RangeError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    s.parse::<u64>().map_err(|_| RangeError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(header: &str, size: u64) -> ByteRange {
        match parse_range_header(Some(header), size) {
            Ok(Some(r)) => r,
            other => panic!("Expected valid range for {header:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), Ok(None));
        assert_eq!(parse_range_header(None, 0), Ok(None));
    }

    #[test]
    fn test_standard_range() {
        let r = valid("bytes=0-9", 100);
        assert_eq!((r.start(), r.end(), r.len()), (0, 9, 10));
        assert_eq!(r.content_range(100), "bytes 0-9/100");
    }

    #[test]
    fn test_single_byte_ranges() {
        let first = valid("bytes=0-0", 44);
        assert_eq!(first.len(), 1);
        let last = valid("bytes=43-43", 44);
        assert_eq!(last.content_range(44), "bytes 43-43/44");
    }

    #[test]
    fn test_open_range() {
        let r = valid("bytes=5-", 44);
        assert_eq!((r.start(), r.end()), (5, 43));
        assert_eq!(r.len(), 39);
        assert_eq!(r.content_range(44), "bytes 5-43/44");
    }

    #[test]
    fn test_not_satisfiable() {
        for header in ["bytes=200-", "bytes=100-100", "bytes=1000-2000", "bytes=0-100", "bytes=10-5"] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                Err(RangeError::NotSatisfiable { size: 100 }),
                "header {header}"
            );
        }
    }

    #[test]
    fn test_empty_file_never_satisfiable() {
        for header in ["bytes=0-", "bytes=0-0", "bytes=5-10"] {
            assert_eq!(
                parse_range_header(Some(header), 0),
                Err(RangeError::NotSatisfiable { size: 0 })
            );
        }
        // Syntax is still checked first
        assert_eq!(
            parse_range_header(Some("bytes=x-"), 0),
            Err(RangeError::Malformed)
        );
    }

    #[test]
    fn test_invalid_format() {
        for header in [
            "bytes=invalid",
            "bytes=a-b",
            "bytes=0-b",
            "bytes=-20",
            "bytes=-",
            "bytes=",
            "bytes=5",
            "bytes=+1-5",
            "bytes= 1-5",
            "bytes=1-5-7",
            "items=0-9",
            "0-9",
            "bytes=99999999999999999999-",
        ] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                Err(RangeError::Malformed),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_multi_range_rejected() {
        assert_eq!(
            parse_range_header(Some("bytes=0-9,20-29"), 100),
            Err(RangeError::Malformed)
        );
        assert_eq!(
            parse_range_header(Some("bytes=0-,5-"), 100),
            Err(RangeError::Malformed)
        );
    }

    #[test]
    fn test_byte_range_constructor() {
        assert!(ByteRange::new(0, 0, 1).is_ok());
        assert!(ByteRange::new(0, 1, 1).is_err());
        assert!(ByteRange::new(2, 1, 10).is_err());
        assert!(ByteRange::new(0, 0, 0).is_err());
        assert_eq!(ByteRange::new(0, u64::MAX - 1, u64::MAX).unwrap().len(), u64::MAX);
    }
}
