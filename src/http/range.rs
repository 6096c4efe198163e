//! HTTP Range request parsing module
//!
//! Single `bytes` ranges only. An `end` past the file is clamped, a
//! `start` past the file is not satisfiable.

/// Inclusive byte window, `start <= end < file_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[inline]
    pub const fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this window
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{file_size}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Satisfiable single range
    Valid(ByteRange),
    /// Start past the end, backward range, zero suffix or multi-range
    NotSatisfiable,
    /// No Range header or malformed (ignore, return full content)
    None,
}

/// Parse HTTP Range header against a known file length
///
/// Supported formats:
/// - `bytes=start-end` - Specific range, `end` clamped to the file
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use statikd::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=10-20"), 2345);
/// assert_eq!(result, RangeParseResult::Valid(ByteRange { start: 10, end: 20 }));
///
/// let result = parse_range_header(None, 2345);
/// assert_eq!(result, RangeParseResult::None);
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::None; // Not bytes unit, ignore
    };

    if spec.contains(',') {
        return RangeParseResult::NotSatisfiable;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return parse_suffix_range(end_str, file_size);
    }

    parse_standard_range(start_str, end_str, file_size)
}

/// Digits only; a value too large for `u64` saturates so it still
/// compares as past the end of any file
fn parse_offset(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(u64::MAX))
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, file_size: u64) -> RangeParseResult {
    let Some(suffix) = parse_offset(suffix_str) else {
        return RangeParseResult::None;
    };

    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, file_size: u64) -> RangeParseResult {
    let Some(start) = parse_offset(start_str) else {
        return RangeParseResult::None;
    };

    let end = if end_str.is_empty() {
        None
    } else {
        let Some(end) = parse_offset(end_str) else {
            return RangeParseResult::None;
        };
        Some(end)
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let last = file_size - 1;
    let end = end.map_or(last, |end| end.min(last));
    if start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: u64 = 2345;

    fn valid(start: u64, end: u64) -> RangeParseResult {
        RangeParseResult::Valid(ByteRange { start, end })
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, SIZE), RangeParseResult::None);
    }

    #[test]
    fn test_standard_range() {
        let result = parse_range_header(Some("bytes=10-20"), SIZE);
        assert_eq!(result, valid(10, 20));
        if let RangeParseResult::Valid(range) = result {
            assert_eq!(range.content_length(), 11);
            assert_eq!(range.content_range(SIZE), "bytes 10-20/2345");
        }
    }

    #[test]
    fn test_open_range() {
        assert_eq!(
            parse_range_header(Some("bytes=10-"), SIZE),
            valid(10, SIZE - 1)
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range_header(Some("bytes=-25"), SIZE),
            valid(SIZE - 25, SIZE - 1)
        );
    }

    #[test]
    fn test_suffix_larger_than_file() {
        assert_eq!(parse_range_header(Some("bytes=-5000"), SIZE), valid(0, SIZE - 1));
    }

    #[test]
    fn test_end_is_clamped() {
        let header = format!("bytes={}-{}", SIZE - 25, SIZE * 2);
        assert_eq!(
            parse_range_header(Some(&header), SIZE),
            parse_range_header(Some("bytes=-25"), SIZE)
        );
    }

    #[test]
    fn test_not_satisfiable() {
        let header = format!("bytes={}-", SIZE * 2);
        assert_eq!(
            parse_range_header(Some(&header), SIZE),
            RangeParseResult::NotSatisfiable
        );
        let header = format!("bytes={SIZE}-{}", SIZE + 10);
        assert_eq!(
            parse_range_header(Some(&header), SIZE),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=20-10"), SIZE),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-0"), SIZE),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=0-"), 0),
            RangeParseResult::NotSatisfiable
        );
        for header in ["bytes=99999999999999999999-", "bytes=99999999999999999999-5"] {
            assert_eq!(
                parse_range_header(Some(header), SIZE),
                RangeParseResult::NotSatisfiable,
                "{header}"
            );
        }
    }

    #[test]
    fn test_overflowing_end_and_suffix_saturate() {
        assert_eq!(
            parse_range_header(Some("bytes=10-99999999999999999999"), SIZE),
            valid(10, SIZE - 1)
        );
        assert_eq!(
            parse_range_header(Some("bytes=-99999999999999999999"), SIZE),
            valid(0, SIZE - 1)
        );
    }

    #[test]
    fn test_multi_range_is_rejected() {
        assert_eq!(
            parse_range_header(Some("bytes=0-9,20-29"), SIZE),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_invalid_format() {
        for header in ["bytes=a-b", "bytes=-", "bytes=", "bytes=10", "items=0-9", "bytes=+1-2"] {
            assert_eq!(
                parse_range_header(Some(header), SIZE),
                RangeParseResult::None,
                "{header}"
            );
        }
    }
}
