//! HTTP Range request parsing module
//!
//! Browsers' PDF viewers fetch large documents in byte ranges. Only a single
//! `bytes` range is honored (RFC 7233); anything else gets the full body.

/// Inclusive byte range within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn len(self) -> usize {
        self.end - self.start + 1
    }

    /// `Content-Range` header value
    pub fn content_range(self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// What to send for a request's `Range` header
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable range: send the whole file
    Full,
    /// Send 206 with this slice
    Partial(ByteRange),
    /// Send 416
    Unsatisfiable,
}

/// Parse a `Range` header against a file of `total` bytes
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
/// Malformed headers, other units, multi-range requests and ranges whose
/// last position precedes the first fall back to [`RangeOutcome::Full`].
/// Only a start past the end of the file is unsatisfiable.
pub fn parse_range_header(range_header: Option<&str>, total: usize) -> RangeOutcome {
    let Some(ranges) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if ranges.contains(',') || total == 0 {
        return RangeOutcome::Full;
    }
    let Some((start_str, end_str)) = ranges.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());
    let last = total - 1;

    if start_str.is_empty() {
        // Suffix form: the last N bytes
        return match end_str.parse::<usize>() {
            Ok(0) => RangeOutcome::Unsatisfiable,
            Ok(suffix) => RangeOutcome::Partial(ByteRange {
                start: total.saturating_sub(suffix),
                end: last,
            }),
            Err(_) => RangeOutcome::Full,
        };
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    let end = if end_str.is_empty() {
        last
    } else {
        match end_str.parse::<usize>() {
            Ok(end) => end.min(last),
            Err(_) => return RangeOutcome::Full,
        }
    };

    if start > last {
        RangeOutcome::Unsatisfiable
    } else if start > end {
        RangeOutcome::Full
    } else {
        RangeOutcome::Partial(ByteRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeOutcome::Full);
        assert_eq!(parse_range_header(Some("items=0-5"), 100), RangeOutcome::Full);
    }

    #[test]
    fn test_bounded_and_open_ranges() {
        assert_eq!(
            parse_range_header(Some("bytes=0-9"), 100),
            RangeOutcome::Partial(ByteRange { start: 0, end: 9 })
        );
        let RangeOutcome::Partial(open) = parse_range_header(Some("bytes=50-"), 100) else {
            panic!("expected partial range");
        };
        assert_eq!(open.len(), 50);
        assert_eq!(open.content_range(100), "bytes 50-99/100");
    }

    #[test]
    fn test_end_is_clamped() {
        assert_eq!(
            parse_range_header(Some("bytes=90-500"), 100),
            RangeOutcome::Partial(ByteRange { start: 90, end: 99 })
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range_header(Some("bytes=-20"), 100),
            RangeOutcome::Partial(ByteRange { start: 80, end: 99 })
        );
        assert_eq!(
            parse_range_header(Some("bytes=-500"), 100),
            RangeOutcome::Partial(ByteRange { start: 0, end: 99 })
        );
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeOutcome::Unsatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 100),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn test_reversed_range_is_ignored() {
        assert_eq!(parse_range_header(Some("bytes=30-10"), 100), RangeOutcome::Full);
        assert_eq!(parse_range_header(Some("bytes=5-2"), 100), RangeOutcome::Full);
        assert_eq!(parse_range_header(Some("bytes=5-2"), 3), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn test_ignored_forms() {
        assert_eq!(parse_range_header(Some("bytes=a-b"), 100), RangeOutcome::Full);
        assert_eq!(
            parse_range_header(Some("bytes=0-9,20-29"), 100),
            RangeOutcome::Full
        );
        assert_eq!(parse_range_header(Some("bytes=0-9"), 0), RangeOutcome::Full);
    }
}
