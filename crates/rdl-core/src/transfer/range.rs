//! Parsing of `Content-Range` and `Content-Length` response headers

use reqwest::header::{HeaderMap, CONTENT_LENGTH};

/// A satisfied byte range: `bytes <start>-<end>/<complete_length>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContentRange {
    pub start: u64,
    pub end: u64,
    /// `None` when the server sent `*`
    pub complete_length: Option<u64>,
}

impl ContentRange {
    /// Number of bytes in the range (inclusive end)
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parse a `Content-Range` value.
///
/// Returns a description of the problem for the unsatisfied form
/// (`bytes */N`) and for anything malformed.
pub(crate) fn parse_content_range(value: &str) -> Result<ContentRange, String> {
    let (unit, rest) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| format!("malformed Content-Range {:?}", value))?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return Err(format!("unsupported range unit {:?}", unit));
    }

    let (span, complete) = rest
        .trim()
        .split_once('/')
        .ok_or_else(|| format!("malformed Content-Range {:?}", value))?;
    if span == "*" {
        return Err(format!("unsatisfied Content-Range {:?}", value));
    }

    let (start, end) = span
        .split_once('-')
        .ok_or_else(|| format!("malformed Content-Range {:?}", value))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u64>()
            .map_err(|_| format!("malformed Content-Range {:?}", value))
    };
    let start = parse(start)?;
    let end = parse(end)?;
    if end < start {
        return Err(format!("inverted Content-Range {:?}", value));
    }

    let complete_length = match complete.trim() {
        "*" => None,
        n => Some(parse(n)?),
    };

    Ok(ContentRange {
        start,
        end,
        complete_length,
    })
}

/// Value of `Content-Length`, or an error string when it is present but unusable
pub(crate) fn content_length(headers: &HeaderMap) -> Result<Option<u64>, String> {
    match headers.get(CONTENT_LENGTH) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Some)
            .ok_or_else(|| format!("malformed Content-Length {:?}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_satisfied_range() {
        let range = parse_content_range("bytes 277768-277787/277788").unwrap();
        assert_eq!(range.start, 277768);
        assert_eq!(range.end, 277787);
        assert_eq!(range.complete_length, Some(277788));
        assert_eq!(range.len(), 20);
    }

    #[test]
    fn test_unknown_complete_length() {
        let range = parse_content_range("bytes 0-9/*").unwrap();
        assert_eq!(range.len(), 10);
        assert_eq!(range.complete_length, None);
    }

    #[test]
    fn test_single_byte_range() {
        assert_eq!(parse_content_range("bytes 5-5/6").unwrap().len(), 1);
    }

    #[test]
    fn test_rejected_forms() {
        for value in [
            "",
            "bytes",
            "bytes */277788",
            "items 0-9/10",
            "bytes 0-9",
            "bytes a-9/10",
            "bytes 0-b/10",
            "bytes 9-0/10",
            "bytes 0-9/ten",
            "bytes 10/20",
        ] {
            assert!(parse_content_range(value).is_err(), "accepted {:?}", value);
        }
    }

    #[test]
    fn test_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), Ok(None));

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1024"));
        assert_eq!(content_length(&headers), Ok(Some(1024)));

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert!(content_length(&headers).is_err());
    }
}
