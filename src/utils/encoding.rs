//! Bounded file reading with encoding detection.
//!
//! Reads never pull more than the requested number of bytes, so a single
//! huge file cannot stall a worker. Decoding strategy:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - strict UTF-8 fast path, tolerating a code point cut by the byte cap
//! - fallback detection with chardetng, decoding with replacement

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Detect if a file is binary (not text).
///
/// Uses two heuristics:
/// 1. Null byte check (strong binary indicator)
/// 2. Ratio of printable ASCII bytes (< 70% = likely binary)
///
/// Unreadable files count as binary.
pub fn is_binary_file(path: &Path, sample_size: usize) -> bool {
    match read_prefix(path, sample_size) {
        Ok(sample) => is_binary_sample(&sample),
        Err(_) => true,
    }
}

fn is_binary_sample(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    if sample.starts_with(&[0xff, 0xfe]) || sample.starts_with(&[0xfe, 0xff]) {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }

    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == 9 || b == 10 || b == 13 || b >= 0x80)
        .count();

    (printable as f64 / sample.len() as f64) < 0.70
}

/// Read at most `max_bytes` bytes of a file.
pub fn read_prefix(path: &Path, max_bytes: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(max_bytes.min(64 * 1024));
    file.take(max_bytes as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read a file as text, decoding at most `max_bytes` bytes when given.
///
/// Returns the decoded text and whether the byte cap cut the file.
pub fn read_file_safe(path: &Path, max_bytes: Option<usize>) -> io::Result<(String, bool)> {
    let (bytes, truncated) = match max_bytes {
        Some(limit) => {
            // One extra byte tells us whether anything was left behind.
            let mut bytes = read_prefix(path, limit.saturating_add(1))?;
            let truncated = bytes.len() > limit;
            bytes.truncate(limit);
            (bytes, truncated)
        }
        None => (std::fs::read(path)?, false),
    };
    Ok((decode_bytes(&bytes, truncated), truncated))
}

/// Decode raw bytes to a `String`, never failing.
pub fn decode_bytes(bytes: &[u8], truncated: bool) -> String {
    if bytes.starts_with(&[0xef, 0xbb, 0xbf]) {
        return decode_utf8_prefix(&bytes[3..], truncated);
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        let (cow, _) = UTF_16LE.decode_without_bom_handling(&bytes[2..]);
        return cow.into_owned();
    }
    if bytes.starts_with(&[0xfe, 0xff]) {
        let (cow, _) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        return cow.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        // Only the final, incomplete code point is invalid.
        Err(e) if truncated && e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => decode_detected(bytes),
    }
}

fn decode_utf8_prefix(bytes: &[u8], truncated: bool) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) if truncated && e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_detected(bytes: &[u8]) -> String {
    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let encoding: &'static Encoding = detector.guess(None, true);
    let (cow, _, _) = encoding.decode(bytes);
    cow.into_owned()
}
