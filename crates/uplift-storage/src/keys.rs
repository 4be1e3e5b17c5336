//! Shared key generation for uploads.
//!
//! Key format: `{owner}/{timestamp}-{filename}`, timestamp zero-padded to 13
//! digits so lexicographic order matches submission order.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Millisecond clock that never hands out the same value twice.
///
/// Each draw returns `max(now, previous + 1)`, so a batch submitted within one
/// millisecond still gets distinct, increasing timestamps.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(previous + 1);
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => previous = actual,
            }
        }
    }
}

/// Generate an upload key for the given owner, timestamp and filename.
///
/// Path separators in the filename are replaced so the key keeps exactly one
/// owner segment.
pub fn generate_upload_key(owner: &str, timestamp: u64, filename: &str) -> String {
    let owner = owner.trim_matches('/');
    let filename: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}/{:013}-{}", owner, timestamp, filename)
}

/// Percent-encode each path segment of a key for use in a URL path.
pub fn encode_key_path(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(
            generate_upload_key("user-1", 1_700_000_000_000, "photo.png"),
            "user-1/1700000000000-photo.png"
        );
        assert_eq!(
            generate_upload_key("/user-1/", 42, "a.txt"),
            "user-1/0000000000042-a.txt"
        );
    }

    #[test]
    fn test_filename_separators_replaced() {
        assert_eq!(
            generate_upload_key("o", 1, "../etc/passwd"),
            "o/0000000000001-.._etc_passwd"
        );
    }

    #[test]
    fn test_clock_is_strictly_increasing() {
        let clock = MonotonicClock::new();
        let mut previous = clock.next();
        for _ in 0..1000 {
            let next = clock.next();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_keys_sort_by_submission() {
        let clock = MonotonicClock::new();
        let first = generate_upload_key("o", clock.next(), "zzz.png");
        let second = generate_upload_key("o", clock.next(), "aaa.png");
        assert!(second > first);
    }

    #[test]
    fn test_encode_key_path_keeps_separators() {
        assert_eq!(
            encode_key_path("owner/0000000000001-my photo.png"),
            "owner/0000000000001-my%20photo.png"
        );
    }
}
