//! Version banner parsing and numeric version ordering.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::uv::types::Installation;

/// `<word> X.Y.Z` with an optional `(tag)` after it.
static VERSION_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+\s+(\d+\.\d+\.\d+)(?:\s+\(([^)]+)\))?").expect("valid version regex")
});

/// Extracts the version and optional build tag from a banner like
/// `uv 0.5.2 (a1b2c3d 2024-06-20)`.
///
/// Returns `None` if no version is found anywhere in `text`.
pub fn parse_version(text: &str) -> Option<(String, Option<String>)> {
    let caps = VERSION_BANNER.captures(text)?;
    let version = caps.get(1)?.as_str().to_string();
    let date = caps.get(2).map(|m| m.as_str().to_string());
    Some((version, date))
}

/// Compares two dotted versions segment by segment.
///
/// Numeric segments compare as numbers, so `0.5.10 > 0.5.2`. Missing
/// segments count as zero. A segment that is not a plain number compares by
/// its leading digits first; on a tie a pre-release suffix (`1rc1`) ranks
/// below the bare number and a `post` suffix ranks above it.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let ord = compare_segment(l.unwrap_or("0"), r.unwrap_or("0"));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => leading_number(a)
            .cmp(&leading_number(b))
            .then_with(|| release_rank(a).cmp(&release_rank(b)))
            .then_with(|| a.cmp(b)),
    }
}

fn leading_number(segment: &str) -> u64 {
    let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// 0 for pre-releases, 1 for a bare number, 2 for post-releases.
fn release_rank(segment: &str) -> u8 {
    let suffix = segment.trim_start_matches(|c: char| c.is_ascii_digit());
    if suffix.is_empty() {
        1
    } else if suffix.starts_with("post") {
        2
    } else {
        0
    }
}

/// Sorts installations newest first.
pub fn sort_installations(installations: &mut [Installation]) {
    installations.sort_by(|a, b| compare_versions(&b.version, &a.version));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_with_tag() {
        let parsed = parse_version("uv 0.5.2 (a1b2c3d 2024-06-20)\n");
        assert_eq!(
            parsed,
            Some(("0.5.2".to_string(), Some("a1b2c3d 2024-06-20".to_string())))
        );
    }

    #[test]
    fn test_parse_version_without_tag() {
        assert_eq!(
            parse_version("uv 0.4.9"),
            Some(("0.4.9".to_string(), None))
        );
    }

    #[test]
    fn test_parse_version_other_word() {
        assert_eq!(
            parse_version("tool 1.22.333 (nightly)"),
            Some(("1.22.333".to_string(), Some("nightly".to_string())))
        );
    }

    #[test]
    fn test_parse_version_found_after_noise() {
        let text = "warning: something odd\nuv 0.6.0\n";
        assert_eq!(parse_version(text), Some(("0.6.0".to_string(), None)));
    }

    #[test]
    fn test_parse_version_no_match() {
        assert_eq!(parse_version(""), None);
        assert_eq!(parse_version("uv version unknown"), None);
        assert_eq!(parse_version("0.5.2"), None);
        assert_eq!(parse_version("uv 0.5"), None);
    }

    #[test]
    fn test_compare_versions_numeric() {
        assert_eq!(compare_versions("0.5.10", "0.5.2"), Ordering::Greater);
        assert_eq!(compare_versions("0.4.9", "0.5.2"), Ordering::Less);
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.1", "1.0"), Ordering::Greater);
        assert_eq!(compare_versions("10.0.0", "9.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_versions_non_numeric_segment() {
        assert_eq!(compare_versions("0.5.1rc1", "0.5.0"), Ordering::Greater);
        assert_eq!(compare_versions("0.5.1a1", "0.5.1a2"), Ordering::Less);
    }

    #[test]
    fn test_compare_versions_prerelease_below_final() {
        assert_eq!(compare_versions("0.5.1rc1", "0.5.1"), Ordering::Less);
        assert_eq!(compare_versions("0.5.1", "0.5.1b2"), Ordering::Greater);
        assert_eq!(compare_versions("0.5.1.post1", "0.5.1"), Ordering::Greater);
        assert_eq!(compare_versions("0.5.1rc1", "0.5.1rc1"), Ordering::Equal);
    }

    #[test]
    fn test_sort_installations_descending_numeric() {
        let mut installations: Vec<Installation> = ["0.5.2", "0.5.10", "0.4.9"]
            .iter()
            .map(|v| Installation {
                path: format!("/opt/uv-{}", v),
                version: v.to_string(),
                version_date: None,
            })
            .collect();

        sort_installations(&mut installations);

        let versions: Vec<&str> = installations.iter().map(|i| i.version.as_str()).collect();
        assert_eq!(versions, vec!["0.5.10", "0.5.2", "0.4.9"]);
    }
}
