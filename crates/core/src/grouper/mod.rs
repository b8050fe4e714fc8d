//! Episode grouping of search results.
//!
//! Filenames carry season/episode tokens in a handful of common shapes
//! ("Show S01E02 1080p.mkv", "Show.S01E02.720p.mkv", "show season 1
//! episode 2"). Grouping buckets a result set by those tokens so multiple
//! quality variants of the same episode sit together.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

use crate::shard::MediaRecord;

/// Bucket name for records without a parsable season/episode token.
pub const OTHER_GROUP: &str = "Other";

/// Season/episode extraction: a lazy series prefix, a season marker
/// (`s`/`season`) with digits, then an episode marker (`e`/`ep`/`episode`)
/// with digits. Separators between the pieces are optional runs of
/// whitespace, dots, dashes, underscores and brackets.
static EPISODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<series>.*?)[\s\._\-\[\(]*(?:season|s)[\s\._\-]*(?P<season>\d{1,2})[\s\._\-\)\]]*(?:episode|ep|e)[\s\._\-]*(?P<episode>\d{1,2})",
    )
    .expect("episode pattern is valid")
});

/// One season/episode bucket.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeGroup {
    /// `"S{season} E{episode}"` with zero-padded numbers, or `"Other"`.
    pub key: String,
    /// Records in the order they were received.
    pub records: Vec<MediaRecord>,
}

/// Extract `(season, episode)` from a file name, if present.
pub fn extract_episode(name: &str) -> Option<(u32, u32)> {
    let captures = EPISODE_PATTERN.captures(name)?;
    let season = captures.name("season")?.as_str().parse().ok()?;
    let episode = captures.name("episode")?.as_str().parse().ok()?;
    Some((season, episode))
}

/// Group records into episode buckets.
///
/// Buckets come out in ascending (season, episode) order; records that
/// fail extraction land in a final `"Other"` bucket. Within a bucket the
/// input order is preserved.
pub fn group(records: Vec<MediaRecord>) -> Vec<EpisodeGroup> {
    let mut buckets: BTreeMap<(u32, u32), Vec<MediaRecord>> = BTreeMap::new();
    let mut other: Vec<MediaRecord> = Vec::new();

    for record in records {
        match extract_episode(&record.name) {
            Some(key) => buckets.entry(key).or_default().push(record),
            None => other.push(record),
        }
    }

    let mut groups: Vec<EpisodeGroup> = buckets
        .into_iter()
        .map(|((season, episode), records)| EpisodeGroup {
            key: format!("S{season:02} E{episode:02}"),
            records,
        })
        .collect();

    if !other.is_empty() {
        groups.push(EpisodeGroup {
            key: OTHER_GROUP.to_string(),
            records: other,
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> MediaRecord {
        MediaRecord {
            compact_id: name.to_string(),
            reference_token: "ref".to_string(),
            name: name.to_string(),
            size_bytes: 1,
            media_type: None,
            mime_type: None,
            caption: None,
        }
    }

    #[test]
    fn test_extract_compact_form() {
        assert_eq!(extract_episode("Show S01E02 1080p.mkv"), Some((1, 2)));
        assert_eq!(extract_episode("Show.S01E02.720p.mkv"), Some((1, 2)));
        assert_eq!(extract_episode("S01E02.mkv"), Some((1, 2)));
    }

    #[test]
    fn test_extract_spelled_out_forms() {
        assert_eq!(extract_episode("Show Season 1 Episode 2.mkv"), Some((1, 2)));
        assert_eq!(extract_episode("show season1episode2"), Some((1, 2)));
        assert_eq!(extract_episode("Show s1 ep2 [WEB-DL]"), Some((1, 2)));
        assert_eq!(extract_episode("SHOW.SEASON.2.EP.13.mkv"), Some((2, 13)));
    }

    #[test]
    fn test_extract_requires_both_markers() {
        assert_eq!(extract_episode("Show S01.mkv"), None);
        assert_eq!(extract_episode("Show Episode 2.mkv"), None);
        assert_eq!(extract_episode("Some Movie (2024).mkv"), None);
    }

    #[test]
    fn test_extract_series_name_containing_s() {
        // The trailing "s" of the title must not be taken as the marker
        assert_eq!(extract_episode("Madness S02E05.mkv"), Some((2, 5)));
    }

    #[test]
    fn test_variants_share_a_key() {
        let groups = group(vec![
            record("Show S01E02 1080p.mkv"),
            record("Show.S01E02.720p.mkv"),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "S01 E02");
        assert_eq!(groups[0].records.len(), 2);
        // Input order preserved within the bucket
        assert_eq!(groups[0].records[0].name, "Show S01E02 1080p.mkv");
    }

    #[test]
    fn test_buckets_ascend_numerically() {
        let groups = group(vec![
            record("Show S02E01.mkv"),
            record("Show S01E10.mkv"),
            record("Show S10E01.mkv"),
            record("Show S01E02.mkv"),
        ]);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["S01 E02", "S01 E10", "S02 E01", "S10 E01"]);
    }

    #[test]
    fn test_unparsable_goes_to_other_last() {
        let groups = group(vec![
            record("random-clip.mp4"),
            record("Show S01E01.mkv"),
        ]);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["S01 E01", OTHER_GROUP]);
        assert_eq!(groups[1].records[0].name, "random-clip.mp4");
    }

    #[test]
    fn test_only_unparsable_yields_single_other_bucket() {
        let groups = group(vec![record("a.mkv"), record("b.mkv")]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, OTHER_GROUP);
        assert_eq!(groups[0].records.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(group(Vec::new()).is_empty());
    }

    #[test]
    fn test_keys_are_zero_padded() {
        let groups = group(vec![record("Show s1 ep2.mkv")]);
        assert_eq!(groups[0].key, "S01 E02");
    }
}
