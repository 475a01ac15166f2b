//! Transaction and entry tags.
//!
//! Tags travel as a comma-separated string of `key:value` items. A backslash
//! escapes a comma or backslash inside one item. [`Tags`] keeps that wire form
//! stable; [`TagMap`] is the typed view the rules work with, parsed once per
//! evaluation.

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Ordered, de-duplicated set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Creates an empty tag set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Parses the wire form.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut tags = Self::new();
        let mut current = String::new();
        let mut chars = source.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                ',' => tags.add(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        tags.add(current);
        tags
    }

    /// Adds a tag. Blank and duplicate tags are ignored.
    pub fn add(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        let trimmed = tag.trim();
        if !trimmed.is_empty() && !self.contains(trimmed) {
            self.0.push(trimmed.to_string());
        }
    }

    /// Adds a tag, builder style.
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>) -> Self {
        self.add(tag);
        self
    }

    /// Returns true if the exact tag is present.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Value of the last `key:value` tag with this key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs().filter(|(k, _)| *k == key).map(|(_, v)| v).last()
    }

    /// Returns true if some `key:value` tag has this key.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.pairs().any(|(k, _)| k == key)
    }

    /// `self` followed by `other`. A tag present in both takes its position
    /// in `other`, so `other` wins every key lookup.
    #[must_use]
    pub fn merged_with(&self, other: &Self) -> Self {
        let mut merged: Vec<String> = self
            .0
            .iter()
            .filter(|t| !other.contains(t))
            .cloned()
            .collect();
        merged.extend(other.0.iter().cloned());
        Self(merged)
    }

    /// Iterates over the raw tags.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs, skipping tags without a colon.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|t| t.split_once(':'))
            .map(|(k, v)| (k.trim(), v.trim()))
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            for c in tag.chars() {
                if matches!(c, ',' | '\\') {
                    f.write_str("\\")?;
                }
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Tags {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Tags {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<String> for Tags {
    fn from(source: String) -> Self {
        Self::parse(&source)
    }
}

impl From<Tags> for String {
    fn from(tags: Tags) -> Self {
        tags.to_string()
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Self::new();
        for tag in iter {
            tags.add(tag);
        }
        tags
    }
}

/// Known tag keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKey {
    /// `daily_limit`
    DailyLimit,
    /// `cumulative_limit`
    CumulativeLimit,
    /// `fee_limit`
    FeeLimit,
    /// `group`
    Group,
    /// `type`
    Type,
    /// `credit`
    Credit,
    /// `debit`
    Debit,
    /// `completes`
    Completes,
    /// `reverses`
    Reverses,
    /// `completed`
    Completed,
    /// `reversed`
    Reversed,
    /// `skip_limits`
    SkipLimits,
    /// Anything else.
    Other(String),
}

impl TagKey {
    /// Parses a key.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key {
            "daily_limit" => Self::DailyLimit,
            "cumulative_limit" => Self::CumulativeLimit,
            "fee_limit" => Self::FeeLimit,
            "group" => Self::Group,
            "type" => Self::Type,
            "credit" => Self::Credit,
            "debit" => Self::Debit,
            "completes" => Self::Completes,
            "reverses" => Self::Reverses,
            "completed" => Self::Completed,
            "reversed" => Self::Reversed,
            "skip_limits" => Self::SkipLimits,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::DailyLimit => "daily_limit",
            Self::CumulativeLimit => "cumulative_limit",
            Self::FeeLimit => "fee_limit",
            Self::Group => "group",
            Self::Type => "type",
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Completes => "completes",
            Self::Reverses => "reverses",
            Self::Completed => "completed",
            Self::Reversed => "reversed",
            Self::SkipLimits => "skip_limits",
            Self::Other(key) => key,
        }
    }

    const fn is_decimal(&self) -> bool {
        matches!(
            self,
            Self::DailyLimit | Self::CumulativeLimit | Self::FeeLimit
        )
    }

    const fn is_flag(&self) -> bool {
        matches!(self, Self::Completed | Self::Reversed | Self::SkipLimits)
    }
}

/// Typed tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    /// Limit amounts.
    Decimal(Decimal),
    /// Boolean markers. Anything but `true` (any case) is false.
    Flag(bool),
    /// Free text.
    Text(String),
}

/// Typed view over [`Tags`]. Later tags override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap(BTreeMap<TagKey, TagValue>);

impl TagMap {
    /// Parses tags into typed values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidLimitTag`] if a limit key carries a value
    /// that is not a decimal.
    pub fn parse(tags: &Tags) -> Result<Self, LedgerError> {
        Self::parse_with(tags, |_| true)
    }

    /// Parses tags, failing only on limit values under the keys in
    /// `consumed`. Unparseable limit values under other keys are kept as
    /// text.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidLimitTag`] if a consumed limit key
    /// carries a value that is not a decimal.
    pub fn parse_consumed(tags: &Tags, consumed: &BTreeSet<TagKey>) -> Result<Self, LedgerError> {
        Self::parse_with(tags, |key| consumed.contains(key))
    }

    fn parse_with<F>(tags: &Tags, strict: F) -> Result<Self, LedgerError>
    where
        F: Fn(&TagKey) -> bool,
    {
        let mut map = BTreeMap::new();
        for (raw_key, raw_value) in tags.pairs() {
            let key = TagKey::parse(raw_key);
            let value = if key.is_decimal() {
                match Decimal::from_str(raw_value) {
                    Ok(amount) => TagValue::Decimal(amount),
                    Err(_) if strict(&key) => {
                        return Err(LedgerError::InvalidLimitTag {
                            key: raw_key.to_string(),
                            value: raw_value.to_string(),
                        });
                    }
                    Err(_) => TagValue::Text(raw_value.to_string()),
                }
            } else if key.is_flag() {
                TagValue::Flag(raw_value.eq_ignore_ascii_case("true"))
            } else {
                TagValue::Text(raw_value.to_string())
            };
            map.insert(key, value);
        }
        Ok(Self(map))
    }

    /// Raw typed value.
    #[must_use]
    pub fn get(&self, key: &TagKey) -> Option<&TagValue> {
        self.0.get(key)
    }

    /// Decimal value, if the key holds one.
    #[must_use]
    pub fn decimal(&self, key: &TagKey) -> Option<Decimal> {
        match self.0.get(key) {
            Some(TagValue::Decimal(amount)) => Some(*amount),
            _ => None,
        }
    }

    /// Flag value; absent keys are false.
    #[must_use]
    pub fn flag(&self, key: &TagKey) -> bool {
        matches!(self.0.get(key), Some(TagValue::Flag(true)))
    }

    /// Text value, if the key holds one.
    #[must_use]
    pub fn text(&self, key: &TagKey) -> Option<&str> {
        match self.0.get(key) {
            Some(TagValue::Text(text)) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_trims_and_dedups() {
        let tags = Tags::parse(" daily_limit:500 , group:INBOUND,daily_limit:500,,");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.to_string(), "daily_limit:500,group:INBOUND");
    }

    #[test]
    fn test_escaped_comma_round_trip() {
        let tags = Tags::new().with("note:a,b").with("path:c\\d");
        let wire = tags.to_string();
        assert_eq!(wire, "note:a\\,b,path:c\\\\d");
        assert_eq!(Tags::parse(&wire), tags);
        assert_eq!(tags.get("note"), Some("a,b"));
    }

    #[test]
    fn test_get_returns_last_value() {
        let tags = Tags::parse("type:AMOUNT,credit:wallet-9,type:REBATE");
        assert_eq!(tags.get("type"), Some("REBATE"));
        assert_eq!(tags.get("credit"), Some("wallet-9"));
        assert_eq!(tags.get("debit"), None);
    }

    #[test]
    fn test_merged_with_appends() {
        let txn = Tags::parse("daily_limit:500");
        let spec = Tags::parse("fee_limit:10");
        assert_eq!(txn.merged_with(&spec).to_string(), "daily_limit:500,fee_limit:10");
    }

    #[test]
    fn test_merged_with_other_wins_repeated_tag() {
        let txn = Tags::parse("k:1,k:2");
        let spec = Tags::parse("k:1");
        let merged = txn.merged_with(&spec);
        assert_eq!(merged.get("k"), Some("1"));
        assert_eq!(merged.to_string(), "k:2,k:1");
        assert_eq!(Tags::parse(&merged.to_string()).get("k"), Some("1"));
    }

    #[test]
    fn test_parse_consumed_keeps_other_invalid_limits() {
        let tags = Tags::parse("fee_limit:abc,daily_limit:100");
        let consumed = BTreeSet::from([TagKey::DailyLimit]);
        let map = TagMap::parse_consumed(&tags, &consumed).unwrap();
        assert_eq!(map.decimal(&TagKey::DailyLimit), Some(dec!(100)));
        assert_eq!(map.decimal(&TagKey::FeeLimit), None);
        assert_eq!(map.text(&TagKey::FeeLimit), Some("abc"));

        let consumed = BTreeSet::from([TagKey::FeeLimit]);
        let err = TagMap::parse_consumed(&tags, &consumed).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLimitTag { ref key, .. } if key == "fee_limit"));
    }

    #[test]
    fn test_serde_uses_wire_string() {
        let tags = Tags::parse("completed:true,group:INBOUND");
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, "\"completed:true,group:INBOUND\"");
        let back: Tags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tags);
    }

    #[test]
    fn test_tag_map_typed_values() {
        let map = TagMap::parse(&Tags::parse(
            "daily_limit:1000.00,skip_limits:TRUE,group:INBOUND,vip,channel:web",
        ))
        .unwrap();
        assert_eq!(map.decimal(&TagKey::DailyLimit), Some(dec!(1000.00)));
        assert_eq!(map.decimal(&TagKey::CumulativeLimit), None);
        assert!(map.flag(&TagKey::SkipLimits));
        assert!(!map.flag(&TagKey::Completed));
        assert_eq!(map.text(&TagKey::Group), Some("INBOUND"));
        assert_eq!(map.text(&TagKey::Other("channel".into())), Some("web"));
    }

    #[test]
    fn test_tag_map_rejects_bad_limit() {
        let err = TagMap::parse(&Tags::parse("cumulative_limit:lots")).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidLimitTag { ref key, ref value } if key == "cumulative_limit" && value == "lots"
        ));
    }

    #[test]
    fn test_tag_map_rejects_empty_limit() {
        assert!(TagMap::parse(&Tags::parse("daily_limit:")).is_err());
    }

    #[test]
    fn test_tag_key_round_trip() {
        for key in ["daily_limit", "type", "completes", "skip_limits", "custom"] {
            assert_eq!(TagKey::parse(key).as_str(), key);
        }
    }
}
