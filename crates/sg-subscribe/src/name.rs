//! Extracts [`NameAttribute`]s from free-form proxy names.
//!
//! The provider pattern must match the whole (trimmed) name. Integer
//! [`CaptureRef`]s index the ordered capture list where 0 is the whole match
//! and groups that did not participate count as empty strings. In collapse
//! mode the empty entries are removed before indexing, so for a pattern like
//! `(\w+?)(\d+)?(\|Netflix)?` the netflix flag of `HK|Netflix` lands on
//! index 2 instead of 3. Named groups avoid that shift.

use crate::model::{NameAttribute, Result, SubsError};
use regex::{Captures, Regex, RegexBuilder};
use sg_config::{CaptureRef, Definition, ProviderConfig};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct NameParser {
    pattern: Regex,
    definition: Definition,
    collapse: bool,
}

impl NameParser {
    pub fn new(pattern: &str, definition: Definition, collapse: bool) -> Result<Self> {
        let pattern = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
            .map_err(|e| SubsError::InvalidValue(format!("name_parser: {e}")))?;
        Ok(Self {
            pattern,
            definition,
            collapse,
        })
    }

    /// Builds the parser for `provider`; `force_collapse` turns collapse
    /// mode on regardless of the provider setting.
    pub fn from_provider(provider: &ProviderConfig, force_collapse: bool) -> Result<Self> {
        provider.validate()?;
        Self::new(
            &provider.name_parser,
            provider.definition.clone(),
            provider.regex_collapse || force_collapse,
        )
    }

    /// `None` when the name does not match or yields an empty location.
    pub fn parse(&self, name: &str) -> Option<NameAttribute> {
        let caps = self.pattern.captures(name)?;
        let list: Vec<&str> = caps
            .iter()
            .map(|m| m.map_or("", |m| m.as_str()))
            .filter(|s| !self.collapse || !s.is_empty())
            .collect();
        let field = |r: &CaptureRef| lookup(&caps, &list, r);

        let location = field(&self.definition.location_name).trim();
        if location.is_empty() {
            trace!(name, "pattern matched but location is empty");
            return None;
        }
        let id = field(&self.definition.position)
            .trim()
            .parse::<i64>()
            .unwrap_or(-1);
        let netflix = !field(&self.definition.netflix).is_empty();
        let amplification = field(&self.definition.amplification)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .unwrap_or(1.0);

        Some(NameAttribute {
            location: location.to_string(),
            id,
            netflix,
            amplification,
        })
    }

    /// Like [`NameParser::parse`] but falls back to the ungrouped attribute.
    pub fn parse_name(&self, name: &str) -> NameAttribute {
        self.parse(name)
            .unwrap_or_else(|| NameAttribute::ungrouped(name))
    }
}

fn lookup<'h>(caps: &Captures<'h>, list: &[&'h str], r: &CaptureRef) -> &'h str {
    match r {
        CaptureRef::Index(i) if *i >= 0 => list.get(*i as usize).copied().unwrap_or(""),
        CaptureRef::Index(_) => "",
        CaptureRef::Name(n) => caps.name(n).map_or("", |m| m.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = r"(\w+?)(\d+)?(\|Netflix)?";

    fn def(loc: i64, pos: i64, nf: i64, amp: i64) -> Definition {
        Definition {
            location_name: CaptureRef::Index(loc),
            position: CaptureRef::Index(pos),
            netflix: CaptureRef::Index(nf),
            amplification: CaptureRef::Index(amp),
        }
    }

    #[test]
    fn extracts_all_fields() {
        let p = NameParser::new(PATTERN, def(1, 2, 3, -1), false).unwrap();
        assert_eq!(
            p.parse_name("HK01|Netflix"),
            NameAttribute {
                location: "HK".into(),
                id: 1,
                netflix: true,
                amplification: 1.0,
            }
        );
        let us = p.parse_name("US");
        assert_eq!(us.location, "US");
        assert_eq!(us.id, -1);
        assert!(!us.netflix);
    }

    #[test]
    fn match_is_case_insensitive_and_anchored() {
        let p = NameParser::new(PATTERN, def(1, 2, 3, -1), false).unwrap();
        assert!(p.parse("hk02|NETFLIX").unwrap().netflix);
        assert!(p.parse("HK 01").is_none());
    }

    #[test]
    fn non_match_is_ungrouped() {
        let p = NameParser::new(r"([A-Z]{2})-(\d+)", def(1, 2, -1, -1), false).unwrap();
        assert_eq!(
            p.parse_name("流量剩余 10G"),
            NameAttribute::ungrouped("流量剩余 10G")
        );
    }

    #[test]
    fn empty_location_is_ungrouped() {
        let p = NameParser::new(r"([A-Z]*)-(\d+)", def(1, 2, -1, -1), false).unwrap();
        assert!(p.parse("-07").is_none());
        assert_eq!(p.parse_name("-07"), NameAttribute::ungrouped("-07"));
    }

    #[test]
    fn amplification_parses_float() {
        let p = NameParser::new(r"(\w+?)(\d+)(?: x([\d.]+))?", def(1, 2, -1, 3), false).unwrap();
        assert_eq!(p.parse_name("SG03 x1.5").amplification, 1.5);
        assert_eq!(p.parse_name("SG03").amplification, 1.0);
        assert_eq!(p.parse_name("SG03").id, 3);
    }

    #[test]
    fn collapse_shifts_indices() {
        // without the position capture, "|Netflix" moves from 3 to 2
        let plain = NameParser::new(PATTERN, def(1, -1, 2, -1), false).unwrap();
        let collapsed = NameParser::new(PATTERN, def(1, -1, 2, -1), true).unwrap();
        assert!(!plain.parse_name("HK|Netflix").netflix);
        assert!(collapsed.parse_name("HK|Netflix").netflix);
    }

    #[test]
    fn named_groups_ignore_collapse() {
        let definition = Definition {
            location_name: CaptureRef::Name("loc".into()),
            position: CaptureRef::Name("id".into()),
            netflix: CaptureRef::Name("nf".into()),
            amplification: CaptureRef::Index(-1),
        };
        let p = NameParser::new(
            r"(?P<loc>\w+?)(?P<id>\d+)?(?P<nf>\|Netflix)?",
            definition,
            true,
        )
        .unwrap();
        let a = p.parse_name("JP|Netflix");
        assert_eq!(a.location, "JP");
        assert_eq!(a.id, -1);
        assert!(a.netflix);
    }

    #[test]
    fn invalid_pattern_is_invalid_value() {
        let err = NameParser::new("(unclosed", Definition::default(), false).unwrap_err();
        assert!(matches!(err, SubsError::InvalidValue(_)));
    }

    #[test]
    fn provider_validation_runs_first() {
        let err = NameParser::from_provider(&ProviderConfig::default(), false).unwrap_err();
        assert!(matches!(err, SubsError::MissingKey(_)));
    }
}
