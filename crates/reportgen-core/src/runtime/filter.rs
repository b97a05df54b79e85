//! Step filtering.

use std::fmt;
use std::str::FromStr;

use reportgen_proto::{Step, Verdict};

use super::error::ValidationError;

/// Result category a step must belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepFilter {
    #[default]
    All,
    Pass,
    /// Matches both the `fail` and `ng` spellings.
    Fail,
    Warn,
}

impl StepFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StepFilter::All => "all",
            StepFilter::Pass => "pass",
            StepFilter::Fail => "fail",
            StepFilter::Warn => "warn",
        }
    }

    pub fn matches_result(self, result: &str) -> bool {
        match self {
            StepFilter::All => true,
            StepFilter::Pass => Verdict::from_raw(result) == Verdict::Pass,
            StepFilter::Fail => Verdict::from_raw(result) == Verdict::Fail,
            StepFilter::Warn => Verdict::from_raw(result) == Verdict::Warn,
        }
    }
}

impl FromStr for StepFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StepFilter::All),
            "pass" => Ok(StepFilter::Pass),
            "fail" => Ok(StepFilter::Fail),
            "warn" => Ok(StepFilter::Warn),
            _ => Err(ValidationError::UnknownFilter(s.to_string())),
        }
    }
}

impl fmt::Display for StepFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A result category combined with a case-insensitive search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepQuery {
    pub filter: StepFilter,
    needle: String,
}

impl StepQuery {
    /// An empty search term places no constraint on step text.
    pub fn new(filter: StepFilter, search: &str) -> Self {
        Self {
            filter,
            needle: search.to_lowercase(),
        }
    }

    pub fn search(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, step: &Step) -> bool {
        self.filter.matches_result(&step.result) && self.matches_text(step)
    }

    // Searches ident, content and, when present, the table description,
    // headings and every cell.
    fn matches_text(&self, step: &Step) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let hit = |text: &str| text.to_lowercase().contains(&self.needle);
        if hit(&step.ident) || hit(&step.content) {
            return true;
        }
        step.tabular_info.as_ref().is_some_and(|table| {
            hit(&table.description)
                || table.headings.iter().any(|heading| hit(heading))
                || table.rows.iter().flatten().any(|cell| hit(cell))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportgen_proto::TabularInfo;

    fn step(result: &str, content: &str) -> Step {
        Step {
            ident: "CAN".to_string(),
            result: result.to_string(),
            content: content.to_string(),
            ..Step::default()
        }
    }

    #[test]
    fn test_fail_filter_matches_ng() {
        let query = StepQuery::new(StepFilter::Fail, "");
        let results = ["fail", "ng", "NG", "pass", "warn", "na"];
        let matched: Vec<_> = results
            .iter()
            .filter(|result| query.matches(&step(result, "")))
            .collect();
        assert_eq!(matched, vec![&"fail", &"ng", &"NG"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let query = StepQuery::new(StepFilter::All, "FRAME");
        assert!(query.matches(&step("pass", "Sent frame 0x12")));
        assert!(query.matches(&Step {
            ident: "Frame check".to_string(),
            ..Step::default()
        }));
        assert!(!query.matches(&step("pass", "idle")));
    }

    #[test]
    fn test_search_covers_table() {
        let mut with_table = step("pass", "measurement");
        with_table.tabular_info = Some(TabularInfo {
            description: "Voltage".to_string(),
            headings: vec!["Channel".to_string()],
            rows: vec![vec!["CH1".to_string(), "12.1V".to_string()]],
        });

        for term in ["voltage", "channel", "12.1v"] {
            assert!(StepQuery::new(StepFilter::All, term).matches(&with_table), "{term}");
        }
        assert!(!StepQuery::new(StepFilter::All, "current").matches(&with_table));
    }

    #[test]
    fn test_filter_and_search_combine() {
        let query = StepQuery::new(StepFilter::Pass, "frame");
        assert!(query.matches(&step("pass", "frame")));
        assert!(!query.matches(&step("fail", "frame")));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!("Fail".parse::<StepFilter>().unwrap(), StepFilter::Fail);
        assert_eq!(
            "broken".parse::<StepFilter>().unwrap_err(),
            ValidationError::UnknownFilter("broken".to_string())
        );
    }
}
