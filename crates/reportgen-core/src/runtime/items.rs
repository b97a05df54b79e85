//! Filtering of the manifest item list.

use std::fmt;
use std::str::FromStr;

use reportgen_proto::ManifestItem;

use super::error::ValidationError;

/// Which manifest items to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemFilter {
    #[default]
    All,
    Pass,
    Fail,
    Warn,
    Skipped,
}

impl ItemFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemFilter::All => "all",
            ItemFilter::Pass => "pass",
            ItemFilter::Fail => "fail",
            ItemFilter::Warn => "warn",
            ItemFilter::Skipped => "skipped",
        }
    }

    /// Verdicts compare exactly, the same way the report summary counts them.
    pub fn matches(self, item: &ManifestItem) -> bool {
        match (self, item) {
            (ItemFilter::All, _) => true,
            (ItemFilter::Skipped, ManifestItem::Skipped { .. }) => true,
            (ItemFilter::Skipped, ManifestItem::Testcase { .. })
            | (_, ManifestItem::Skipped { .. }) => false,
            (filter, ManifestItem::Testcase { verdict, .. }) => verdict == filter.as_str(),
        }
    }

    pub fn apply(self, items: &[ManifestItem]) -> Vec<&ManifestItem> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

impl FromStr for ItemFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ItemFilter::All),
            "pass" => Ok(ItemFilter::Pass),
            "fail" => Ok(ItemFilter::Fail),
            "warn" => Ok(ItemFilter::Warn),
            "skipped" | "nt" => Ok(ItemFilter::Skipped),
            _ => Err(ValidationError::UnknownFilter(s.to_string())),
        }
    }
}

impl fmt::Display for ItemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
