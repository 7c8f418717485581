use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// Which emotes a query admits, by animation
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnimationFilter {
    #[default]
    All,
    Animated,
    Static,
}

impl AnimationFilter {
    /// Resolve the filter from `emote_type`, falling back to the older
    /// `animated_only` flag when `emote_type` is absent
    pub fn resolve(emote_type: Option<&str>, animated_only: Option<bool>) -> AppResult<Self> {
        match emote_type.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse().map_err(|_| {
                AppError::validation("Invalid emote_type. Use 'all', 'animated', or 'static'")
            }),
            None => Ok(match animated_only {
                Some(true) => Self::Animated,
                _ => Self::All,
            }),
        }
    }

    /// Value of the upstream `animated` filter, `None` meaning unfiltered
    pub fn upstream_animated(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Animated => Some(true),
            Self::Static => Some(false),
        }
    }

    pub fn admits(self, animated: bool) -> bool {
        match self {
            Self::All => true,
            Self::Animated => animated,
            Self::Static => !animated,
        }
    }
}

/// Ranking window for trending listings
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrendingPeriod {
    TrendingDaily,
    #[default]
    TrendingWeekly,
    TrendingMonthly,
    Popularity,
}

impl TrendingPeriod {
    pub fn resolve(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse().map_err(|_| {
                AppError::validation(
                    "Invalid period. Use 'trending_daily', 'trending_weekly', 'trending_monthly', or 'popularity'",
                )
            }),
            None => Ok(Self::default()),
        }
    }
}

/// Top-level folder of the object store an archive lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StorageFolder {
    /// Archive of search results
    EmoteApi,
    /// Archive of trending results
    TrendingEmotes,
}

impl StorageFolder {
    /// Listing prefix including the trailing slash
    pub fn prefix(self) -> String {
        format!("{self}/")
    }

    pub fn key_for(self, file_name: &str) -> String {
        format!("{self}/{file_name}")
    }
}

/// Cache namespaces addressed by the administrative clear
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CacheClass {
    #[default]
    All,
    Search,
    Trending,
}

impl CacheClass {
    pub fn resolve(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse().map_err(|_| {
                AppError::validation("Invalid cache_type. Options are: all, search, trending")
            }),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("animated"), None, AnimationFilter::Animated)]
    #[case(Some("static"), Some(true), AnimationFilter::Static)]
    #[case(None, Some(true), AnimationFilter::Animated)]
    #[case(None, Some(false), AnimationFilter::All)]
    #[case(Some(""), None, AnimationFilter::All)]
    #[case(None, None, AnimationFilter::All)]
    fn test_animation_filter_resolution(
        #[case] emote_type: Option<&str>,
        #[case] animated_only: Option<bool>,
        #[case] expected: AnimationFilter,
    ) {
        assert_eq!(
            AnimationFilter::resolve(emote_type, animated_only).unwrap(),
            expected
        );
    }

    #[test]
    fn test_unknown_values_are_validation_errors() {
        assert!(matches!(
            AnimationFilter::resolve(Some("moving"), None),
            Err(AppError::Validation { .. })
        ));
        assert!(TrendingPeriod::resolve(Some("hourly")).is_err());
        assert!(CacheClass::resolve(Some("everything")).is_err());
    }

    #[test]
    fn test_period_round_trips_through_strings() {
        assert_eq!(TrendingPeriod::resolve(None).unwrap(), TrendingPeriod::TrendingWeekly);
        assert_eq!(
            TrendingPeriod::resolve(Some("popularity")).unwrap().to_string(),
            "popularity"
        );
        assert_eq!(TrendingPeriod::TrendingMonthly.as_ref(), "trending_monthly");
    }

    #[test]
    fn test_folder_keys() {
        assert_eq!(StorageFolder::EmoteApi.prefix(), "emote_api/");
        assert_eq!(
            StorageFolder::TrendingEmotes.key_for("a_static.webp"),
            "trending_emotes/a_static.webp"
        );
    }

    #[test]
    fn test_filter_admission() {
        assert!(AnimationFilter::All.admits(true));
        assert!(!AnimationFilter::Static.admits(true));
        assert!(AnimationFilter::Animated.admits(true));
        assert_eq!(AnimationFilter::Static.upstream_animated(), Some(false));
        assert_eq!(AnimationFilter::All.upstream_animated(), None);
    }
}
