//! Free-text search over the catalog.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::cmp::Reverse;

use crate::model::{AppRecord, PlatformLevel};
use crate::resolver::{is_compatible, lowest_required_level};

const NAME_WEIGHT: i64 = 6;
const KEYWORD_WEIGHT: i64 = 3;
const DESCRIPTION_WEIGHT: i64 = 1;
const DEVELOPER_WEIGHT: i64 = 1;

/// What the search box holds, and what was last submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub input: String,
    pub submitted: Option<String>,
}

impl SearchState {
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Submits the current input. A blank input clears the submitted term.
    pub fn submit(&mut self) -> Option<&str> {
        let term = self.input.trim();
        self.submitted = (!term.is_empty()).then(|| term.to_string());
        self.submitted.as_deref()
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.submitted = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<'a> {
    Compatible(Vec<&'a AppRecord>),
    /// Nothing runs at this level, but the closest hit is clearly what was meant.
    Incompatible {
        app: &'a AppRecord,
        required_level: u32,
    },
    Empty,
}

fn weighted_score(matcher: &SkimMatcherV2, app: &AppRecord, term: &str) -> Option<i64> {
    let score = |text: &str| matcher.fuzzy_match(text, term);

    let name = score(&app.name);
    let keywords = app.keywords.iter().filter_map(|k| score(k)).max();
    let description = score(&app.description);
    let developer = [app.developer.as_deref(), app.mod_author.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(score)
        .max();

    if name.is_none() && keywords.is_none() && description.is_none() && developer.is_none() {
        return None;
    }

    Some(
        name.unwrap_or(0) * NAME_WEIGHT
            + keywords.unwrap_or(0) * KEYWORD_WEIGHT
            + description.unwrap_or(0) * DESCRIPTION_WEIGHT
            + developer.unwrap_or(0) * DEVELOPER_WEIGHT,
    )
}

/// Every record matching `term`, best first. Ties keep catalog order.
#[must_use]
pub fn ranked<'a>(records: &'a [AppRecord], term: &str) -> Vec<&'a AppRecord> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut hits: Vec<(i64, &AppRecord)> = records
        .iter()
        .filter_map(|app| weighted_score(&matcher, app, term).map(|score| (score, app)))
        .collect();
    hits.sort_by_key(|(score, _)| Reverse(*score));
    hits.into_iter().map(|(_, app)| app).collect()
}

fn names_the_app(term: &str, name: &str) -> bool {
    if name.to_lowercase() == term.to_lowercase() {
        return true;
    }
    // term covers at least 40% of the name
    term.chars().count() * 5 >= name.chars().count() * 2
}

#[must_use]
pub fn search<'a>(records: &'a [AppRecord], term: &str, level: PlatformLevel) -> SearchOutcome<'a> {
    let term = term.trim();
    let (compatible, incompatible): (Vec<_>, Vec<_>) = ranked(records, term)
        .into_iter()
        .partition(|app| is_compatible(app, level));

    if !compatible.is_empty() {
        return SearchOutcome::Compatible(compatible);
    }

    match incompatible.first().copied() {
        Some(app) if names_the_app(term, &app.name) => SearchOutcome::Incompatible {
            app,
            required_level: lowest_required_level(app),
        },
        _ => SearchOutcome::Empty,
    }
}

/// Compatible matches for the type-ahead list.
#[must_use]
pub fn suggestions<'a>(
    records: &'a [AppRecord],
    input: &str,
    level: PlatformLevel,
    limit: usize,
) -> Vec<&'a AppRecord> {
    ranked(records, input)
        .into_iter()
        .filter(|app| is_compatible(app, level))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppId;
    use crate::SUGGESTION_LIMIT;

    fn app(name: &str, min_sdk: u32) -> AppRecord {
        AppRecord {
            id: AppId::new(name.to_lowercase().replace(' ', "-")),
            package: format!("pkg.{}", name.to_lowercase().replace(' ', ".")),
            name: name.into(),
            min_sdk,
            ..AppRecord::default()
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_submit_trims() {
            let mut state = SearchState::default();
            state.set_input("  timer ");
            assert_eq!(state.submit(), Some("timer"));
            assert_eq!(state.submitted.as_deref(), Some("timer"));
        }

        #[test]
        fn test_blank_submit_clears() {
            let mut state = SearchState {
                input: "   ".into(),
                submitted: Some("old".into()),
            };
            assert_eq!(state.submit(), None);
            assert!(state.submitted.is_none());
        }
    }

    mod ranking_tests {
        use super::*;

        #[test]
        fn test_blank_term_matches_nothing() {
            let records = vec![app("Timer", 21)];
            assert!(ranked(&records, "  ").is_empty());
        }

        #[test]
        fn test_name_hit_outranks_description_hit() {
            let described = AppRecord {
                description: "a timer".into(),
                ..app("Clock", 21)
            };
            let records = vec![described, app("Timer", 21), app("Weather", 21)];
            let names: Vec<_> = ranked(&records, "timer").iter().map(|a| a.name.as_str()).collect();
            assert_eq!(names, vec!["Timer", "Clock"]);
        }

        #[test]
        fn test_keywords_and_developer_match() {
            let tagged = AppRecord {
                keywords: vec!["stopwatch".into()],
                ..app("Chrono", 21)
            };
            let by_dev = AppRecord {
                developer: Some("Watchsmith".into()),
                ..app("Dial", 21)
            };
            let records = vec![tagged, by_dev];
            assert_eq!(ranked(&records, "stopwatch").len(), 1);
            assert_eq!(ranked(&records, "watchsmith")[0].name, "Dial");
        }

        #[test]
        fn test_case_insensitive() {
            let records = vec![app("Timer", 21)];
            assert_eq!(ranked(&records, "TIMER").len(), 1);
        }
    }

    mod outcome_tests {
        use super::*;

        #[test]
        fn test_compatible_results() {
            let records = vec![app("Timer", 21), app("Timer Pro", 33)];
            match search(&records, "timer", PlatformLevel::new(25)) {
                SearchOutcome::Compatible(apps) => {
                    assert_eq!(apps.len(), 1);
                    assert_eq!(apps[0].name, "Timer");
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_incompatible_exact_name() {
            let records = vec![app("Timer Pro", 33)];
            match search(&records, "timer pro", PlatformLevel::new(25)) {
                SearchOutcome::Incompatible { app, required_level } => {
                    assert_eq!(app.name, "Timer Pro");
                    assert_eq!(required_level, 33);
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_short_term_on_long_name_is_empty() {
            let records = vec![app("Timer Professional Edition", 33)];
            assert_eq!(
                search(&records, "tim", PlatformLevel::new(25)),
                SearchOutcome::Empty
            );
        }

        #[test]
        fn test_no_match_is_empty() {
            let records = vec![app("Timer", 21)];
            assert_eq!(search(&records, "qqq", PlatformLevel::new(25)), SearchOutcome::Empty);
        }

        #[test]
        fn test_unset_level_everything_compatible() {
            let records = vec![app("Timer", 35)];
            assert!(matches!(
                search(&records, "timer", PlatformLevel::UNSET),
                SearchOutcome::Compatible(_)
            ));
        }
    }

    mod suggestion_tests {
        use super::*;

        #[test]
        fn test_capped_and_compatible_only() {
            let mut records: Vec<_> = (0..8).map(|i| app(&format!("Timer {i}"), 21)).collect();
            records.push(app("Timer Max", 34));
            let found = suggestions(&records, "timer", PlatformLevel::new(30), SUGGESTION_LIMIT);
            assert_eq!(found.len(), SUGGESTION_LIMIT);
            assert!(found.iter().all(|a| a.min_sdk == 21));
        }
    }
}
