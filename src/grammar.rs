//! Grammars: intents described by patterns over literal words and variables.
//!
//! Grammar files are loaded twice over: into token-graph patterns for
//! query-time matching ([`loader::Grammar`]) and into raw patterns keyed by
//! variable signature for index-time materialization
//! ([`loader::GrammarV2`]).

pub mod cross;
pub mod intent;
pub mod loader;
pub mod materialize;
pub mod predicate;

pub use cross::CrossIter;
pub use intent::{FilterValue, GrammarIntent, Intent, IntentContext, PrefixIntent, Query};
pub use loader::{Filters, Grammar, GrammarV2, Grammars, GrammarsV2, IntentFilters};
pub use materialize::{GrammarRule, SuggestField};
pub use predicate::{MemorySearchStats, SearchStats};

/// Hit type of every grammar intent result.
pub const GRAMMAR_TYPE_LANDING_PAGE: &str = "landing-page";

// Landing page intents.
pub const INTENT_LESSONS: &str = "lessons";
pub const INTENT_VIRTUAL_LESSONS: &str = "virtual_lessons";
pub const INTENT_LECTURES: &str = "lectures";
pub const INTENT_WOMEN_LESSONS: &str = "women_lessons";
pub const INTENT_RABASH_LESSONS: &str = "rabash_lessons";
pub const INTENT_LESSON_SERIES: &str = "lesson_series";
pub const INTENT_PROGRAMS: &str = "programs";
pub const INTENT_CLIPS: &str = "clips";
pub const INTENT_LIBRARY: &str = "library";
pub const INTENT_GROUP_ARTICLES: &str = "group_articles";
pub const INTENT_CONVENTIONS: &str = "conventions";
pub const INTENT_HOLIDAYS: &str = "holidays";
pub const INTENT_UNITY_DAYS: &str = "unity_days";
pub const INTENT_FRIENDS_GATHERINGS: &str = "friends_gatherings";
pub const INTENT_MEALS: &str = "meals";
pub const INTENT_TOPICS: &str = "topics";
pub const INTENT_BLOG: &str = "blog";
pub const INTENT_TWITTER: &str = "twitter";
pub const INTENT_ARTICLES: &str = "articles";
pub const INTENT_DOWNLOADS: &str = "downloads";
pub const INTENT_HELP: &str = "help";

// Filter intents.
pub const INTENT_BY_CONTENT_TYPE: &str = "by_content_type";
pub const INTENT_BY_SOURCE: &str = "by_source";
pub const INTENT_BY_PROGRAM: &str = "by_program";
pub const INTENT_BY_PROGRAM_WITHOUT_TERM: &str = "by_program_without_term";
pub const INTENT_SOURCE_POSITION_WITHOUT_TERM: &str = "source_position_without_term";
pub const INTENT_PROGRAM_POSITION_WITHOUT_TERM: &str = "program_position_without_term";
pub const INTENT_SOURCE_PATH: &str = "source_path";
