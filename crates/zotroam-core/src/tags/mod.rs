//! Tag normalization
//!
//! Pipeline from a library's raw tag list to merge suggestions:
//!
//! 1. [`map`]: group tags by exact string, keeping type variants
//! 2. [`tokenize`]: collapse case and compound variants into entries,
//!    bucketed by initial
//! 3. [`roam`]: attach Roam pages whose title spells an entry's token
//! 4. [`suggest`]: recommend a canonical spelling per entry

pub mod map;
pub mod roam;
pub mod suggest;
pub mod tokenize;

pub use map::{build_tag_map, build_tag_map_from_values, TagMap, TagMapEntry};
pub use roam::{match_roam_pages, AnnotationIndex, PageIndex, RoamPage};
pub use suggest::{suggest, suggest_all, BucketSuggestions, MergeType, SuggestedEntry, Suggestion};
pub use tokenize::{tokenize, tokenize_with_order, FirstSeenOrder, TagBuckets, TagEntry};
