// Career matching core.
// Keyword engine: unranked rule-based matches. Hybrid engine: keyword pre-filter
// plus embedding re-rank. Both read the shared, immutable catalog.

pub mod handlers;
pub mod hybrid;
pub mod keyword;
pub mod normalize;
