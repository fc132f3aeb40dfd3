//! Search Engine (§4.8): combines the identity resolver, archive
//! fetcher, archive reader, tree walker, and record decoder to produce
//! ranked, URI-resolved post matches for a query.

mod engine;
mod matcher;

pub use engine::{check_all_posts_resolvable, SearchEngine, SearchMatch};
pub use matcher::{match_text, MatchKind, TextMatch};
