//! Shared types and the error taxonomy for the `autoreply` core: every
//! other crate in the workspace depends on this one and nothing else
//! depends on them.

mod cache_entry;
mod config;
mod credential;
mod error;
mod handle;
mod record;
mod sid;

pub use cache_entry::CacheMetadata;
pub use config::{Config, ConfigIssue, ConfigSeverity};
pub use credential::Credentials;
pub use error::{Error, Result};
pub use handle::Handle;
pub use record::{
    record_uri, BlobRef, Embed, Facet, FacetFeature, ImageEmbed, PostRecord, ProfileRecord,
    ReplyRef,
};
pub use sid::Sid;
