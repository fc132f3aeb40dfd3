//! Boundary 4 tool interface (§6): the core's exposed surface, one
//! plain async function per tool, composing the identity, credential,
//! repository, search, and thread layers. JSON-RPC dispatch is a host
//! concern and lives outside this crate.

mod args;
mod results;
mod session;
mod tools;

pub use args::{
    DeleteArgs, FeedArgs, LikeArgs, LoginArgs, PostArgs, ProfileArgs, RepostArgs, SearchArgs,
    ThreadArgs,
};
pub use results::{FeedResult, LoginResult, ProfileResult, SearchResult, ThreadResult, WriteResult};
pub use tools::Tools;
