//! Search client - session state, memoization, mod filter and highlight / 搜索客户端

pub mod filter;
pub mod highlight;
pub mod memo;
pub mod service;
pub mod state;

pub use filter::{apply_mod_filter, available_mods, extract_mod_ids, matches_mod_filter};
pub use highlight::highlight;
pub use memo::{Decision, SearchKey};
pub use service::{ClientError, Outcome, SearchClient, SearchSession};
pub use state::{reduce, Action, SessionState};
