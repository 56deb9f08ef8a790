//! ticklog-match: oracle client with model cascade, reply repair,
//! reconciliation and the `match_all` pipeline.

pub mod cascade;
pub mod oracle;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub mod reply;
pub mod source;

pub use cascade::{CallKind, MatchingOracleClient, OracleConfig, OracleFailure, OracleReply};
pub use oracle::{Oracle, OracleError};
pub use pipeline::{FallbackReason, MatchOutcome, Matcher};
pub use reply::{parse_reply, OracleSuggestion, OracleTaskMatch, ReplyError};
pub use source::{fetch_universe, TicketSource};
