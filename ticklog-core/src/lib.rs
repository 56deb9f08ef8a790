//! ticklog-core: todo parsing, lexical ranking, classification and rendering
//! for the task-to-ticket matcher.

pub mod candidate;
pub mod classify;
pub mod entry;
pub mod filter;
pub mod ranker;
pub mod render;
pub mod scoring;
pub mod ticket;
pub mod todo;

pub use candidate::{clamp_score, MatchCandidate, MatchMethod};
pub use classify::{EntryStatus, Thresholds};
pub use entry::{ProcessedEntry, ResolvedMatch, MAX_ALTERNATIVES};
pub use filter::CandidateFilter;
pub use ranker::{PreliminaryRanker, DEFAULT_TOP_N};
pub use render::{render, render_line};
pub use scoring::lexical_score;
pub use ticket::TicketRecord;
pub use todo::{parse_todo, parse_todo_line, split_time_annotations, TimeInfo, TodoEntry};
