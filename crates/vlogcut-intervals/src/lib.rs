//! Narrative-driven interval selection.
//!
//! This crate turns per-source annotation files and a narrative into a
//! cutting plan:
//! - Annotation parsing and per-source grouping
//! - Content chunking for the oracle digest
//! - Proportional, budget-bounded interval selection with a fallback heuristic
//! - Caption enhancement for placeholder descriptions

pub mod annotation;
pub mod chunker;
pub mod config;
pub mod enhancer;
pub mod error;
pub mod generator;
pub mod grouping;
pub mod metrics;
pub mod selector;

pub use annotation::{parse_annotation_dir, parse_annotation_text, source_id_from_path};
pub use chunker::{chunk_events, render_chunks_for_prompt, DEFAULT_CHUNK_WIDTH_SECS};
pub use config::SelectionConfig;
pub use enhancer::{enhance_descriptions, EnhanceSummary};
pub use error::{IntervalError, IntervalResult};
pub use generator::{GeneratedPlan, NarrativeIntervalGenerator};
pub use grouping::{group_by_source, source_duration, SourceGroups};
pub use selector::{
    accept_oracle_candidates, fallback_intervals, select_intervals, Selection, SelectionReport,
    SourceReport,
};
