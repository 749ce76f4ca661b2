//! Alistamiento Common Library
//!
//! 整備（alistamiento）進捗管理の中核ロジック。CLIから利用される純粋関数群。

pub mod types;
pub mod error;
pub mod value;
pub mod field_mapping;
pub mod progress;
pub mod date;
pub mod collate;
pub mod filter;
pub mod stats;
pub mod draft;

pub use types::{Fields, Record};
pub use error::{Error, Result};
pub use field_mapping::{denormalize, get_field_value, names, normalize};
pub use progress::{calculate_progress, display_progress, overall_progress, parse_percentage};
pub use filter::{
    apply_filters, apply_filters_except, cascaded_options, search_by_serial, CascadedOptions,
    FilterDimension, FilterState, ProgressBucket,
};
pub use stats::{
    expiring_soon, group_by_count, phase_completion_rates, priority_groups, sort_by_progress,
    status_counts, summarize, top_models, DashboardSummary, GroupCount, GroupDimension, PhaseRate,
    StatusCounts,
};
pub use draft::RecordDraft;
