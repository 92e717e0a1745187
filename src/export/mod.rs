//! Export planning: timeline duration, segment layout, captions and camera motion.

pub mod duration;
pub mod ken_burns;
pub mod plan;
pub mod srt;
pub mod timeline;

pub use duration::{compute_duration, export_duration, ExportError, ExportOptions, ExportResult};
pub use plan::{output_file_name, ExportJob, ExportPlan, ExportSettings};
pub use timeline::{build_timeline, SectionExportSpec, TimelinePlan};
