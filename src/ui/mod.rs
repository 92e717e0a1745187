//! Terminal screens.

pub mod section;

pub use section::{SectionCommand, SectionTui, SectionView};
