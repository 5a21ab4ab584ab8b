//! PanelBreak core: panel data containers and variable preparation
//!
//! `data` holds the `DataFrame`/`Series` containers, `panel` validates the
//! (entity, time) key of a panel, and `prepare` builds model-ready columns.

pub mod data;
pub mod panel;
pub mod prepare;

pub use data::{DataError, DataFrame, Series};
pub use panel::PanelIndex;
