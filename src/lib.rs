//! Uniform access to extracellular recordings and spike sorted data.
//!
//! Electrophysiology data comes in many vendor formats, but almost all of it
//! answers two questions: what voltage did each channel see at each frame
//! (a *recording*), and at which frames did each sorted unit fire (a
//! *sorting*). This crate fixes those two contracts as the traits
//! [`RecordingSource`] and [`SortingSource`], so analysis and conversion
//! code written against them works with any backing format.
//!
//! Implementing a source means providing a handful of primitives (trace
//! reads, frame counts, spike trains); windowed access, snippet extraction
//! with boundary zero-padding, epoch bookkeeping and per-unit properties
//! come for free as trait default methods. Derived views ([`SubRecording`],
//! [`MultiRecording`], [`SubSorting`], [`MultiSorting`], [`CuratedSorting`])
//! compose sources by holding references and translating indices; they never
//! copy sample data.
//!
//! # Examples
//!
//! ```
//! use ephys_sources::{ArrayRecording, RecordingSource};
//! use ndarray::array;
//!
//! let data = array![[0.0, 1.0, 2.0, 3.0], [10.0, 11.0, 12.0, 13.0]];
//! let mut rec = ArrayRecording::new(data, 20_000.0).unwrap();
//!
//! let window = rec.traces(Some(1), Some(3), None).unwrap();
//! assert_eq!(window.dim(), (2, 2));
//!
//! rec.add_epoch("stim", 0, 2).unwrap();
//! let stim = rec.epoch("stim").unwrap();
//! assert_eq!(stim.num_frames(), 2);
//! ```

mod curation;
mod multi;
mod recording;
mod sorting;
mod sub;
pub mod types;

// Re-export the public surface
pub use curation::CuratedSorting;
pub use multi::{MultiRecording, MultiSorting};
pub use recording::{ArrayRecording, RecordingSource};
pub use sorting::{ArraySorting, SortingSource};
pub use sub::{split_by_property, SubRecording, SubSorting};
pub use types::*;
