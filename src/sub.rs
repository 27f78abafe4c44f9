use ndarray::Array2;

use crate::recording::RecordingSource;
use crate::sorting::SortingSource;
use crate::types::{EpochStore, PropertyStore, PropertyValue, Result, SourceError};

/// A recording view restricted to a channel subset and/or frame window of a
/// parent source.
///
/// The view holds a non-owning reference to its parent and translates every
/// read by the window offset; no sample data is copied. Selected channels
/// keep their parent ids. Frame 0 of the view is the window start, so epochs
/// added to the view are expressed in view coordinates.
pub struct SubRecording<'a> {
    parent: &'a dyn RecordingSource,
    channel_ids: Vec<usize>,
    start_frame: usize,
    end_frame: usize,
    epochs: EpochStore,
}

impl<'a> SubRecording<'a> {
    /// Creates a view over `parent`.
    ///
    /// Missing arguments default to all channels and the full frame range.
    /// Fails with `InvalidRange` when the window is inverted or extends past
    /// the parent, or when a selected channel id is not present in the
    /// parent.
    pub fn new(
        parent: &'a dyn RecordingSource,
        channel_ids: Option<&[usize]>,
        start_frame: Option<usize>,
        end_frame: Option<usize>,
    ) -> Result<Self> {
        let start = start_frame.unwrap_or(0);
        let end = end_frame.unwrap_or_else(|| parent.num_frames());
        if start > end {
            return Err(SourceError::InvalidRange(format!(
                "start frame {} is after end frame {}",
                start, end
            )));
        }
        if end > parent.num_frames() {
            return Err(SourceError::InvalidRange(format!(
                "end frame {} exceeds parent recording length {}",
                end,
                parent.num_frames()
            )));
        }
        let parent_ids = parent.channel_ids();
        let channel_ids = match channel_ids {
            Some(selected) => {
                for id in selected {
                    if !parent_ids.contains(id) {
                        return Err(SourceError::InvalidRange(format!(
                            "channel id {} is not present in the parent recording",
                            id
                        )));
                    }
                }
                selected.to_vec()
            }
            None => parent_ids,
        };
        Ok(SubRecording {
            parent,
            channel_ids,
            start_frame: start,
            end_frame: end,
            epochs: EpochStore::new(),
        })
    }
}

impl RecordingSource for SubRecording<'_> {
    fn num_channels(&self) -> usize {
        self.channel_ids.len()
    }

    fn num_frames(&self) -> usize {
        self.end_frame - self.start_frame
    }

    fn sampling_frequency(&self) -> f64 {
        self.parent.sampling_frequency()
    }

    fn channel_ids(&self) -> Vec<usize> {
        self.channel_ids.clone()
    }

    fn read_traces(
        &self,
        start_frame: usize,
        end_frame: usize,
        channel_ids: &[usize],
    ) -> Result<Array2<f64>> {
        self.parent.traces(
            Some(self.start_frame + start_frame),
            Some(self.start_frame + end_frame),
            Some(channel_ids),
        )
    }

    fn channel_info(&self, channel_id: usize) -> Result<crate::types::ChannelInfo> {
        if !self.channel_ids.contains(&channel_id) {
            return Err(SourceError::InvalidRange(format!(
                "channel id {} is not present in this view",
                channel_id
            )));
        }
        self.parent.channel_info(channel_id)
    }

    fn epoch_store(&self) -> &EpochStore {
        &self.epochs
    }

    fn epoch_store_mut(&mut self) -> &mut EpochStore {
        &mut self.epochs
    }
}

/// A sorting view restricted to a unit subset and/or frame window of a
/// parent source.
///
/// Spike trains are filtered to the window and shifted so that view frame 0
/// coincides with the window start, matching how [`SubRecording`] remaps its
/// frame axis. The view keeps its own property store; parent properties are
/// not copied.
pub struct SubSorting<'a> {
    parent: &'a dyn SortingSource,
    unit_ids: Vec<usize>,
    start_frame: usize,
    end_frame: Option<usize>,
    properties: PropertyStore,
}

impl<'a> SubSorting<'a> {
    /// Creates a view over `parent`.
    ///
    /// Missing arguments default to all units and an unbounded frame window
    /// starting at 0. Fails with `InvalidRange` for an inverted window and
    /// `InvalidArgument` when a selected unit id is not present in the
    /// parent.
    pub fn new(
        parent: &'a dyn SortingSource,
        unit_ids: Option<&[usize]>,
        start_frame: Option<usize>,
        end_frame: Option<usize>,
    ) -> Result<Self> {
        let start = start_frame.unwrap_or(0);
        if let Some(end) = end_frame {
            if start > end {
                return Err(SourceError::InvalidRange(format!(
                    "start frame {} is after end frame {}",
                    start, end
                )));
            }
        }
        let parent_ids = parent.unit_ids();
        let unit_ids = match unit_ids {
            Some(selected) => {
                for id in selected {
                    if !parent_ids.contains(id) {
                        return Err(SourceError::InvalidArgument(format!(
                            "unit id {} is not present in the parent sorting",
                            id
                        )));
                    }
                }
                selected.to_vec()
            }
            None => parent_ids,
        };
        Ok(SubSorting {
            parent,
            unit_ids,
            start_frame: start,
            end_frame,
            properties: PropertyStore::new(),
        })
    }
}

impl SortingSource for SubSorting<'_> {
    fn unit_ids(&self) -> Vec<usize> {
        self.unit_ids.clone()
    }

    fn full_spike_train(&self, unit_id: usize) -> Result<Vec<usize>> {
        if !self.unit_ids.contains(&unit_id) {
            return Err(SourceError::NotFound(format!(
                "unit id {} is not present in this view",
                unit_id
            )));
        }
        let train = self
            .parent
            .spike_train(unit_id, Some(self.start_frame), self.end_frame)?;
        Ok(train
            .into_iter()
            .map(|frame| frame - self.start_frame)
            .collect())
    }

    fn property_store(&self) -> &PropertyStore {
        &self.properties
    }

    fn property_store_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }
}

/// Partitions a sorting into views grouped by equal values of a unit
/// property.
///
/// Units missing the property are skipped. Groups are returned in order of
/// first appearance in the parent's `unit_ids`. Fails with `InvalidArgument`
/// for an empty property name.
pub fn split_by_property<'a>(
    parent: &'a dyn SortingSource,
    property_name: &str,
) -> Result<Vec<SubSorting<'a>>> {
    if property_name.is_empty() {
        return Err(SourceError::InvalidArgument(
            "property name must be a non-empty string".to_string(),
        ));
    }
    let mut groups: Vec<(PropertyValue, Vec<usize>)> = Vec::new();
    for unit_id in parent.unit_ids() {
        let value = match parent.unit_property(unit_id, property_name) {
            Ok(value) => value,
            Err(SourceError::NotFound(_)) => continue,
            Err(err) => return Err(err),
        };
        match groups.iter_mut().find(|(v, _)| *v == value) {
            Some((_, units)) => units.push(unit_id),
            None => groups.push((value, vec![unit_id])),
        }
    }
    groups
        .into_iter()
        .map(|(_, units)| SubSorting::new(parent, Some(&units), None, None))
        .collect()
}
