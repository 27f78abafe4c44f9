use ndarray::{concatenate, Array2, Axis};
use std::collections::BTreeSet;

use crate::recording::RecordingSource;
use crate::sorting::SortingSource;
use crate::types::{EpochStore, PropertyStore, Result, SourceError};

enum Layout {
    /// Parents laid end to end along the frame axis; `offsets[i]` is the
    /// global frame at which parent `i` begins.
    TimeConcat {
        offsets: Vec<usize>,
        total_frames: usize,
    },
    /// Parents stacked along the channel axis; logical channel `i` maps to
    /// `channel_map[i] = (parent index, parent channel id)`.
    ChannelStack {
        channel_map: Vec<(usize, usize)>,
        frames: usize,
    },
}

/// A single logical recording composed from several parent recordings.
///
/// Two compositions are supported: [`concatenated`](MultiRecording::concatenated)
/// joins parents along the frame axis, [`stacked`](MultiRecording::stacked)
/// joins them along the channel axis. Only index-translation metadata is
/// held; reads are delegated to the parents.
pub struct MultiRecording<'a> {
    parents: Vec<&'a dyn RecordingSource>,
    layout: Layout,
    epochs: EpochStore,
}

impl<'a> MultiRecording<'a> {
    /// Joins parents end to end along the frame axis.
    ///
    /// All parents must share the same sampling frequency and the same
    /// ordered channel id set; the combined recording keeps those ids and
    /// its frame count is the sum of the parents'. Fails with
    /// `InvalidArgument` on an empty parent list or any mismatch.
    pub fn concatenated(parents: Vec<&'a dyn RecordingSource>) -> Result<Self> {
        let first = Self::check_common_frequency(&parents)?;
        let channel_ids = first.channel_ids();
        let mut offsets = Vec::with_capacity(parents.len());
        let mut total_frames = 0;
        for parent in &parents {
            if parent.channel_ids() != channel_ids {
                return Err(SourceError::InvalidArgument(
                    "all parents of a concatenated recording must expose the same channel ids"
                        .to_string(),
                ));
            }
            offsets.push(total_frames);
            total_frames += parent.num_frames();
        }
        Ok(MultiRecording {
            parents,
            layout: Layout::TimeConcat {
                offsets,
                total_frames,
            },
            epochs: EpochStore::new(),
        })
    }

    /// Stacks parents along the channel axis.
    ///
    /// All parents must share the same sampling frequency and frame count.
    /// Channels are renumbered `0..total` in parent order, since ids from
    /// different parents may collide. Fails with `InvalidArgument` on an
    /// empty parent list or any mismatch.
    pub fn stacked(parents: Vec<&'a dyn RecordingSource>) -> Result<Self> {
        let first = Self::check_common_frequency(&parents)?;
        let frames = first.num_frames();
        let mut channel_map = Vec::new();
        for (parent_idx, parent) in parents.iter().enumerate() {
            if parent.num_frames() != frames {
                return Err(SourceError::InvalidArgument(format!(
                    "parent {} has {} frames where {} were expected",
                    parent_idx,
                    parent.num_frames(),
                    frames
                )));
            }
            for id in parent.channel_ids() {
                channel_map.push((parent_idx, id));
            }
        }
        Ok(MultiRecording {
            parents,
            layout: Layout::ChannelStack {
                channel_map,
                frames,
            },
            epochs: EpochStore::new(),
        })
    }

    fn check_common_frequency(
        parents: &[&'a dyn RecordingSource],
    ) -> Result<&'a dyn RecordingSource> {
        let first = *parents.first().ok_or_else(|| {
            SourceError::InvalidArgument(
                "a multi recording needs at least one parent".to_string(),
            )
        })?;
        for parent in parents {
            if parent.sampling_frequency() != first.sampling_frequency() {
                return Err(SourceError::InvalidArgument(format!(
                    "inconsistent sampling frequencies: {} Hz vs {} Hz",
                    parent.sampling_frequency(),
                    first.sampling_frequency()
                )));
            }
        }
        Ok(first)
    }
}

impl RecordingSource for MultiRecording<'_> {
    fn num_channels(&self) -> usize {
        match &self.layout {
            Layout::TimeConcat { .. } => self.parents[0].num_channels(),
            Layout::ChannelStack { channel_map, .. } => channel_map.len(),
        }
    }

    fn num_frames(&self) -> usize {
        match &self.layout {
            Layout::TimeConcat { total_frames, .. } => *total_frames,
            Layout::ChannelStack { frames, .. } => *frames,
        }
    }

    fn sampling_frequency(&self) -> f64 {
        self.parents[0].sampling_frequency()
    }

    fn channel_ids(&self) -> Vec<usize> {
        match &self.layout {
            Layout::TimeConcat { .. } => self.parents[0].channel_ids(),
            Layout::ChannelStack { channel_map, .. } => (0..channel_map.len()).collect(),
        }
    }

    fn read_traces(
        &self,
        start_frame: usize,
        end_frame: usize,
        channel_ids: &[usize],
    ) -> Result<Array2<f64>> {
        if start_frame == end_frame {
            return Ok(Array2::zeros((channel_ids.len(), 0)));
        }
        match &self.layout {
            Layout::TimeConcat { offsets, .. } => {
                let mut pieces = Vec::new();
                for (idx, parent) in self.parents.iter().enumerate() {
                    let seg_start = offsets[idx];
                    let seg_end = seg_start + parent.num_frames();
                    if seg_end <= start_frame || seg_start >= end_frame {
                        continue;
                    }
                    let local_start = start_frame.max(seg_start) - seg_start;
                    let local_end = end_frame.min(seg_end) - seg_start;
                    pieces.push(parent.traces(
                        Some(local_start),
                        Some(local_end),
                        Some(channel_ids),
                    )?);
                }
                let views: Vec<_> = pieces.iter().map(|p| p.view()).collect();
                concatenate(Axis(1), &views)
                    .map_err(|err| SourceError::InvalidArgument(err.to_string()))
            }
            Layout::ChannelStack { channel_map, .. } => {
                let mut out = Array2::zeros((channel_ids.len(), end_frame - start_frame));
                for (row, &id) in channel_ids.iter().enumerate() {
                    let (parent_idx, parent_channel) = channel_map[id];
                    let trace = self.parents[parent_idx].traces(
                        Some(start_frame),
                        Some(end_frame),
                        Some(&[parent_channel]),
                    )?;
                    out.row_mut(row).assign(&trace.row(0));
                }
                Ok(out)
            }
        }
    }

    fn channel_info(&self, channel_id: usize) -> Result<crate::types::ChannelInfo> {
        match &self.layout {
            Layout::TimeConcat { .. } => self.parents[0].channel_info(channel_id),
            Layout::ChannelStack { channel_map, .. } => {
                let (parent_idx, parent_channel) =
                    *channel_map.get(channel_id).ok_or_else(|| {
                        SourceError::InvalidRange(format!(
                            "channel id {} is not present in this recording",
                            channel_id
                        ))
                    })?;
                self.parents[parent_idx].channel_info(parent_channel)
            }
        }
    }

    fn epoch_store(&self) -> &EpochStore {
        &self.epochs
    }

    fn epoch_store_mut(&mut self) -> &mut EpochStore {
        &mut self.epochs
    }
}

/// A single logical sorting composed from several parent sortings laid end
/// to end in time.
///
/// Each parent is paired with the global frame at which its recording
/// segment begins; a unit's combined train is the ascending merge of every
/// parent train shifted by its segment offset. The unit id space is the
/// union of the parents'.
pub struct MultiSorting<'a> {
    parents: Vec<&'a dyn SortingSource>,
    frame_offsets: Vec<usize>,
    properties: PropertyStore,
}

impl<'a> MultiSorting<'a> {
    /// Joins parents in time, shifting parent `i` by `frame_offsets[i]`.
    ///
    /// Fails with `InvalidArgument` on an empty parent list or when the
    /// offset count does not match the parent count.
    pub fn concatenated(
        parents: Vec<&'a dyn SortingSource>,
        frame_offsets: &[usize],
    ) -> Result<Self> {
        if parents.is_empty() {
            return Err(SourceError::InvalidArgument(
                "a multi sorting needs at least one parent".to_string(),
            ));
        }
        if frame_offsets.len() != parents.len() {
            return Err(SourceError::InvalidArgument(format!(
                "{} frame offsets given for {} parents",
                frame_offsets.len(),
                parents.len()
            )));
        }
        Ok(MultiSorting {
            parents,
            frame_offsets: frame_offsets.to_vec(),
            properties: PropertyStore::new(),
        })
    }
}

impl SortingSource for MultiSorting<'_> {
    fn unit_ids(&self) -> Vec<usize> {
        let mut ids = BTreeSet::new();
        for parent in &self.parents {
            ids.extend(parent.unit_ids());
        }
        ids.into_iter().collect()
    }

    fn full_spike_train(&self, unit_id: usize) -> Result<Vec<usize>> {
        let mut merged = Vec::new();
        let mut found = false;
        for (parent, &offset) in self.parents.iter().zip(&self.frame_offsets) {
            if !parent.unit_ids().contains(&unit_id) {
                continue;
            }
            found = true;
            let train = parent.spike_train(unit_id, None, None)?;
            merged.extend(train.into_iter().map(|frame| frame + offset));
        }
        if !found {
            return Err(SourceError::NotFound(format!(
                "unit id {} is not present in any parent sorting",
                unit_id
            )));
        }
        merged.sort_unstable();
        Ok(merged)
    }

    fn property_store(&self) -> &PropertyStore {
        &self.properties
    }

    fn property_store_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }
}
