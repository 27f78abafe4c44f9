use ndarray::{s, Array2, Axis};
use std::collections::HashMap;
use std::path::Path;

use crate::sub::SubRecording;
use crate::types::{ChannelInfo, Epoch, EpochStore, Result, SourceError};

/// The read contract for continuous multi-channel sampled data.
///
/// A recording is a set of channels, each producing one voltage sample per
/// frame at a fixed sampling frequency. Concrete sources implement the
/// required primitives (`num_channels`, `num_frames`, `sampling_frequency`,
/// `read_traces` and the epoch store accessors); everything else comes for
/// free as default methods built on top of those.
///
/// Frame intervals are always half-open: `start_frame` inclusive,
/// `end_frame` exclusive.
pub trait RecordingSource {
    /// Number of channels in the recording.
    fn num_channels(&self) -> usize;

    /// Number of frames in the recording (duration in samples).
    fn num_frames(&self) -> usize;

    /// Sampling frequency in Hz. Always positive.
    fn sampling_frequency(&self) -> f64;

    /// Extracts traces for the given channels over `[start_frame, end_frame)`.
    ///
    /// This is the raw primitive behind [`traces`](Self::traces): arguments
    /// arriving here have already been validated, so implementations may
    /// assume `start_frame <= end_frame <= num_frames()` and that every id in
    /// `channel_ids` is present in the source. Call `traces` instead unless
    /// you are implementing a source.
    fn read_traces(
        &self,
        start_frame: usize,
        end_frame: usize,
        channel_ids: &[usize],
    ) -> Result<Array2<f64>>;

    /// Shared access to this source's epoch bookkeeping.
    fn epoch_store(&self) -> &EpochStore;

    /// Mutable access to this source's epoch bookkeeping.
    fn epoch_store_mut(&mut self) -> &mut EpochStore;

    /// The ordered channel ids of this source.
    ///
    /// Ids are an explicit ordered set of integers and need not be
    /// contiguous. The default covers sources whose channels are simply
    /// numbered `0..num_channels`.
    fn channel_ids(&self) -> Vec<usize> {
        (0..self.num_channels()).collect()
    }

    /// Extracts and returns a trace window from the recorded data.
    ///
    /// Missing bounds default to the full recording (`start_frame` to 0,
    /// `end_frame` to `num_frames`); missing `channel_ids` default to every
    /// channel in source order. The result has one row per requested channel
    /// and `end_frame - start_frame` columns.
    ///
    /// Fails with `InvalidRange` when `start_frame > end_frame`, when either
    /// bound lies outside `[0, num_frames]`, or when a requested channel id
    /// is not present in the source.
    fn traces(
        &self,
        start_frame: Option<usize>,
        end_frame: Option<usize>,
        channel_ids: Option<&[usize]>,
    ) -> Result<Array2<f64>> {
        let start = start_frame.unwrap_or(0);
        let end = end_frame.unwrap_or_else(|| self.num_frames());
        if start > end {
            return Err(SourceError::InvalidRange(format!(
                "start frame {} is after end frame {}",
                start, end
            )));
        }
        if end > self.num_frames() {
            return Err(SourceError::InvalidRange(format!(
                "end frame {} exceeds recording length {}",
                end,
                self.num_frames()
            )));
        }
        let ids = match channel_ids {
            Some(ids) => {
                let known = self.channel_ids();
                for id in ids {
                    if !known.contains(id) {
                        return Err(SourceError::InvalidRange(format!(
                            "channel id {} is not present in this recording",
                            id
                        )));
                    }
                }
                ids.to_vec()
            }
            None => self.channel_ids(),
        };
        self.read_traces(start, end, &ids)
    }

    /// Converts a frame index to a time in seconds.
    fn frame_to_time(&self, frame: f64) -> f64 {
        frame / self.sampling_frequency()
    }

    /// Converts a time in seconds to a frame index. No rounding is applied.
    fn time_to_frame(&self, time: f64) -> f64 {
        time * self.sampling_frequency()
    }

    /// Extracts fixed-length snippets around each of the given start frames.
    ///
    /// Each snippet covers `[s - len_before, s + len_after)` and has one row
    /// per requested channel. The window is clipped independently against
    /// each recording boundary and the clipped margins are zero-filled, so a
    /// window straddling the start of the recording comes back with leading
    /// zero columns. A start frame at or past `num_frames` produces an
    /// all-zero snippet; out-of-bounds start frames are never an error.
    fn snippets(
        &self,
        len_before: usize,
        len_after: usize,
        start_frames: &[i64],
        channel_ids: Option<&[usize]>,
    ) -> Result<Vec<Array2<f64>>> {
        let ids = match channel_ids {
            Some(ids) => ids.to_vec(),
            None => self.channel_ids(),
        };
        let num_frames = self.num_frames() as i64;
        let snippet_len = len_before + len_after;
        let mut snippets = Vec::with_capacity(start_frames.len());
        for &start in start_frames {
            let mut chunk = Array2::<f64>::zeros((ids.len(), snippet_len));
            if start < num_frames {
                let window_start = start - len_before as i64;
                let window_end = start + len_after as i64;
                let data_start = window_start.max(0);
                let data_end = window_end.min(num_frames);
                if data_start < data_end {
                    let dst = (data_start - window_start) as usize;
                    let width = (data_end - data_start) as usize;
                    let filled = self.traces(
                        Some(data_start as usize),
                        Some(data_end as usize),
                        Some(&ids),
                    )?;
                    chunk.slice_mut(s![.., dst..dst + width]).assign(&filled);
                }
            }
            snippets.push(chunk);
        }
        Ok(snippets)
    }

    /// Returns group, position and kind information for a channel.
    ///
    /// Sources that do not know their probe layout report `Unsupported`.
    fn channel_info(&self, channel_id: usize) -> Result<ChannelInfo> {
        Err(SourceError::Unsupported(format!(
            "channel info is not available for this recording (channel {})",
            channel_id
        )))
    }

    /// Adds a named epoch covering `[start_frame, end_frame)`, overwriting
    /// any epoch of the same name.
    fn add_epoch(&mut self, name: &str, start_frame: usize, end_frame: usize) -> Result<()> {
        if name.is_empty() {
            return Err(SourceError::InvalidArgument(
                "epoch name must be a non-empty string".to_string(),
            ));
        }
        if end_frame < start_frame {
            return Err(SourceError::InvalidRange(format!(
                "epoch '{}' ends at frame {} before it starts at frame {}",
                name, end_frame, start_frame
            )));
        }
        self.epoch_store_mut().insert(
            name,
            Epoch {
                start_frame,
                end_frame,
            },
        );
        Ok(())
    }

    /// Removes a named epoch. Fails with `NotFound` if it was never added.
    fn remove_epoch(&mut self, name: &str) -> Result<()> {
        match self.epoch_store_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(SourceError::NotFound(format!(
                "epoch '{}' has not been added",
                name
            ))),
        }
    }

    /// Epoch names sorted by ascending start frame. Epochs sharing a start
    /// frame keep their insertion order.
    fn epoch_names(&self) -> Vec<String> {
        self.epoch_store().sorted_names()
    }

    /// Start and end frame of a named epoch.
    fn epoch_info(&self, name: &str) -> Result<Epoch> {
        self.epoch_store().get(name).ok_or_else(|| {
            SourceError::NotFound(format!("epoch '{}' has not been added", name))
        })
    }

    /// A view of this recording windowed to the named epoch's frame range.
    fn epoch(&self, name: &str) -> Result<SubRecording<'_>>
    where
        Self: Sized,
    {
        let info = self.epoch_info(name)?;
        SubRecording::new(self, None, Some(info.start_frame), Some(info.end_frame))
    }

    /// Serializes another recording into this source's on-disk format.
    ///
    /// The base contract has no format, so this always reports
    /// `Unsupported`; format adapters override it to provide conversion.
    fn write_recording(_recording: &dyn RecordingSource, _path: &Path) -> Result<()>
    where
        Self: Sized,
    {
        Err(SourceError::Unsupported(
            "writing recordings is not implemented for this source".to_string(),
        ))
    }
}

/// An in-memory recording backed by a 2D array.
///
/// Rows are channels, columns are frames. This is the reference
/// implementation of [`RecordingSource`] used by tests and as the natural
/// target when materializing traces from another source.
#[derive(Debug, Clone)]
pub struct ArrayRecording {
    data: Array2<f64>,
    sampling_frequency: f64,
    channel_ids: Vec<usize>,
    channel_info: HashMap<usize, ChannelInfo>,
    epochs: EpochStore,
}

impl ArrayRecording {
    /// Creates a recording from channel-major sample data.
    ///
    /// Channels are numbered `0..num_channels`. Fails with `InvalidArgument`
    /// when the sampling frequency is not positive.
    pub fn new(data: Array2<f64>, sampling_frequency: f64) -> Result<Self> {
        let channel_ids = (0..data.nrows()).collect();
        Self::with_channel_ids(data, sampling_frequency, channel_ids)
    }

    /// Creates a recording with explicit (possibly non-contiguous)
    /// channel ids, one per data row.
    pub fn with_channel_ids(
        data: Array2<f64>,
        sampling_frequency: f64,
        channel_ids: Vec<usize>,
    ) -> Result<Self> {
        if !(sampling_frequency > 0.0) {
            return Err(SourceError::InvalidArgument(format!(
                "sampling frequency must be positive, got {}",
                sampling_frequency
            )));
        }
        if channel_ids.len() != data.nrows() {
            return Err(SourceError::InvalidArgument(format!(
                "{} channel ids given for {} data rows",
                channel_ids.len(),
                data.nrows()
            )));
        }
        for (i, id) in channel_ids.iter().enumerate() {
            if channel_ids[..i].contains(id) {
                return Err(SourceError::InvalidArgument(format!(
                    "duplicate channel id {}",
                    id
                )));
            }
        }
        Ok(ArrayRecording {
            data,
            sampling_frequency,
            channel_ids,
            channel_info: HashMap::new(),
            epochs: EpochStore::new(),
        })
    }

    /// Attaches probe metadata to a channel.
    pub fn set_channel_info(&mut self, channel_id: usize, info: ChannelInfo) -> Result<()> {
        if !self.channel_ids.contains(&channel_id) {
            return Err(SourceError::InvalidArgument(format!(
                "channel id {} is not present in this recording",
                channel_id
            )));
        }
        self.channel_info.insert(channel_id, info);
        Ok(())
    }

    fn row_of(&self, channel_id: usize) -> Result<usize> {
        self.channel_ids
            .iter()
            .position(|&id| id == channel_id)
            .ok_or_else(|| {
                SourceError::InvalidRange(format!(
                    "channel id {} is not present in this recording",
                    channel_id
                ))
            })
    }
}

impl RecordingSource for ArrayRecording {
    fn num_channels(&self) -> usize {
        self.data.nrows()
    }

    fn num_frames(&self) -> usize {
        self.data.ncols()
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
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
        let mut rows = Vec::with_capacity(channel_ids.len());
        for &id in channel_ids {
            rows.push(self.row_of(id)?);
        }
        Ok(self
            .data
            .slice(s![.., start_frame..end_frame])
            .select(Axis(0), &rows))
    }

    fn channel_info(&self, channel_id: usize) -> Result<ChannelInfo> {
        self.channel_info.get(&channel_id).cloned().ok_or_else(|| {
            SourceError::Unsupported(format!(
                "channel info has not been set for channel {}",
                channel_id
            ))
        })
    }

    fn epoch_store(&self) -> &EpochStore {
        &self.epochs
    }

    fn epoch_store_mut(&mut self) -> &mut EpochStore {
        &mut self.epochs
    }
}
