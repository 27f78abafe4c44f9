use std::path::Path;

use crate::types::{PropertyStore, PropertyValue, Result, SourceError};

/// The read contract for spike sorted data.
///
/// A sorting holds one spike train per unit: the ordered frame indices at
/// which that putative neuron fired. Concrete sources implement `unit_ids`,
/// `full_spike_train` and the property store accessors; windowed access and
/// property bookkeeping are default methods.
pub trait SortingSource {
    /// Ids of the sorted units, in source order. Ids need not be contiguous.
    fn unit_ids(&self) -> Vec<usize>;

    /// The complete spike train of a unit, as ascending frame indices.
    ///
    /// Fails with `NotFound` when the unit id does not exist. Callers
    /// wanting a frame window should use [`spike_train`](Self::spike_train).
    fn full_spike_train(&self, unit_id: usize) -> Result<Vec<usize>>;

    /// Shared access to this source's per-unit property storage.
    fn property_store(&self) -> &PropertyStore;

    /// Mutable access to this source's per-unit property storage.
    fn property_store_mut(&mut self) -> &mut PropertyStore;

    /// Spike frames of a unit within `[start_frame, end_frame)`.
    ///
    /// Both bounds are optional and independent: a missing start means the
    /// beginning of the recording, a missing end means one past the unit's
    /// last spike. The returned frames are the exact subsequence of the full
    /// train falling inside the window, order preserved. Fails with
    /// `InvalidRange` when `start_frame > end_frame`.
    fn spike_train(
        &self,
        unit_id: usize,
        start_frame: Option<usize>,
        end_frame: Option<usize>,
    ) -> Result<Vec<usize>> {
        if let (Some(start), Some(end)) = (start_frame, end_frame) {
            if start > end {
                return Err(SourceError::InvalidRange(format!(
                    "start frame {} is after end frame {}",
                    start, end
                )));
            }
        }
        let train = self.full_spike_train(unit_id)?;
        let start = start_frame.unwrap_or(0);
        Ok(train
            .into_iter()
            .filter(|&frame| frame >= start && end_frame.map_or(true, |end| frame < end))
            .collect())
    }

    /// Attaches a named property value to a unit, overwriting any previous
    /// value under the same name.
    ///
    /// Fails with `InvalidArgument` when the unit id is not in
    /// [`unit_ids`](Self::unit_ids) or the name is empty.
    fn add_unit_property(
        &mut self,
        unit_id: usize,
        name: &str,
        value: PropertyValue,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(SourceError::InvalidArgument(
                "property name must be a non-empty string".to_string(),
            ));
        }
        if !self.unit_ids().contains(&unit_id) {
            return Err(SourceError::InvalidArgument(format!(
                "unit id {} is not present in this sorting",
                unit_id
            )));
        }
        self.property_store_mut().set(unit_id, name, value);
        Ok(())
    }

    /// Reads back a property value previously attached to a unit.
    ///
    /// Fails with `NotFound` when the unit has no recorded properties or the
    /// name was never set for it, and with `InvalidArgument` for an empty
    /// name.
    fn unit_property(&self, unit_id: usize, name: &str) -> Result<PropertyValue> {
        if name.is_empty() {
            return Err(SourceError::InvalidArgument(
                "property name must be a non-empty string".to_string(),
            ));
        }
        let store = self.property_store();
        if !store.has_unit(unit_id) {
            return Err(SourceError::NotFound(format!(
                "no properties have been recorded for unit {}",
                unit_id
            )));
        }
        store.get(unit_id, name).cloned().ok_or_else(|| {
            SourceError::NotFound(format!(
                "property '{}' has not been added to unit {}",
                name, unit_id
            ))
        })
    }

    /// Serializes another sorting into this source's on-disk format.
    ///
    /// The base contract has no format, so this always reports
    /// `Unsupported`; format adapters override it to provide conversion.
    fn write_sorting(_sorting: &dyn SortingSource, _path: &Path) -> Result<()>
    where
        Self: Sized,
    {
        Err(SourceError::Unsupported(
            "writing sortings is not implemented for this source".to_string(),
        ))
    }
}

/// An in-memory sorting backed by per-unit spike train vectors.
///
/// This is the reference implementation of [`SortingSource`], also the
/// natural target when materializing spike trains from another source.
#[derive(Debug, Clone, Default)]
pub struct ArraySorting {
    trains: Vec<(usize, Vec<usize>)>,
    properties: PropertyStore,
}

impl ArraySorting {
    /// Creates an empty sorting with no units.
    pub fn new() -> Self {
        ArraySorting::default()
    }

    /// Creates a sorting from `(unit_id, spike_train)` pairs.
    pub fn from_trains(trains: Vec<(usize, Vec<usize>)>) -> Result<Self> {
        let mut sorting = ArraySorting::new();
        for (unit_id, train) in trains {
            sorting.add_unit(unit_id, train)?;
        }
        Ok(sorting)
    }

    /// Adds a unit with its spike train.
    ///
    /// The train must be monotonically non-decreasing and the unit id must
    /// not already exist; either violation is an `InvalidArgument`.
    pub fn add_unit(&mut self, unit_id: usize, train: Vec<usize>) -> Result<()> {
        if self.trains.iter().any(|(id, _)| *id == unit_id) {
            return Err(SourceError::InvalidArgument(format!(
                "unit id {} already exists in this sorting",
                unit_id
            )));
        }
        if train.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(SourceError::InvalidArgument(format!(
                "spike train of unit {} is not in ascending frame order",
                unit_id
            )));
        }
        self.trains.push((unit_id, train));
        Ok(())
    }
}

impl SortingSource for ArraySorting {
    fn unit_ids(&self) -> Vec<usize> {
        self.trains.iter().map(|(id, _)| *id).collect()
    }

    fn full_spike_train(&self, unit_id: usize) -> Result<Vec<usize>> {
        self.trains
            .iter()
            .find(|(id, _)| *id == unit_id)
            .map(|(_, train)| train.clone())
            .ok_or_else(|| {
                SourceError::NotFound(format!(
                    "unit id {} is not present in this sorting",
                    unit_id
                ))
            })
    }

    fn property_store(&self) -> &PropertyStore {
        &self.properties
    }

    fn property_store_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }
}
