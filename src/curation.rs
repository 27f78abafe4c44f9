use crate::sorting::SortingSource;
use crate::types::{PropertyStore, Result, SourceError};

/// A visible unit of a curated sorting: either a passthrough of one parent
/// unit or a synthesized unit standing for several merged parent units.
struct CuratedUnit {
    id: usize,
    members: Vec<usize>,
}

/// A sorting view supporting unit exclusion and merging without mutating
/// the parent.
///
/// Excluded units disappear from `unit_ids`; merged units are replaced by a
/// synthesized unit whose train is the ascending merge of the constituents'
/// trains. Synthesized ids are assigned above the parent's largest id so
/// they never collide. All curation state lives in the view; the parent is
/// only read.
pub struct CuratedSorting<'a> {
    parent: &'a dyn SortingSource,
    units: Vec<CuratedUnit>,
    properties: PropertyStore,
    next_id: usize,
}

impl<'a> CuratedSorting<'a> {
    /// Starts a curation session exposing every parent unit unchanged.
    pub fn new(parent: &'a dyn SortingSource) -> Self {
        let units: Vec<CuratedUnit> = parent
            .unit_ids()
            .into_iter()
            .map(|id| CuratedUnit {
                id,
                members: vec![id],
            })
            .collect();
        let next_id = units.iter().map(|u| u.id + 1).max().unwrap_or(0);
        CuratedSorting {
            parent,
            units,
            properties: PropertyStore::new(),
            next_id,
        }
    }

    fn position_of(&self, unit_id: usize) -> Result<usize> {
        self.units
            .iter()
            .position(|u| u.id == unit_id)
            .ok_or_else(|| {
                SourceError::NotFound(format!(
                    "unit id {} is not present in this curation",
                    unit_id
                ))
            })
    }

    /// Hides a unit from the curated view.
    ///
    /// Fails with `NotFound` when the unit is not currently visible
    /// (never existed, already excluded, or consumed by a merge).
    pub fn exclude_unit(&mut self, unit_id: usize) -> Result<()> {
        let pos = self.position_of(unit_id)?;
        self.units.remove(pos);
        Ok(())
    }

    /// Replaces two visible units with one synthesized unit and returns its
    /// id.
    ///
    /// The synthesized train is the ascending merge of both units' trains;
    /// merging a unit that is itself synthesized folds its constituents in.
    /// Fails with `InvalidArgument` when both arguments name the same unit
    /// and `NotFound` when either is not visible.
    pub fn merge_units(&mut self, first: usize, second: usize) -> Result<usize> {
        if first == second {
            return Err(SourceError::InvalidArgument(format!(
                "cannot merge unit {} with itself",
                first
            )));
        }
        let first_pos = self.position_of(first)?;
        let second_pos = self.position_of(second)?;
        let mut members = self.units[first_pos].members.clone();
        members.extend(self.units[second_pos].members.iter().copied());
        // remove the higher index first so the lower one stays valid
        let (hi, lo) = if first_pos > second_pos {
            (first_pos, second_pos)
        } else {
            (second_pos, first_pos)
        };
        self.units.remove(hi);
        self.units.remove(lo);
        let id = self.next_id;
        self.next_id += 1;
        self.units.push(CuratedUnit { id, members });
        Ok(id)
    }
}

impl SortingSource for CuratedSorting<'_> {
    fn unit_ids(&self) -> Vec<usize> {
        self.units.iter().map(|u| u.id).collect()
    }

    fn full_spike_train(&self, unit_id: usize) -> Result<Vec<usize>> {
        let pos = self.position_of(unit_id)?;
        let members = &self.units[pos].members;
        if members.len() == 1 {
            return self.parent.spike_train(members[0], None, None);
        }
        let mut merged = Vec::new();
        for &member in members {
            merged.extend(self.parent.spike_train(member, None, None)?);
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
