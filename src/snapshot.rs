//! Point-in-time readings keyed by source name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::source::{CpuStat, DiskStat, HostStat, MemoryStat, TemperatureStat};

/// One source's value. Serialized untagged: each key keeps its own shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Cpu(CpuStat),
    Disk(DiskStat),
    Host(HostStat),
    Memory(MemoryStat),
    Temperature(TemperatureStat),
}

impl From<CpuStat> for Reading {
    fn from(stat: CpuStat) -> Self {
        Self::Cpu(stat)
    }
}

impl From<DiskStat> for Reading {
    fn from(stat: DiskStat) -> Self {
        Self::Disk(stat)
    }
}

impl From<HostStat> for Reading {
    fn from(stat: HostStat) -> Self {
        Self::Host(stat)
    }
}

impl From<MemoryStat> for Reading {
    fn from(stat: MemoryStat) -> Self {
        Self::Memory(stat)
    }
}

impl From<TemperatureStat> for Reading {
    fn from(stat: TemperatureStat) -> Self {
        Self::Temperature(stat)
    }
}

/// Readings of every source that succeeded within the deadline.
///
/// A missing key means the source failed or timed out; there are no
/// placeholder values. An empty snapshot is valid and means "no data this
/// tick".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    readings: BTreeMap<String, Reading>,
}

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&Reading> {
        self.readings.get(name)
    }

    /// Source names present, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.readings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl From<BTreeMap<String, Reading>> for Snapshot {
    fn from(readings: BTreeMap<String, Reading>) -> Self {
        Self { readings }
    }
}
