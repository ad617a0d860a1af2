//! Fixed-size per-category tables indexed by enum variant.

use std::marker::PhantomData;

use strum::{EnumCount, IntoEnumIterator};

use crate::{Building, Technology, Unit};

/// A closed category enum whose variants index a fixed-size table.
pub trait TrackedCategory: Copy + IntoEnumIterator + EnumCount {
    fn index(self) -> usize;
}

impl TrackedCategory for Unit {
    fn index(self) -> usize {
        self as usize
    }
}

impl TrackedCategory for Building {
    fn index(self) -> usize {
        self as usize
    }
}

impl TrackedCategory for Technology {
    fn index(self) -> usize {
        self as usize
    }
}

pub type UnitCounts = CountTable<Unit, { <Unit as EnumCount>::COUNT }>;
pub type BuildingCounts = CountTable<Building, { <Building as EnumCount>::COUNT }>;
pub type TechnologyTimes = TimeTable<Technology, { <Technology as EnumCount>::COUNT }>;

/// Cumulative counter per category. Counts only ever go up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable<C, const N: usize> {
    counts: [u32; N],
    _category: PhantomData<C>,
}

impl<C: TrackedCategory, const N: usize> Default for CountTable<C, N> {
    fn default() -> Self {
        debug_assert_eq!(N, C::COUNT, "table size must match the category count");
        Self {
            counts: [0; N],
            _category: PhantomData,
        }
    }
}

impl<C: TrackedCategory, const N: usize> CountTable<C, N> {
    pub fn increment(&mut self, category: C) {
        self.counts[category.index()] += 1;
    }

    pub fn get(&self, category: C) -> u32 {
        self.counts[category.index()]
    }

    /// Sum over the categories selected by `filter`.
    pub fn total_where(&self, filter: impl Fn(C) -> bool) -> u32 {
        C::iter()
            .filter(|category| filter(*category))
            .map(|category| self.get(category))
            .sum()
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Every category with its count, including zeros, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (C, u32)> + '_ {
        C::iter().map(|category| (category, self.get(category)))
    }
}

/// Optional timestamp (seconds) per category; last write wins.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTable<C, const N: usize> {
    times: [Option<f64>; N],
    _category: PhantomData<C>,
}

impl<C: TrackedCategory, const N: usize> Default for TimeTable<C, N> {
    fn default() -> Self {
        debug_assert_eq!(N, C::COUNT, "table size must match the category count");
        Self {
            times: [None; N],
            _category: PhantomData,
        }
    }
}

impl<C: TrackedCategory, const N: usize> TimeTable<C, N> {
    pub fn set(&mut self, category: C, elapsed_seconds: f64) {
        self.times[category.index()] = Some(elapsed_seconds);
    }

    pub fn get(&self, category: C) -> Option<f64> {
        self.times[category.index()]
    }

    /// Categories that have a timestamp, in declaration order.
    pub fn recorded(&self) -> impl Iterator<Item = (C, f64)> + '_ {
        C::iter().filter_map(|category| self.get(category).map(|time| (category, time)))
    }
}
