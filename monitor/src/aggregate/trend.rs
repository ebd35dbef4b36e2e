//! Operational-machine trend per factory

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::aggregate::FactoryAggregate;

pub const DEFAULT_TREND_CAPACITY: usize = 15;

/// Operational counts of every factory at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub at: DateTime<Utc>,
    /// `(factory name, operational machines)` in configuration order
    pub operational: Vec<(String, usize)>,
}

/// Bounded history of trend points
#[derive(Debug, Clone)]
pub struct TrendHistory {
    capacity: usize,
    points: VecDeque<TrendPoint>,
}

impl TrendHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            points: VecDeque::new(),
        }
    }

    /// Record the current aggregates
    ///
    /// Returns false when the counts equal the latest point and nothing was added.
    pub fn record(&mut self, aggregates: &[FactoryAggregate], at: DateTime<Utc>) -> bool {
        let operational: Vec<(String, usize)> = aggregates
            .iter()
            .map(|a| (a.factory.name.clone(), a.counts.operational))
            .collect();

        if self
            .points
            .back()
            .is_some_and(|last| last.operational == operational)
        {
            return false;
        }

        self.points.push_back(TrendPoint { at, operational });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        true
    }

    pub fn points(&self) -> Vec<TrendPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for TrendHistory {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_CAPACITY)
    }
}
