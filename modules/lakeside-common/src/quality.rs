use serde::Serialize;

use crate::types::{non_empty, Record};

/// A record is verified when it names a source and the date it was last checked.
/// Derived on every call, never stored.
pub fn is_verified(record: &Record) -> bool {
    non_empty(record.source.as_deref()).is_some()
        && non_empty(record.last_verified.as_deref()).is_some()
}

/// Verified share of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub total: usize,
    pub verified: usize,
    /// Rounded percentage, 0 for an empty collection.
    pub pct: u32,
}

pub fn compute_coverage<'a, I>(records: I) -> Coverage
where
    I: IntoIterator<Item = &'a Record>,
{
    let (total, verified) = records
        .into_iter()
        .fold((0usize, 0usize), |(total, verified), r| {
            (total + 1, verified + usize::from(is_verified(r)))
        });

    let pct = if total == 0 {
        0
    } else {
        (100.0 * verified as f64 / total as f64).round() as u32
    };

    Coverage {
        total,
        verified,
        pct,
    }
}

/// Unverified records split by whether someone already found a candidate link.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Backlog<'a> {
    pub with_candidate: Vec<&'a Record>,
    pub without_candidate: Vec<&'a Record>,
}

impl<'a> Backlog<'a> {
    pub fn len(&self) -> usize {
        self.with_candidate.len() + self.without_candidate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Curation order: records with a candidate first, each group in input order.
    pub fn entries(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.with_candidate
            .iter()
            .chain(self.without_candidate.iter())
            .copied()
    }
}

pub fn compute_backlog<'a, I>(records: I) -> Backlog<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    let (with_candidate, without_candidate): (Vec<&Record>, Vec<&Record>) = records
        .into_iter()
        .filter(|r| !is_verified(r))
        .partition(|r| r.candidate().is_some());

    Backlog {
        with_candidate,
        without_candidate,
    }
}
