//! Field-by-field comparison of desired configuration against live settings.
//!
//! Each comparable type lists its fields explicitly through [`Diffable`],
//! flagging the free-text ones that compare with whitespace removed. Report
//! entries show the values after normalization, so a whitespace-only
//! difference never appears and a reported JQL value may read differently
//! from what the server stores.

use std::fmt;

/// Value of one compared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    fn normalized(self) -> Self {
        match self {
            Self::Text(s) => Self::Text(s.chars().filter(|c| !c.is_whitespace()).collect()),
            other => other,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// One comparable field of `T`.
pub struct FieldSpec<T> {
    /// Wire name of the field, used as its path in reports.
    pub path: &'static str,
    /// Compare with all whitespace removed from both sides.
    pub ignore_whitespace: bool,
    pub get: fn(&T) -> FieldValue,
}

/// A configuration record with an explicit comparison table.
pub trait Diffable: Default + PartialEq + Sized + 'static {
    const FIELDS: &'static [FieldSpec<Self>];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub path: &'static str,
    pub desired: FieldValue,
    pub actual: FieldValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    #[must_use]
    pub fn is_equal(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}:", entry.path)?;
            writeln!(f, "\t-: {}", entry.desired)?;
            writeln!(f, "\t+: {}", entry.actual)?;
        }
        Ok(())
    }
}

/// Outcome of [`compare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The desired value was empty; nothing was compared and there is no
    /// verdict.
    Skipped,
    Compared(DiffReport),
}

/// Compares `desired` against `actual` using `T`'s field table.
#[must_use]
pub fn compare<T: Diffable>(desired: &T, actual: &T) -> Comparison {
    if *desired == T::default() {
        return Comparison::Skipped;
    }

    let entries = T::FIELDS
        .iter()
        .filter_map(|field| {
            let (mut want, mut have) = ((field.get)(desired), (field.get)(actual));
            if field.ignore_whitespace {
                want = want.normalized();
                have = have.normalized();
            }
            (want != have).then_some(DiffEntry {
                path: field.path,
                desired: want,
                actual: have,
            })
        })
        .collect();
    Comparison::Compared(DiffReport { entries })
}
