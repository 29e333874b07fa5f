//! Dependency lists that decide when a coordinator re-runs.
//!
//! A list is an ordered sequence of opaque comparison values. Two lists are
//! considered different when their lengths differ or any position holds a
//! different value; nothing is compared structurally beyond that.

use std::sync::Arc;

/// One opaque comparison value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Str(Arc<str>),
}

impl From<bool> for DepValue {
    fn from(v: bool) -> Self {
        DepValue::Bool(v)
    }
}

impl From<i32> for DepValue {
    fn from(v: i32) -> Self {
        DepValue::Int(i64::from(v))
    }
}

impl From<i64> for DepValue {
    fn from(v: i64) -> Self {
        DepValue::Int(v)
    }
}

impl From<u32> for DepValue {
    fn from(v: u32) -> Self {
        DepValue::Uint(u64::from(v))
    }
}

impl From<u64> for DepValue {
    fn from(v: u64) -> Self {
        DepValue::Uint(v)
    }
}

impl From<usize> for DepValue {
    fn from(v: usize) -> Self {
        DepValue::Uint(v as u64)
    }
}

impl From<&str> for DepValue {
    fn from(v: &str) -> Self {
        DepValue::Str(Arc::from(v))
    }
}

impl From<String> for DepValue {
    fn from(v: String) -> Self {
        DepValue::Str(Arc::from(v))
    }
}

impl From<&String> for DepValue {
    fn from(v: &String) -> Self {
        DepValue::Str(Arc::from(v.as_str()))
    }
}

impl From<Arc<str>> for DepValue {
    fn from(v: Arc<str>) -> Self {
        DepValue::Str(v)
    }
}

impl<T: Into<DepValue>> From<Option<T>> for DepValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(DepValue::Null, Into::into)
    }
}

/// Ordered list of [`DepValue`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dependencies(Vec<DepValue>);

impl Dependencies {
    /// An empty list: the coordinator then only runs on mount, recovery and refetch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<DepValue>) {
        self.0.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepValue> {
        self.0.iter()
    }

    /// Positional shallow comparison against the previous list.
    pub fn changed_from(&self, previous: &Dependencies) -> bool {
        self.0.len() != previous.0.len()
            || self.0.iter().zip(previous.0.iter()).any(|(next, prev)| next != prev)
    }
}

impl From<Vec<DepValue>> for Dependencies {
    fn from(values: Vec<DepValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<DepValue> for Dependencies {
    fn from_iter<I: IntoIterator<Item = DepValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`Dependencies`] list from heterogeneous values.
///
/// ```
/// use gigboard_core::deps;
///
/// let page = 2_u32;
/// let deps = deps![page, "remote", None::<&str>];
/// assert_eq!(deps.len(), 3);
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::fetch::Dependencies::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::fetch::Dependencies::from(vec![$($crate::fetch::DepValue::from($value)),+])
    };
}
