//! Integer ranges and the streams (stateful iterators) that loops consume.

use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::value::Value;

/// Half-open integer range `start ..< end` stepping by a non-zero `step`.
///
/// The end is normalised so that an empty range never runs backwards:
/// for a positive step `end >= start`, for a negative step `end <= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: i64,
    end: i64,
    step: i64,
}

impl Range {
    /// `start` up to but excluding `end`, moving by `step`. A zero step
    /// is refused.
    pub fn new(start: i64, end: i64, step: i64) -> Result<Self, RuntimeError> {
        if step == 0 {
            return Err(RuntimeError::InvalidRange {
                reason: "step must be non-zero",
            });
        }
        let end = if step > 0 {
            end.max(start)
        } else {
            end.min(start)
        };
        Ok(Range { start, end, step })
    }

    /// `start ..< end`, counting up by one.
    pub fn half_open(start: i64, end: i64) -> Result<Self, RuntimeError> {
        Range::new(start, end, 1)
    }

    /// `start ... end`, both ends included.
    pub fn closed(start: i64, end: i64) -> Result<Self, RuntimeError> {
        Range::new(start, end.saturating_add(1), 1)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of integers the range yields.
    pub fn len(&self) -> usize {
        let direction = self.step.signum();
        let span = self.end as i128 - self.start as i128 + self.step as i128 - direction as i128;
        (span / self.step as i128).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `index`th integer, counting from `start`.
    pub fn get(&self, index: usize) -> Option<i64> {
        (index < self.len()).then(|| self.start + self.step * index as i64)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> {
        let range = *self;
        (0..range.len()).map(move |i| range.start + range.step * i as i64)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..<{}]", self.start, self.end)
    }
}

/// A one-way cursor over an iterable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Stream {
    Range { range: Range, index: usize },
    List { items: Rc<[Value]>, index: usize },
    Chars { text: Rc<str>, offset: usize },
}

impl Stream {
    /// Start a stream over `value`, or fail if it cannot be iterated.
    pub fn over(value: &Value) -> Result<Self, RuntimeError> {
        match value {
            Value::Range(range) => Ok(Stream::Range {
                range: *range,
                index: 0,
            }),
            Value::List(items) => Ok(Stream::List {
                items: Rc::clone(items),
                index: 0,
            }),
            Value::Str(text) => Ok(Stream::Chars {
                text: Rc::clone(text),
                offset: 0,
            }),
            other => Err(RuntimeError::NotIterable {
                found: other.show(),
            }),
        }
    }

    /// Produce the next element, or `None` once exhausted.
    pub fn advance(&mut self) -> Option<Value> {
        match self {
            Stream::Range { range, index } => {
                let n = range.get(*index)?;
                *index += 1;
                Some(Value::Int(n))
            }
            Stream::List { items, index } => {
                let item = items.get(*index)?.clone();
                *index += 1;
                Some(item)
            }
            Stream::Chars { text, offset } => {
                let ch = text.get(*offset..)?.chars().next()?;
                *offset += ch.len_utf8();
                Some(Value::Char(ch))
            }
        }
    }
}
