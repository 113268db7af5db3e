use std::cell::{Ref, RefCell};
use std::rc::Rc;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::trace;

use super::{view_common, Binding};
use crate::path::Path;
use crate::tree::{self, LocalDate, LocalTime, Node, TimeOffset, Tree, Value};
use crate::{Error, Result};

const NANOS_PER_MICRO: u32 = 1_000;

macro_rules! scalar_view {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Rc<RefCell<Binding>>);

        impl $name {
            pub(crate) fn bind(binding: Binding) -> Self {
                Self(Rc::new(RefCell::new(binding)))
            }

            pub(crate) fn from_node(node: Node) -> Self {
                Self::bind(Binding::detached(node))
            }

            pub(crate) fn binding(&self) -> Ref<'_, Binding> {
                self.0.borrow()
            }

            pub(crate) fn rewrite(&self, tree: &Tree, path: Path) {
                trace!(kind = stringify!($variant), %path, "re-pointing scalar view");
                *self.0.borrow_mut() = Binding::new(tree.clone(), path);
            }
        }

        view_common!($name, $variant);
    };
}

fn with_comments<I, S>(value: Value, comments: I) -> Node
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Node::with_comments(value, comments.into_iter().map(Into::into).collect())
}

scalar_view!(
    /// The `null` extension value.
    Null,
    Null
);

impl Default for Null {
    fn default() -> Self {
        Self::new()
    }
}

impl Null {
    pub fn new() -> Self {
        Self::from_node(Node::new(Value::Null))
    }

    pub fn with_comments<I, S>(comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_node(with_comments(Value::Null, comments))
    }

    pub fn value(&self) -> Result<()> {
        self.binding()
            .project("null", |value| matches!(value, Value::Null).then_some(()))
    }

    pub fn repr(&self) -> Result<String> {
        self.value().map(|()| "Null()".to_string())
    }
}

scalar_view!(Boolean, Boolean);

impl Boolean {
    pub fn new(value: bool) -> Self {
        Self::from_node(Node::new(Value::Boolean(value)))
    }

    pub fn with_comments<I, S>(value: bool, comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_node(with_comments(Value::Boolean(value), comments))
    }

    pub fn value(&self) -> Result<bool> {
        self.binding().project("boolean", |value| match value {
            Value::Boolean(b) => Some(*b),
            _ => None,
        })
    }

    pub fn repr(&self) -> Result<String> {
        Ok(format!("Boolean({})", self.value()?))
    }
}

scalar_view!(Integer, Integer);

impl Integer {
    pub fn new(value: i64) -> Self {
        Self::from_node(Node::new(Value::Integer(value)))
    }

    pub fn with_comments<I, S>(value: i64, comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_node(with_comments(Value::Integer(value), comments))
    }

    pub fn value(&self) -> Result<i64> {
        self.binding().project("integer", |value| match value {
            Value::Integer(i) => Some(*i),
            _ => None,
        })
    }

    pub fn repr(&self) -> Result<String> {
        Ok(format!("Integer({})", self.value()?))
    }
}

scalar_view!(Float, Float);

impl Float {
    pub fn new(value: f64) -> Self {
        Self::from_node(Node::new(Value::Float(value)))
    }

    pub fn with_comments<I, S>(value: f64, comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_node(with_comments(Value::Float(value), comments))
    }

    pub fn value(&self) -> Result<f64> {
        self.binding().project("float", |value| match value {
            Value::Float(f) => Some(*f),
            _ => None,
        })
    }

    pub fn repr(&self) -> Result<String> {
        Ok(format!("Float({})", self.value()?))
    }
}

scalar_view!(
    /// A string value. Named `Str` to stay clear of [`std::string::String`].
    Str,
    String
);

impl Str {
    pub fn new(value: impl Into<String>) -> Self {
        Self::from_node(Node::new(Value::String(value.into())))
    }

    pub fn with_comments<I, S>(value: impl Into<String>, comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_node(with_comments(Value::String(value.into()), comments))
    }

    pub fn value(&self) -> Result<String> {
        self.binding().project("string", |value| match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn repr(&self) -> Result<String> {
        Ok(format!("String({:?})", self.value()?))
    }
}

scalar_view!(Date, Date);

impl Date {
    /// Fails for years outside `0..=9999`.
    pub fn new(value: NaiveDate) -> Result<Self> {
        Ok(Self::from_node(Node::new(Value::Date(LocalDate::from_chrono(value)?))))
    }

    pub fn with_comments<I, S>(value: NaiveDate, comments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let date = LocalDate::from_chrono(value)?;
        Ok(Self::from_node(with_comments(Value::Date(date), comments)))
    }

    pub fn raw(&self) -> Result<LocalDate> {
        self.binding().project("date", |value| match value {
            Value::Date(d) => Some(*d),
            _ => None,
        })
    }

    pub fn value(&self) -> Result<NaiveDate> {
        let date = self.raw()?;
        date.to_chrono()
            .ok_or_else(|| Error::invalid_value(format!("date {date} out of range")))
    }

    pub fn repr(&self) -> Result<String> {
        Ok(format!("Date({})", self.raw()?))
    }
}

fn local_time(time: NaiveTime, nanoseconds: Option<u16>) -> Result<LocalTime> {
    let nanosecond = match nanoseconds {
        None => time.nanosecond(),
        Some(extra) if u32::from(extra) < NANOS_PER_MICRO => {
            time.nanosecond() / NANOS_PER_MICRO * NANOS_PER_MICRO + u32::from(extra)
        }
        Some(extra) => {
            return Err(Error::invalid_value(format!(
                "nanoseconds must be below 1000, got {extra}"
            )))
        }
    };
    LocalTime::new(
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        nanosecond,
    )
}

/// Microsecond-precision chrono time; the rest is reported by `nanoseconds()`.
fn micro_time(time: &LocalTime) -> Result<NaiveTime> {
    NaiveTime::from_hms_micro_opt(
        u32::from(time.hour()),
        u32::from(time.minute()),
        u32::from(time.second()),
        time.nanosecond() / NANOS_PER_MICRO,
    )
    .ok_or_else(|| Error::invalid_value(format!("time {time} out of range")))
}

fn sub_micro(time: &LocalTime) -> u16 {
    (time.nanosecond() % NANOS_PER_MICRO) as u16
}

scalar_view!(Time, Time);

impl Time {
    pub fn new(value: NaiveTime) -> Result<Self> {
        Ok(Self::from_node(Node::new(Value::Time(local_time(value, None)?))))
    }

    /// Keep the microseconds of `value` and set the sub-microsecond part to
    /// `nanoseconds` (`0..1000`).
    pub fn with_nanoseconds(value: NaiveTime, nanoseconds: u16) -> Result<Self> {
        let time = local_time(value, Some(nanoseconds))?;
        Ok(Self::from_node(Node::new(Value::Time(time))))
    }

    pub fn with_comments<I, S>(value: NaiveTime, comments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let time = local_time(value, None)?;
        Ok(Self::from_node(with_comments(Value::Time(time), comments)))
    }

    pub fn raw(&self) -> Result<LocalTime> {
        self.binding().project("time", |value| match value {
            Value::Time(t) => Some(*t),
            _ => None,
        })
    }

    pub fn value(&self) -> Result<NaiveTime> {
        micro_time(&self.raw()?)
    }

    pub fn nanoseconds(&self) -> Result<u16> {
        Ok(sub_micro(&self.raw()?))
    }

    pub fn repr(&self) -> Result<String> {
        Ok(format!("Time({})", self.raw()?))
    }
}

/// A date-time read back from a [`DateTime`] view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    Local(NaiveDateTime),
    Offset(chrono::DateTime<FixedOffset>),
}

impl From<NaiveDateTime> for DateTimeValue {
    fn from(value: NaiveDateTime) -> Self {
        DateTimeValue::Local(value)
    }
}

impl From<chrono::DateTime<FixedOffset>> for DateTimeValue {
    fn from(value: chrono::DateTime<FixedOffset>) -> Self {
        DateTimeValue::Offset(value)
    }
}

fn to_tree_datetime(value: DateTimeValue) -> Result<tree::DateTime> {
    match value {
        DateTimeValue::Local(naive) => tree::DateTime::from_naive(naive),
        DateTimeValue::Offset(dt) => {
            let mut local = tree::DateTime::from_naive(dt.naive_local())?;
            local.offset = Some(TimeOffset::from_chrono(*dt.offset())?);
            Ok(local)
        }
    }
}

scalar_view!(DateTime, DateTime);

impl DateTime {
    /// Local or offset date-time, depending on the chrono type passed in.
    pub fn new(value: impl Into<DateTimeValue>) -> Result<Self> {
        let datetime = to_tree_datetime(value.into())?;
        Ok(Self::from_node(Node::new(Value::DateTime(datetime))))
    }

    pub fn local(value: NaiveDateTime) -> Result<Self> {
        Self::new(value)
    }

    /// Fails with `InvalidValue` when the offset is not a whole number of
    /// minutes.
    pub fn with_offset(value: chrono::DateTime<FixedOffset>) -> Result<Self> {
        Self::new(value)
    }

    pub fn with_comments<I, S>(value: impl Into<DateTimeValue>, comments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let datetime = to_tree_datetime(value.into())?;
        Ok(Self::from_node(with_comments(Value::DateTime(datetime), comments)))
    }

    pub fn raw(&self) -> Result<tree::DateTime> {
        self.binding().project("datetime", |value| match value {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        })
    }

    /// Microsecond-precision value; see [`DateTime::nanoseconds`].
    pub fn value(&self) -> Result<DateTimeValue> {
        let raw = self.raw()?;
        let date = raw
            .date
            .to_chrono()
            .ok_or_else(|| Error::invalid_value(format!("date {} out of range", raw.date)))?;
        let naive = NaiveDateTime::new(date, micro_time(&raw.time)?);
        let Some(offset) = raw.offset else {
            return Ok(DateTimeValue::Local(naive));
        };
        let fixed = offset
            .to_chrono()
            .ok_or_else(|| Error::invalid_value(format!("offset {offset} out of range")))?;
        naive
            .and_local_timezone(fixed)
            .single()
            .map(DateTimeValue::Offset)
            .ok_or_else(|| Error::invalid_value(format!("cannot place {raw} at offset {offset}")))
    }

    pub fn nanoseconds(&self) -> Result<u16> {
        Ok(sub_micro(&self.raw()?.time))
    }

    pub fn repr(&self) -> Result<String> {
        Ok(format!("DateTime({})", self.raw()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[rstest::rstest]
    fn test_scalar_values_and_repr() {
        assert_eq!(Boolean::new(true).repr().unwrap(), "Boolean(true)");
        assert_eq!(Integer::new(-7).value().unwrap(), -7);
        assert_eq!(Float::new(1.5).repr().unwrap(), "Float(1.5)");
        assert_eq!(Str::new("say \"hi\"").repr().unwrap(), r#"String("say \"hi\"")"#);
        assert_eq!(Null::new().repr().unwrap(), "Null()");
    }

    #[rstest::rstest]
    fn test_comments_round_trip() {
        let value = Integer::with_comments(1, [" first", " second"]);
        assert_eq!(value.comments().unwrap(), vec![" first", " second"]);
        value.set_comments(Vec::<String>::new()).unwrap();
        assert!(value.comments().unwrap().is_empty());
    }

    #[rstest::rstest]
    fn test_copy_is_independent() {
        let value = Str::new("a");
        let copy = value.copy().unwrap();
        copy.set_comments([" c"]).unwrap();
        assert_eq!(value.value().unwrap(), copy.value().unwrap());
        assert_ne!(value, copy);
        assert!(!copy.is_attached());
    }

    #[rstest::rstest]
    fn test_time_splits_nanoseconds() {
        let base = NaiveTime::from_hms_nano_opt(7, 32, 0, 123_456_789).unwrap();
        let time = Time::new(base).unwrap();
        assert_eq!(time.value().unwrap(), NaiveTime::from_hms_micro_opt(7, 32, 0, 123_456).unwrap());
        assert_eq!(time.nanoseconds().unwrap(), 789);

        let time = Time::with_nanoseconds(base, 5).unwrap();
        assert_eq!(time.nanoseconds().unwrap(), 5);
        assert_eq!(time.repr().unwrap(), "Time(07:32:00.123456005)");

        let err = Time::with_nanoseconds(base, 1000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[rstest::rstest]
    fn test_datetime_with_offset() {
        let offset = FixedOffset::east_opt(-7 * 3600).unwrap();
        let naive = NaiveDate::from_ymd_opt(1979, 5, 27)
            .unwrap()
            .and_hms_opt(7, 32, 0)
            .unwrap();
        let value = naive.and_local_timezone(offset).single().unwrap();
        let view = DateTime::with_offset(value).unwrap();
        assert_eq!(view.value().unwrap(), DateTimeValue::Offset(value));
        assert_eq!(view.repr().unwrap(), "DateTime(1979-05-27T07:32:00-07:00)");

        let odd = FixedOffset::east_opt(30).unwrap();
        let err = DateTime::with_offset(naive.and_local_timezone(odd).single().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[rstest::rstest]
    fn test_local_datetime_and_date() {
        let naive = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(0, 0, 1)
            .unwrap();
        let view = DateTime::local(naive).unwrap();
        assert_eq!(view.value().unwrap(), DateTimeValue::Local(naive));
        let date = Date::new(naive.date()).unwrap();
        assert_eq!(date.repr().unwrap(), "Date(2024-02-29)");
    }
}
