//! Calendar and clock serializers

use crate::codec::Encodable;
use crate::element::Element;
use crate::error::{Result, SerializationError};
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Timelike, Utc,
};
use ledgerflow_core::temporal::offset_from_seconds;
use ledgerflow_core::{MonthDay, OffsetTime, Period, Year, YearMonth, ZoneId, ZonedDateTime};

impl Encodable for DateTime<Utc> {}
impl Encodable for DateTime<FixedOffset> {}
impl Encodable for TimeDelta {}
impl Encodable for NaiveDate {}
impl Encodable for NaiveTime {}
impl Encodable for NaiveDateTime {}
impl Encodable for ZonedDateTime {}
impl Encodable for ZoneId {}
impl Encodable for OffsetTime {}
impl Encodable for Year {}
impl Encodable for YearMonth {}
impl Encodable for MonthDay {}
impl Encodable for Period {}

fn out_of_range(what: &str, detail: impl std::fmt::Display) -> SerializationError {
    SerializationError::mismatch(format!("valid {}", what), detail.to_string())
}

fn small<T: TryFrom<i64>>(value: i64, what: &str) -> Result<T> {
    T::try_from(value).map_err(|_| out_of_range(what, value))
}

fn offset_seconds(element: &Element) -> Result<FixedOffset> {
    let seconds = small::<i32>(element.as_long("offset seconds")?, "offset")?;
    Ok(offset_from_seconds(seconds)?)
}

builtin_serializer! {
    /// Seconds since the epoch plus nanoseconds
    InstantSerializer: DateTime<Utc> = "time.Instant";
    write(value, output) {
        Ok(Element::List(vec![
            Element::Long(value.timestamp()),
            Element::Long(i64::from(value.timestamp_subsec_nanos())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("instant", 2)?;
        let seconds = parts[0].as_long("instant seconds")?;
        let nanos = small::<u32>(parts[1].as_long("instant nanos")?, "nanos")?;
        DateTime::<Utc>::from_timestamp(seconds, nanos)
            .ok_or_else(|| out_of_range("instant", format!("{}s {}ns", seconds, nanos)))
    }
}

builtin_serializer! {
    /// Whole seconds plus signed nanosecond remainder
    DurationSerializer: TimeDelta = "time.Duration";
    write(value, output) {
        Ok(Element::List(vec![
            Element::Long(value.num_seconds()),
            Element::Long(i64::from(value.subsec_nanos())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("duration", 2)?;
        let seconds = parts[0].as_long("duration seconds")?;
        let nanos = parts[1].as_long("duration nanos")?;
        TimeDelta::try_seconds(seconds)
            .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos)))
            .ok_or_else(|| out_of_range("duration", format!("{}s {}ns", seconds, nanos)))
    }
}

builtin_serializer! {
    /// Year, month, day
    LocalDateSerializer: NaiveDate = "time.LocalDate";
    write(value, output) {
        Ok(Element::List(vec![
            Element::Long(i64::from(value.year())),
            Element::Long(i64::from(value.month())),
            Element::Long(i64::from(value.day())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("local date", 3)?;
        let year = small::<i32>(parts[0].as_long("year")?, "year")?;
        let month = small::<u32>(parts[1].as_long("month")?, "month")?;
        let day = small::<u32>(parts[2].as_long("day")?, "day")?;
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| out_of_range("date", format!("{}-{}-{}", year, month, day)))
    }
}

builtin_serializer! {
    /// Hour, minute, second, nanosecond
    LocalTimeSerializer: NaiveTime = "time.LocalTime";
    write(value, output) {
        Ok(Element::List(vec![
            Element::Long(i64::from(value.hour())),
            Element::Long(i64::from(value.minute())),
            Element::Long(i64::from(value.second())),
            Element::Long(i64::from(value.nanosecond())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("local time", 4)?;
        let mut fields = [0u32; 4];
        for (slot, part) in fields.iter_mut().zip(parts) {
            *slot = small::<u32>(part.as_long("time component")?, "time component")?;
        }
        let [h, m, s, n] = fields;
        NaiveTime::from_hms_nano_opt(h, m, s, n)
            .ok_or_else(|| out_of_range("time", format!("{}:{}:{}.{}", h, m, s, n)))
    }
}

builtin_serializer! {
    /// Date plus time
    LocalDateTimeSerializer: NaiveDateTime = "time.LocalDateTime";
    write(value, output) {
        Ok(Element::List(vec![output.write(&value.date())?, output.write(&value.time())?]))
    }
    read(element, input) {
        let parts = element.as_tuple("local date-time", 2)?;
        Ok(NaiveDateTime::new(input.read(&parts[0])?, input.read(&parts[1])?))
    }
}

builtin_serializer! {
    /// Local date-time, offset seconds and zone id
    ZonedDateTimeSerializer: ZonedDateTime = "time.ZonedDateTime";
    write(value, output) {
        Ok(Element::List(vec![
            output.write(&value.local)?,
            Element::Long(i64::from(value.offset.local_minus_utc())),
            output.write(&value.zone)?,
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("zoned date-time", 3)?;
        Ok(ZonedDateTime {
            local: input.read(&parts[0])?,
            offset: offset_seconds(&parts[1])?,
            zone: input.read(&parts[2])?,
        })
    }
}

builtin_serializer! {
    /// Zone identifier text
    ZoneIdSerializer: ZoneId = "time.ZoneId";
    write(value, output) {
        Ok(Element::String(value.id().to_string()))
    }
    read(element, input) {
        Ok(ZoneId::new(element.as_str("zone id")?)?)
    }
}

builtin_serializer! {
    /// Local time plus offset seconds
    OffsetTimeSerializer: OffsetTime = "time.OffsetTime";
    write(value, output) {
        Ok(Element::List(vec![
            output.write(&value.time)?,
            Element::Long(i64::from(value.offset.local_minus_utc())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("offset time", 2)?;
        Ok(OffsetTime {
            time: input.read(&parts[0])?,
            offset: offset_seconds(&parts[1])?,
        })
    }
}

builtin_serializer! {
    /// Local date-time plus offset seconds
    OffsetDateTimeSerializer: DateTime<FixedOffset> = "time.OffsetDateTime";
    write(value, output) {
        Ok(Element::List(vec![
            output.write(&value.naive_local())?,
            Element::Long(i64::from(value.offset().local_minus_utc())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("offset date-time", 2)?;
        let local: NaiveDateTime = input.read(&parts[0])?;
        let offset = offset_seconds(&parts[1])?;
        offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| out_of_range("offset date-time", local))
    }
}

builtin_serializer! {
    /// Year number
    YearSerializer: Year = "time.Year";
    write(value, output) {
        Ok(Element::Long(i64::from(value.0)))
    }
    read(element, input) {
        Ok(Year(small::<i32>(element.as_long("year")?, "year")?))
    }
}

builtin_serializer! {
    /// Year and month
    YearMonthSerializer: YearMonth = "time.YearMonth";
    write(value, output) {
        Ok(Element::List(vec![
            Element::Long(i64::from(value.year())),
            Element::Long(i64::from(value.month())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("year-month", 2)?;
        Ok(YearMonth::new(
            small::<i32>(parts[0].as_long("year")?, "year")?,
            small::<u32>(parts[1].as_long("month")?, "month")?,
        )?)
    }
}

builtin_serializer! {
    /// Month and day
    MonthDaySerializer: MonthDay = "time.MonthDay";
    write(value, output) {
        Ok(Element::List(vec![
            Element::Long(i64::from(value.month())),
            Element::Long(i64::from(value.day())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("month-day", 2)?;
        Ok(MonthDay::new(
            small::<u32>(parts[0].as_long("month")?, "month")?,
            small::<u32>(parts[1].as_long("day")?, "day")?,
        )?)
    }
}

builtin_serializer! {
    /// Years, months, days
    PeriodSerializer: Period = "time.Period";
    write(value, output) {
        Ok(Element::List(vec![
            Element::Long(i64::from(value.years)),
            Element::Long(i64::from(value.months)),
            Element::Long(i64::from(value.days)),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("period", 3)?;
        Ok(Period::new(
            small::<i32>(parts[0].as_long("years")?, "years")?,
            small::<i32>(parts[1].as_long("months")?, "months")?,
            small::<i32>(parts[2].as_long("days")?, "days")?,
        ))
    }
}
