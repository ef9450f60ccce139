use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use fractic_server_error::ServerError;

use crate::errors::InvalidIsoDate;

/// Either a plain ISO date (taken as midnight UTC) or a full RFC 3339
/// timestamp.
#[derive(Debug)]
pub(crate) struct ISODateModel(DateTime<Utc>);

impl FromStr for ISODateModel {
    type Err = ServerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(ISODateModel(ts.with_timezone(&Utc)));
        }
        let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| InvalidIsoDate::with_debug(s, &e))?;
        Ok(ISODateModel(d.and_time(chrono::NaiveTime::MIN).and_utc()))
    }
}

impl From<ISODateModel> for DateTime<Utc> {
    fn from(model: ISODateModel) -> DateTime<Utc> {
        model.0
    }
}
