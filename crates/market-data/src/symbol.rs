//! Contract identifier decoding
//!
//! Identifiers follow the OCC-style layout `<ROOT><YYMMDD><C|P><STRIKE*1000>`,
//! e.g. `AAPL240920C00175000` is the AAPL 175.0 call expiring 2024-09-20.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::OptionType;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::MarketDataError;
use crate::Result;

fn symbol_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]+)([0-9]{6})([CP])([0-9]+)$")
            .unwrap_or_else(|e| panic!("invalid contract symbol regex: {e}"))
    })
}

/// 00:00 UTC on `date`
pub(crate) fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// A decoded option contract identifier.
///
/// The raw string is kept verbatim and is what the cache is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractId {
    raw: String,
    root: String,
    expiry: NaiveDate,
    option_type: OptionType,
    strike_millis: u64,
}

impl ContractId {
    /// Decode a raw identifier, failing with `MalformedSymbol` on any mismatch
    pub fn decode(raw: &str) -> Result<Self> {
        let malformed = || MarketDataError::MalformedSymbol(raw.to_string());

        let caps = symbol_regex().captures(raw).ok_or_else(malformed)?;

        let date = &caps[2];
        let yy: i32 = date[0..2].parse().map_err(|_| malformed())?;
        let mm: u32 = date[2..4].parse().map_err(|_| malformed())?;
        let dd: u32 = date[4..6].parse().map_err(|_| malformed())?;
        let expiry = NaiveDate::from_ymd_opt(2000 + yy, mm, dd).ok_or_else(malformed)?;

        let option_type = caps[3]
            .chars()
            .next()
            .and_then(OptionType::from_flag)
            .ok_or_else(malformed)?;

        let strike_millis: u64 = caps[4].parse().map_err(|_| malformed())?;

        Ok(Self {
            raw: raw.to_string(),
            root: caps[1].to_string(),
            expiry,
            option_type,
            strike_millis,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Underlying ticker, case as given
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn expiry(&self) -> NaiveDate {
        self.expiry
    }

    /// Start of the expiry date in UTC
    pub fn expires_at(&self) -> DateTime<Utc> {
        start_of_day_utc(self.expiry)
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn strike(&self) -> f64 {
        self.strike_millis as f64 / 1000.0
    }

    /// Canonical form with the strike padded to eight digits
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{:08}",
            self.root,
            self.expiry.format("%y%m%d"),
            self.option_type.flag(),
            self.strike_millis
        )
    }
}

impl FromStr for ContractId {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}
