use serde::Deserialize;
use serde_json::{Map, Value};

pub const PM2_5_VALUE: &str = "PM2_5Value";
pub const PM2_5_CF_1: &str = "pm2_5_cf_1";
pub const HUMIDITY: &str = "humidity";
const LABEL: &str = "Label";
const STATS: &str = "Stats";
const STATS_10_MINUTE_AVERAGE: &str = "v1";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("sample has no {0} field")]
    MissingField(&'static str),

    #[error("sample field {field} is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },
}

/// One channel of a PurpleAir sensor at one poll.
///
/// Fields are kept as they arrive on the wire; PurpleAir sends most
/// numbers as JSON strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSample {
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LegacyResponse {
    #[serde(default)]
    results: Vec<Map<String, Value>>,
}

impl SensorSample {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(fields)),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.fields
            .get(LABEL)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|v| !v.is_null())
    }

    pub fn number(&self, field: &'static str) -> Result<f64, SampleError> {
        let value = self
            .fields
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or(SampleError::MissingField(field))?;

        parse_number(value).ok_or_else(|| SampleError::NotNumeric {
            field,
            value: value.to_string(),
        })
    }

    /// The 10-minute average of `PM2_5Value` from the `Stats` field.
    ///
    /// `Stats` is a JSON document encoded as a string.
    pub fn ten_minute_average(&self) -> Option<f64> {
        let stats = match self.fields.get(STATS)? {
            Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
            v @ Value::Object(_) => v.clone(),
            _ => return None,
        };

        stats.get(STATS_10_MINUTE_AVERAGE).and_then(parse_number)
    }

    /// A copy of this sample with `PM2_5Value` replaced by its 10-minute
    /// average, or an unchanged copy when no average was reported.
    pub fn ten_minute(&self) -> SensorSample {
        let mut sample = self.clone();
        if let Some(avg) = self.ten_minute_average() {
            sample.set(PM2_5_VALUE, Value::from(avg));
        }
        sample
    }

    fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    n.is_finite().then_some(n)
}

/// Parses a legacy `/json?show=` response body into per-channel samples.
///
/// Only the primary channel of a PurpleAir sensor reports humidity; other
/// channels inherit it from the first channel that has one.
pub fn parse_results(body: Value) -> Result<Vec<SensorSample>, serde_json::Error> {
    let response: LegacyResponse = serde_json::from_value(body)?;

    let mut samples: Vec<SensorSample> =
        response.results.into_iter().map(SensorSample::new).collect();

    let humidity = samples
        .iter()
        .find(|s| s.has(HUMIDITY))
        .and_then(|s| s.fields.get(HUMIDITY).cloned());

    if let Some(humidity) = humidity {
        for sample in samples.iter_mut().filter(|s| !s.has(HUMIDITY)) {
            sample.set(HUMIDITY, humidity.clone());
        }
    }

    Ok(samples)
}
