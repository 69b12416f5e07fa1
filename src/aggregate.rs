//! Reduces the samples of every sensor in an area to one area AQI.

use crate::{
    aqi::{CorrectionStrategy, calculate_aqi},
    config::Area,
    purpleair::{SensorSample, SensorSource},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReading {
    pub sensor_id: String,

    pub label: String,

    pub aqi: u32,

    pub aqi_10m: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaReading {
    pub area: String,

    /// In the order the sensors are configured.
    pub sensors: Vec<SensorReading>,

    pub aqi: u32,

    pub aqi_10m: u32,
}

/// Polls every sensor of `area` in order and averages their AQIs.
///
/// Sensors without usable data are logged and skipped. Returns `None`
/// when no sensor produced a reading.
pub async fn read_area(
    source: &dyn SensorSource,
    strategy: &dyn CorrectionStrategy,
    area: &Area,
) -> Option<AreaReading> {
    let mut sensors = Vec::with_capacity(area.sensors.len());

    for sensor_id in &area.sensors {
        let samples = match source.fetch(sensor_id).await {
            Ok(samples) => samples,
            Err(err) => {
                log::warn!("{}: no data from sensor {sensor_id}: {err}", area.name);
                continue;
            }
        };

        match read_sensor(sensor_id, &samples, strategy) {
            Some(reading) => {
                log::info!(
                    "{}: {} from {}: {} (10-min avg: {})",
                    area.name,
                    strategy.name(),
                    reading.label,
                    reading.aqi,
                    reading.aqi_10m
                );
                sensors.push(reading);
            }
            None => log::warn!("{}: no usable samples from sensor {sensor_id}", area.name),
        }
    }

    let aqi = mean(sensors.iter().map(|s| f64::from(s.aqi)))?;
    let aqi_10m = mean(sensors.iter().map(|s| f64::from(s.aqi_10m)))?;

    Some(AreaReading {
        area: area.name.clone(),
        sensors,
        aqi: truncate_aqi(aqi),
        aqi_10m: truncate_aqi(aqi_10m),
    })
}

/// Averages the corrected concentration over a sensor's channels and
/// converts it to an AQI. Malformed channels are skipped.
pub fn read_sensor(
    sensor_id: &str,
    samples: &[SensorSample],
    strategy: &dyn CorrectionStrategy,
) -> Option<SensorReading> {
    let mut current = Vec::with_capacity(samples.len());
    let mut ten_minute = Vec::with_capacity(samples.len());
    let mut label = None;

    for sample in samples {
        let corrected = match strategy.raw_to_corrected(sample) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("sensor {sensor_id}: skipping sample: {err}");
                continue;
            }
        };
        let corrected_10m = strategy
            .raw_to_corrected(&sample.ten_minute())
            .unwrap_or(corrected);

        log::debug!(
            "sensor {sensor_id}: {} corrected PM2.5 {corrected:.2}, 10-min avg {corrected_10m:.2}",
            sample.label().unwrap_or("?")
        );

        if label.is_none() {
            label = sample.label();
        }
        current.push(corrected);
        ten_minute.push(corrected_10m);
    }

    let pm = mean(current.into_iter())?;
    let pm_10m = mean(ten_minute.into_iter())?;

    let label = label
        .map(str::to_string)
        .unwrap_or_else(|| format!("Sensor {sensor_id}"));

    Some(SensorReading {
        sensor_id: sensor_id.to_string(),
        label,
        aqi: truncate_aqi(calculate_aqi(pm)),
        aqi_10m: truncate_aqi(calculate_aqi(pm_10m)),
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn truncate_aqi(aqi: f64) -> u32 {
    aqi.trunc() as u32
}
