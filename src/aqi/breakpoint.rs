//! PM2.5 to AQI conversion using the US EPA breakpoint table.
//!
//! See <https://forum.airnowtech.org/t/the-aqi-equation/169>.

/// Concentrations above this value saturate at [`MAX_AQI`].
pub const MAX_PM: f64 = 500.0;

pub const MAX_AQI: f64 = 500.0;

/// `(pm_low, pm_high, aqi_low, aqi_high)` per bracket, highest bracket first.
pub const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 7] = [
    (350.5, 500.0, 401.0, 500.0),
    (250.5, 350.4, 301.0, 400.0),
    (150.5, 250.4, 201.0, 300.0),
    (55.5, 150.4, 151.0, 200.0),
    (35.5, 55.4, 101.0, 150.0),
    (12.0, 35.4, 51.0, 100.0),
    (0.0, 11.9, 1.0, 50.0),
];

/// Linear interpolation of `pm` inside one breakpoint bracket.
///
/// The caller picks the bracket; `pm` outside `pm_low..=pm_high` is
/// extrapolated along the same line.
pub fn pm_to_aqi(pm: f64, pm_low: f64, pm_high: f64, aqi_low: f64, aqi_high: f64) -> f64 {
    (pm - pm_low) * (aqi_high - aqi_low) / (pm_high - pm_low) + aqi_low
}

/// Calculates the AQI for a corrected PM2.5 concentration.
///
/// Uses the highest bracket whose lower bound is `<= pm`. Values above
/// [`MAX_PM`] return [`MAX_AQI`]; negative (and NaN) values fall through
/// every bracket and return `0.0`.
pub fn calculate_aqi(pm: f64) -> f64 {
    if pm > MAX_PM {
        return MAX_AQI;
    }

    PM25_BREAKPOINTS
        .iter()
        .find(|(pm_low, ..)| pm >= *pm_low)
        .map(|&(pm_low, pm_high, aqi_low, aqi_high)| {
            pm_to_aqi(pm, pm_low, pm_high, aqi_low, aqi_high)
        })
        .unwrap_or(0.0)
}
