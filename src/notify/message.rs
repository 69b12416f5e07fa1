use crate::{
    aggregate::AreaReading,
    config::Area,
    tier::{AlertTier, AlertTiers},
};

/// Replaces every `{name}` placeholder in `template` in a single pass;
/// substituted values are copied verbatim. Unknown placeholders are left
/// as they are.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let value = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end + 1))
        });

        match value {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn sensor_breakdown(reading: &AreaReading) -> String {
    reading
        .sensors
        .iter()
        .map(|s| format!("{}: {} (10-min avg: {})", s.label, s.aqi, s.aqi_10m))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn compose_alert(area: &Area, tier: &AlertTier, reading: &AreaReading, method: &str) -> String {
    let aqi = reading.aqi.to_string();
    let aqi_10m = reading.aqi_10m.to_string();
    let sensors = sensor_breakdown(reading);
    let link = area.map_link();

    render_template(
        &tier.template,
        &[
            ("area", area.name.as_str()),
            ("aqi", aqi.as_str()),
            ("aqi_10m", aqi_10m.as_str()),
            ("method", method),
            ("sensors", sensors.as_str()),
            ("link", link.as_str()),
        ],
    )
}

pub fn compose_welcome(tiers: &AlertTiers, method: &str, areas: &[&str]) -> String {
    let thresholds = tiers
        .iter()
        .rev()
        .map(|t| format!("{}{}", t.threshold, t.badge))
        .collect::<Vec<_>>()
        .join(" and ");

    format!(
        "Welcome to Runair 🟢🏃🏻‍♀️! You're all set to receive alerts the first time the AQI drops below {thresholds} each 24-hour period (according to {method} conversion, powered by PurpleAir) for the following areas:\n{}",
        areas.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::SensorReading, testing::area};

    fn reading() -> AreaReading {
        AreaReading {
            area: "Test".to_string(),
            sensors: vec![
                SensorReading {
                    sensor_id: "a".to_string(),
                    label: "Fulton and 12th".to_string(),
                    aqi: 40,
                    aqi_10m: 42,
                },
                SensorReading {
                    sensor_id: "b".to_string(),
                    label: "Sensor b".to_string(),
                    aqi: 60,
                    aqi_10m: 58,
                },
            ],
            aqi: 50,
            aqi_10m: 50,
        }
    }

    #[test]
    fn test_render_template() {
        assert_eq!(
            render_template("{a} and {b} and {a} {c}", &[("a", "1"), ("b", "2")]),
            "1 and 2 and 1 {c}"
        );
        assert_eq!(render_template("{{a}} {", &[("a", "1")]), "{1} {");
    }

    #[test]
    fn test_compose_alert_keeps_labels_verbatim() {
        let tier = AlertTier {
            threshold: 100,
            key: "ok".to_string(),
            badge: String::new(),
            template: "{sensors}|{link}".to_string(),
        };
        let mut reading = reading();
        reading.sensors.truncate(1);
        reading.sensors[0].label = "Roof {link} {aqi}".to_string();

        let message = compose_alert(&area("Test", &["a"]), &tier, &reading, "AQandU");

        assert_eq!(
            message,
            "Roof {link} {aqi}: 40 (10-min avg: 42)|https://map.example/?select=a"
        );
    }

    #[test]
    fn test_compose_alert() {
        let tier = AlertTier {
            threshold: 100,
            key: "ok".to_string(),
            badge: "💛".to_string(),
            template: "AQI at {area} is now {aqi} ({method}), 10-min avg: {aqi_10m}\n{sensors}\n{link}"
                .to_string(),
        };

        let message = compose_alert(&area("Test", &["a", "b"]), &tier, &reading(), "AQandU");

        assert_eq!(
            message,
            "AQI at Test is now 50 (AQandU), 10-min avg: 50\n\
             Fulton and 12th: 40 (10-min avg: 42)\n\
             Sensor b: 60 (10-min avg: 58)\n\
             https://map.example/?select=a"
        );
    }

    #[test]
    fn test_compose_welcome() {
        let tiers = AlertTiers::defaults(50, 100).unwrap();

        let message = compose_welcome(&tiers, "AQandU", &["SOMA", "Dogpatch"]);

        assert!(message.contains("drops below 100💛 and 50💚 each 24-hour period"));
        assert!(message.contains("according to AQandU conversion"));
        assert!(message.starts_with("Welcome to Runair 🟢🏃🏻‍♀️!"));
        assert!(message.ends_with("areas:\nSOMA\nDogpatch"));
    }
}
