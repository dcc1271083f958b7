//! Human-readable formatting of metric values.

use gpuwatch_types::{HumanizedValue, UnitKind};

const HERTZ: [&str; 6] = ["Hz", "kHz", "MHz", "GHz", "THz", "PHz"];
const WATTS: [&str; 6] = ["W", "kW", "MW", "GW", "TW", "PW"];
const BYTES: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Format a raw value for display.
///
/// `explicit_unit` names the unit the raw value arrives in (e.g. `"MHz"` for
/// DCGM clock readings). It only applies to scaled kinds; an explicit unit
/// that is not on the kind's prefix ladder disables scaling and is shown as-is.
///
/// Never panics: NaN and infinities format as such.
///
/// ```
/// use gpuwatch::data::humanize::humanize;
/// use gpuwatch_types::UnitKind;
///
/// assert_eq!(humanize(0.553, UnitKind::Ratio, None).string, "55.3%");
/// assert_eq!(humanize(1500.0, UnitKind::Hertz, Some("MHz")).string, "1.5 GHz");
/// ```
pub fn humanize(raw: f64, kind: UnitKind, explicit_unit: Option<&str>) -> HumanizedValue {
    match kind {
        UnitKind::Ratio => percentage(raw * 100.0),
        UnitKind::Percentage => percentage(raw),
        UnitKind::Degrees => degrees(raw),
        UnitKind::Hertz => scaled(raw, &HERTZ, 1000.0, explicit_unit),
        UnitKind::Watts => scaled(raw, &WATTS, 1000.0, explicit_unit),
        UnitKind::Bytes => scaled(raw, &BYTES, 1024.0, explicit_unit),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

fn percentage(value: f64) -> HumanizedValue {
    let value = round_to(value, 1);
    HumanizedValue {
        value,
        unit: "%".to_string(),
        string: format!("{:.1}%", value),
    }
}

fn degrees(value: f64) -> HumanizedValue {
    let value = round_to(value, 1);
    HumanizedValue {
        value,
        unit: "°C".to_string(),
        string: format!("{}°C", value),
    }
}

fn scaled(raw: f64, ladder: &[&str], base: f64, explicit_unit: Option<&str>) -> HumanizedValue {
    let explicit_unit = explicit_unit.map(str::trim).filter(|u| !u.is_empty());

    let start = match explicit_unit {
        None => 0,
        Some(unit) => match ladder.iter().position(|prefix| *prefix == unit) {
            Some(index) => index,
            None => return labelled(round_to(raw, 2), unit),
        },
    };

    let mut value = raw;
    let mut index = start;
    if value.is_finite() {
        while index + 1 < ladder.len() && round_to(value, 2).abs() >= base {
            value /= base;
            index += 1;
        }
    }

    labelled(round_to(value, 2), ladder[index])
}

fn labelled(value: f64, unit: &str) -> HumanizedValue {
    HumanizedValue {
        value,
        unit: unit.to_string(),
        string: format!("{} {}", value, unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(humanize(0.0, UnitKind::Percentage, None).string, "0.0%");
        assert_eq!(humanize(55.34, UnitKind::Percentage, None).string, "55.3%");
        assert_eq!(humanize(100.0, UnitKind::Percentage, None).value, 100.0);
    }

    #[test]
    fn test_percentage_string_matches_value() {
        for raw in [41.25, 2.25, 0.05, 99.95] {
            let pct = humanize(raw, UnitKind::Percentage, None);
            assert_eq!(pct.string, format!("{:.1}%", pct.value));
        }
        let pct = humanize(41.25, UnitKind::Percentage, None);
        assert_eq!(pct.value, 41.3);
        assert_eq!(pct.string, "41.3%");
        assert_eq!(humanize(2.25, UnitKind::Percentage, None).string, "2.3%");
        assert_eq!(humanize(41.25, UnitKind::Degrees, None).string, "41.3°C");
    }

    #[test]
    fn test_ratio_is_scaled_to_percent() {
        let h = humanize(0.42, UnitKind::Ratio, None);
        assert_eq!(h.string, "42.0%");
        assert_eq!(h.unit, "%");
        assert_eq!(humanize(1.0, UnitKind::Ratio, Some("MHz")).string, "100.0%");
    }

    #[test]
    fn test_degrees() {
        assert_eq!(humanize(-5.0, UnitKind::Degrees, None).string, "-5°C");
        assert_eq!(humanize(41.25, UnitKind::Degrees, None).string, "41.3°C");
        assert_eq!(humanize(67.0, UnitKind::Degrees, Some("K")).unit, "°C");
    }

    #[test]
    fn test_hertz_scales_to_next_prefix() {
        let h = humanize(1500.0, UnitKind::Hertz, None);
        assert_eq!(h.value, 1.5);
        assert_eq!(h.unit, "kHz");
        assert_eq!(h.string, "1.5 kHz");
    }

    #[test]
    fn test_explicit_unit_is_starting_unit() {
        assert_eq!(humanize(1500.0, UnitKind::Hertz, Some("MHz")).string, "1.5 GHz");
        assert_eq!(humanize(810.0, UnitKind::Hertz, Some("MHz")).string, "810 MHz");
    }

    #[test]
    fn test_unknown_explicit_unit_is_verbatim() {
        let h = humanize(1500.0, UnitKind::Hertz, Some("rpm"));
        assert_eq!(h.string, "1500 rpm");
        assert_eq!(h.unit, "rpm");
    }

    #[test]
    fn test_watts_and_bytes() {
        assert_eq!(humanize(245.678, UnitKind::Watts, None).string, "245.68 W");
        assert_eq!(humanize(2500.0, UnitKind::Watts, None).string, "2.5 kW");
        assert_eq!(humanize(1536.0, UnitKind::Bytes, None).string, "1.5 KiB");
        assert_eq!(humanize(1024.0 * 1024.0, UnitKind::Bytes, None).string, "1 MiB");
    }

    #[test]
    fn test_small_and_negative_magnitudes() {
        assert_eq!(humanize(0.5, UnitKind::Watts, None).string, "0.5 W");
        assert_eq!(humanize(-2000.0, UnitKind::Watts, None).string, "-2 kW");
        assert_eq!(humanize(0.0, UnitKind::Bytes, None).string, "0 B");
    }

    #[test]
    fn test_rounding_does_not_overflow_prefix() {
        assert_eq!(humanize(999.999, UnitKind::Hertz, None).string, "1 kHz");
    }

    #[test]
    fn test_largest_prefix_caps() {
        let h = humanize(5e18, UnitKind::Hertz, None);
        assert_eq!(h.unit, "PHz");
        assert_eq!(h.value, 5000.0);
    }

    #[test]
    fn test_huge_finite_values_stay_finite() {
        let pct = humanize(1e308, UnitKind::Percentage, None);
        assert_eq!(pct.value, 1e308);
        assert!(!pct.string.contains("inf"));

        let deg = humanize(-1e308, UnitKind::Degrees, None);
        assert_eq!(deg.value, -1e308);
        assert!(!deg.string.contains("inf"));
    }

    #[test]
    fn test_non_finite_is_total() {
        for kind in UnitKind::ALL {
            let nan = humanize(f64::NAN, kind, None);
            assert!(nan.value.is_nan());
            let inf = humanize(f64::INFINITY, kind, None);
            assert!(inf.value.is_infinite());
        }
    }
}
