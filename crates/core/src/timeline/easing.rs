//! Easing curves, named the way stylesheet and tween configs name them.

use serde::{Deserialize, Serialize};

/// An easing curve mapping `t` in [0, 1] to [0, 1] with `f(0) = 0`, `f(1) = 1`.
///
/// Serialized as `"none"`, `"power2.out"`, `"sine.inOut"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    #[serde(rename = "none")]
    Linear,
    #[serde(rename = "power1.in")]
    Power1In,
    #[serde(rename = "power1.out")]
    Power1Out,
    #[serde(rename = "power1.inOut")]
    Power1InOut,
    #[serde(rename = "power2.in")]
    Power2In,
    #[serde(rename = "power2.out")]
    Power2Out,
    #[serde(rename = "power2.inOut")]
    Power2InOut,
    #[serde(rename = "power3.in")]
    Power3In,
    #[serde(rename = "power3.out")]
    Power3Out,
    #[serde(rename = "power3.inOut")]
    Power3InOut,
    #[serde(rename = "power4.in")]
    Power4In,
    #[serde(rename = "power4.out")]
    Power4Out,
    #[serde(rename = "sine.inOut")]
    SineInOut,
}

#[inline]
fn power_in(t: f64, exp: i32) -> f64 {
    t.powi(exp)
}

#[inline]
fn power_out(t: f64, exp: i32) -> f64 {
    1.0 - (1.0 - t).powi(exp)
}

#[inline]
fn power_in_out(t: f64, exp: i32) -> f64 {
    if t < 0.5 {
        power_in(2.0 * t, exp) / 2.0
    } else {
        1.0 - power_in(2.0 - 2.0 * t, exp) / 2.0
    }
}

impl Easing {
    /// Evaluate the curve. Input is clamped, so callers may pass raw ratios.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::Power1In => power_in(t, 2),
            Easing::Power1Out => power_out(t, 2),
            Easing::Power1InOut => power_in_out(t, 2),
            Easing::Power2In => power_in(t, 3),
            Easing::Power2Out => power_out(t, 3),
            Easing::Power2InOut => power_in_out(t, 3),
            Easing::Power3In => power_in(t, 4),
            Easing::Power3Out => power_out(t, 4),
            Easing::Power3InOut => power_in_out(t, 4),
            Easing::Power4In => power_in(t, 5),
            Easing::Power4Out => power_out(t, 5),
            Easing::SineInOut => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 13] = [
        Easing::Linear,
        Easing::Power1In,
        Easing::Power1Out,
        Easing::Power1InOut,
        Easing::Power2In,
        Easing::Power2Out,
        Easing::Power2InOut,
        Easing::Power3In,
        Easing::Power3Out,
        Easing::Power3InOut,
        Easing::Power4In,
        Easing::Power4Out,
        Easing::SineInOut,
    ];

    #[test]
    fn endpoints_are_fixed() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-12, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12, "{easing:?}");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for easing in ALL {
            let mut previous = 0.0;
            for i in 1..=100 {
                let v = easing.apply(f64::from(i) / 100.0);
                assert!(v >= previous - 1e-12, "{easing:?} at {i}");
                previous = v;
            }
        }
    }

    #[test]
    fn out_curves_lead_in_curves() {
        assert!(Easing::Power2Out.apply(0.3) > Easing::Linear.apply(0.3));
        assert!(Easing::Power2In.apply(0.3) < Easing::Linear.apply(0.3));
    }

    #[test]
    fn parses_config_names() {
        let e: Easing = serde_json::from_str("\"power3.out\"").unwrap_or_default();
        assert_eq!(e, Easing::Power3Out);
        let e: Easing = serde_json::from_str("\"none\"").unwrap_or(Easing::Power1In);
        assert_eq!(e, Easing::Linear);
    }
}
