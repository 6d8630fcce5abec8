use crate::data::operator::KeyFrame;
use crate::stats::attributes::AttributeKey;
use crate::stats::error::StatsError;

/// Round to the nearest integer, halves toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Linear interpolation of `key` between the first two keyframes.
///
/// `min_level` is the level the low keyframe stands for (1 for phase
/// curves, 0 for the trust curve). Every attribute except
/// `baseAttackTime` is rounded to an integer.
pub fn interpolate(
    frames: &[KeyFrame],
    level: u32,
    min_level: u32,
    key: AttributeKey,
) -> Result<f64, StatsError> {
    let [low, high, ..] = frames else {
        return Err(StatsError::MissingKeyframes {
            attribute: key.as_str(),
            found: frames.len(),
        });
    };
    if high.level == low.level {
        return Err(StatsError::MalformedKeyframeData {
            attribute: key.as_str(),
            level: low.level,
        });
    }

    let span = f64::from(high.level) - f64::from(low.level);
    let offset = f64::from(level) - f64::from(min_level);
    let from = low.data.get(key);
    let to = high.data.get(key);
    let value = from + offset / span * (to - from);

    Ok(if key.is_rounded() {
        round_half_up(value)
    } else {
        value
    })
}
