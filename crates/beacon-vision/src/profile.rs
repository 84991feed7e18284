use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("unknown profile field '{0}' (expected r, g, b, dist or conv)")]
    UnknownField(String),

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{field} = {value} outside [0, 1]")]
    OutOfRange { field: ProfileField, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    R,
    G,
    B,
    Distance,
    Convolution,
}

impl FromStr for ProfileField {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" => Ok(ProfileField::R),
            "g" => Ok(ProfileField::G),
            "b" => Ok(ProfileField::B),
            "dist" | "distance" => Ok(ProfileField::Distance),
            "conv" | "convolution" => Ok(ProfileField::Convolution),
            other => Err(ProfileError::UnknownField(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProfileField::R => "r",
            ProfileField::G => "g",
            ProfileField::B => "b",
            ProfileField::Distance => "dist",
            ProfileField::Convolution => "conv",
        };
        f.write_str(s)
    }
}

/// What the detector matches against.
///
/// `r`, `g`, `b` are chromaticity ratios: each channel divided by the channel
/// sum, so a neutral gray is `(1/3, 1/3, 1/3)` regardless of brightness.
///
/// Ratios taken against average brightness (`channel / ((r+g+b)/3)`, gray at
/// `1.0`) are three times these and do not pass `validate`. Divide such values
/// and their distance threshold by 3: `0.4 / 1.85 / 0.7` with threshold `0.48`
/// becomes roughly `0.133 / 0.617 / 0.233` with threshold `0.16`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetProfile {
    pub r: f64,
    pub g: f64,
    pub b: f64,

    /// Max normalized chromaticity distance for a pixel to match.
    pub distance_threshold: f64,
    /// Min smoothed match density for a region to be kept.
    pub convolution_threshold: f64,
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self {
            r: 0.188,
            g: 0.494,
            b: 0.360,
            distance_threshold: 0.06,
            convolution_threshold: 0.5,
        }
    }
}

impl TargetProfile {
    /// Profile matching exactly the chromaticity of one RGB color.
    pub fn from_rgb(rgb: [u8; 3], distance_threshold: f64, convolution_threshold: f64) -> Self {
        let sum = rgb.iter().map(|&c| c as f64).sum::<f64>().max(1.0);
        Self {
            r: rgb[0] as f64 / sum,
            g: rgb[1] as f64 / sum,
            b: rgb[2] as f64 / sum,
            distance_threshold,
            convolution_threshold,
        }
    }

    pub fn get(&self, field: ProfileField) -> f64 {
        match field {
            ProfileField::R => self.r,
            ProfileField::G => self.g,
            ProfileField::B => self.b,
            ProfileField::Distance => self.distance_threshold,
            ProfileField::Convolution => self.convolution_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        for field in [
            ProfileField::R,
            ProfileField::G,
            ProfileField::B,
            ProfileField::Distance,
            ProfileField::Convolution,
        ] {
            check_unit(field, self.get(field))?;
        }
        Ok(())
    }

    /// Apply one operator edit. The receiver is untouched on error, so callers
    /// keep the last good profile simply by ignoring the `Err`.
    pub fn with_field(&self, field: ProfileField, text: &str) -> Result<Self, ProfileError> {
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|_| ProfileError::NotANumber(text.trim().to_string()))?;
        check_unit(field, value)?;

        let mut next = *self;
        match field {
            ProfileField::R => next.r = value,
            ProfileField::G => next.g = value,
            ProfileField::B => next.b = value,
            ProfileField::Distance => next.distance_threshold = value,
            ProfileField::Convolution => next.convolution_threshold = value,
        }
        Ok(next)
    }
}

fn check_unit(field: ProfileField, value: f64) -> Result<(), ProfileError> {
    // NaN fails the range check too
    if !(0.0..=1.0).contains(&value) {
        return Err(ProfileError::OutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        TargetProfile::default().validate().unwrap();
    }

    #[test]
    fn edits_replace_a_single_field() {
        let p = TargetProfile::default();
        let next = p.with_field("dist".parse().unwrap(), " 0.12 ").unwrap();
        assert_eq!(next.distance_threshold, 0.12);
        assert_eq!(next.r, p.r);
        assert_eq!(next.convolution_threshold, p.convolution_threshold);
    }

    #[test]
    fn malformed_edits_are_rejected() {
        let p = TargetProfile::default();
        assert!(matches!(p.with_field(ProfileField::R, "0.4x"), Err(ProfileError::NotANumber(_))));
        assert!(matches!(p.with_field(ProfileField::G, ""), Err(ProfileError::NotANumber(_))));
        assert!(matches!(p.with_field(ProfileField::B, "NaN"), Err(ProfileError::OutOfRange { .. })));
        assert!(matches!(p.with_field(ProfileField::Distance, "1.5"), Err(ProfileError::OutOfRange { .. })));
        assert!(matches!("hue".parse::<ProfileField>(), Err(ProfileError::UnknownField(_))));
    }

    #[test]
    fn from_rgb_yields_unit_ratios() {
        let p = TargetProfile::from_rgb([40, 200, 80], 0.06, 0.5);
        assert!((p.r + p.g + p.b - 1.0).abs() < 1e-12);
        assert!((p.g - 0.625).abs() < 1e-12);
        p.validate().unwrap();
    }
}
