//! Shared enums used across sarprep: `MaskDirection` for the Land-Sea-Mask
//! stage and `CalibrationBand` for the radiometric calibration stage.
use serde::{Deserialize, Serialize};

/// What the Land-Sea-Mask stage removes from the scene.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskDirection {
    Sea,
    Land,
}

impl MaskDirection {
    /// Value of the SNAP `landMask` parameter: masking the sea keeps land
    /// (`false`), masking the land keeps sea (`true`).
    pub fn land_mask_flag(self) -> &'static str {
        match self {
            MaskDirection::Sea => "false",
            MaskDirection::Land => "true",
        }
    }
}

impl std::fmt::Display for MaskDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaskDirection::Sea => write!(f, "sea"),
            MaskDirection::Land => write!(f, "land"),
        }
    }
}

/// Backscatter convention produced by the calibration stage.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationBand {
    Sigma,
    Gamma,
    Beta,
}

impl CalibrationBand {
    /// SNAP band name prefix, e.g. `Sigma0_VV`.
    pub fn band_type(self) -> &'static str {
        match self {
            CalibrationBand::Sigma => "Sigma0",
            CalibrationBand::Gamma => "Gamma0",
            CalibrationBand::Beta => "Beta0",
        }
    }

    /// One-hot (`sigma`, `gamma`, `beta`) output flags for the calibration node.
    pub fn one_hot(self) -> (&'static str, &'static str, &'static str) {
        match self {
            CalibrationBand::Sigma => ("true", "false", "false"),
            CalibrationBand::Gamma => ("false", "true", "false"),
            CalibrationBand::Beta => ("false", "false", "true"),
        }
    }
}

impl std::fmt::Display for CalibrationBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.band_type())
    }
}
