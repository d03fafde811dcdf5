// SPDX-License-Identifier: Apache-2.0

//! Comparison options, optionally loaded from TOML.
//!
//! ```toml
//! threshold = 0.9
//! iterations = 3
//! dump_intermediate = true
//! ```

use serde::Deserialize;

use crate::error::GimpleError;

pub const DEFAULT_THRESHOLD: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareOptions {
    /// A covering variable set is accepted when its similarity strictly
    /// exceeds this value. Must be in (0, 1].
    pub threshold: f64,

    /// Upper bound on correlate-and-rename passes. Passes stop early once
    /// renaming no longer changes anything.
    pub iterations: usize,

    /// Log the renamed IR after every pass at debug level.
    pub dump_intermediate: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            threshold: DEFAULT_THRESHOLD,
            iterations: 1,
            dump_intermediate: false,
        }
    }
}

impl CompareOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, GimpleError> {
        let options: CompareOptions =
            toml::from_str(text).map_err(|e| GimpleError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), GimpleError> {
        // Written so that NaN fails too.
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(GimpleError::InvalidThreshold(self.threshold));
        }
        if self.iterations == 0 {
            return Err(GimpleError::InvalidIterations(self.iterations));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let options = CompareOptions::default();
        assert_eq!(options.threshold, 0.95);
        assert_eq!(options.iterations, 1);
        assert!(!options.dump_intermediate);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            CompareOptions::from_toml_str("").unwrap(),
            CompareOptions::default()
        );
    }

    #[test]
    fn test_partial_toml() {
        let options = CompareOptions::from_toml_str("iterations = 4\n").unwrap();
        assert_eq!(
            options,
            CompareOptions {
                iterations: 4,
                ..CompareOptions::default()
            }
        );
    }

    #[test_case(0.0; "zero")]
    #[test_case(-0.5; "negative")]
    #[test_case(1.5; "above one")]
    #[test_case(f64::NAN; "nan")]
    fn test_invalid_threshold(threshold: f64) {
        let options = CompareOptions {
            threshold,
            ..CompareOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(GimpleError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_threshold_of_one_is_valid() {
        assert!(CompareOptions::from_toml_str("threshold = 1.0").is_ok());
    }

    #[test]
    fn test_zero_iterations() {
        assert_eq!(
            CompareOptions::from_toml_str("iterations = 0").unwrap_err(),
            GimpleError::InvalidIterations(0)
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(
            CompareOptions::from_toml_str("treshold = 0.9"),
            Err(GimpleError::Config(_))
        ));
    }
}
