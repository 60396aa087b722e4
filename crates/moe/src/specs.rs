use bitflags::bitflags;
use sego_gp::{CorrelationModel, RegressionModel};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags to specify tested regression models during experts selection (see [`crate::GpMixtureParams::regression_spec`]).
    ///
    /// Flags can be combine with bit-wise `or` operator to select two or more models.
    /// ```ignore
    /// let spec = RegressionSpec::CONSTANT | RegressionSpec::LINEAR;
    /// ```
    ///
    /// See [bitflags::bitflags]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RegressionSpec: u8 {
        /// Constant regression
        const CONSTANT = 0x01;
        /// Linear regression
        const LINEAR = 0x02;
        /// 2-degree polynomial regression
        const QUADRATIC = 0x04;
        /// All regression models available
        const ALL = RegressionSpec::CONSTANT.bits()
                    | RegressionSpec::LINEAR.bits()
                    | RegressionSpec::QUADRATIC.bits();
    }
}

bitflags! {
    /// Flags to specify tested correlation models during experts selection (see [`crate::GpMixtureParams::correlation_spec`]).
    ///
    /// Flags can be combine with bit-wise `or` operator to select two or more models.
    /// ```ignore
    /// let spec = CorrelationSpec::MATERN32 | CorrelationSpec::MATERN52;
    /// ```
    ///
    /// See [bitflags::bitflags]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CorrelationSpec: u8 {
        /// Squared exponential correlation model
        const SQUARED_EXPONENTIAL = 0x01;
        /// Absolute exponential correlation model
        const ABSOLUTE_EXPONENTIAL = 0x02;
        /// Matern 3/2 correlation model
        const MATERN32 = 0x04;
        /// Matern 5/2 correlation model
        const MATERN52 = 0x08;
        /// All correlation models available
        const ALL = CorrelationSpec::SQUARED_EXPONENTIAL.bits()
                    | CorrelationSpec::ABSOLUTE_EXPONENTIAL.bits()
                    | CorrelationSpec::MATERN32.bits()
                    | CorrelationSpec::MATERN52.bits();
    }
}

impl RegressionSpec {
    /// Regression models enabled by this specification
    pub fn models(&self) -> Vec<RegressionModel> {
        [
            (RegressionSpec::CONSTANT, RegressionModel::Constant),
            (RegressionSpec::LINEAR, RegressionModel::Linear),
            (RegressionSpec::QUADRATIC, RegressionModel::Quadratic),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, model)| model)
        .collect()
    }
}

impl CorrelationSpec {
    /// Correlation models enabled by this specification
    pub fn models(&self) -> Vec<CorrelationModel> {
        [
            (
                CorrelationSpec::SQUARED_EXPONENTIAL,
                CorrelationModel::SquaredExponential,
            ),
            (
                CorrelationSpec::ABSOLUTE_EXPONENTIAL,
                CorrelationModel::AbsoluteExponential,
            ),
            (CorrelationSpec::MATERN32, CorrelationModel::Matern32),
            (CorrelationSpec::MATERN52, CorrelationModel::Matern52),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, model)| model)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_models() {
        assert_eq!(RegressionSpec::ALL.models().len(), 3);
        assert_eq!(CorrelationSpec::ALL.models().len(), 4);
        assert_eq!(
            (RegressionSpec::CONSTANT | RegressionSpec::QUADRATIC).models(),
            vec![RegressionModel::Constant, RegressionModel::Quadratic]
        );
        assert_eq!(
            CorrelationSpec::MATERN52.models(),
            vec![CorrelationModel::Matern52]
        );
        assert!(CorrelationSpec::empty().models().is_empty());
    }
}
