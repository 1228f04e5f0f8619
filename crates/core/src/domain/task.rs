use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::matching::ParamTag;
use crate::errors::TaskValidationError;
use crate::normalize::PeriodGranularity;
use crate::rfm::Segment;

/// Declarative description of one focus task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDefinition {
    pub id: Option<String>,
    pub name: Option<String>,
    pub focus_products: BTreeSet<String>,
    pub date_range: Option<DateRange>,
    pub parameters: ParameterConfig,
}

/// Inclusive calendar-day bounds applied to the ledger before evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, value: NaiveDateTime) -> bool {
        let after_start = self.from.map_or(true, |from| value >= from.and_time(NaiveTime::MIN));
        let before_end = self.to.map_or(true, |to| value.date() <= to);
        after_start && before_end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterConfig {
    pub param1: LapsedBuyerConfig,
    pub param2: QuietDaysConfig,
    pub param3: LowFrequencyConfig,
    pub param4: LowSpendConfig,
    pub param5: SegmentFilterConfig,
    pub param6: LookalikeConfig,
    pub param7: SubstituteBuyerConfig,
}

impl ParameterConfig {
    pub fn is_enabled(&self, tag: ParamTag) -> bool {
        match tag {
            ParamTag::Param1 => self.param1.enabled,
            ParamTag::Param2 => self.param2.enabled,
            ParamTag::Param3 => self.param3.enabled,
            ParamTag::Param4 => self.param4.enabled,
            ParamTag::Param5 => self.param5.enabled,
            ParamTag::Param6 => self.param6.enabled,
            ParamTag::Param7 => self.param7.enabled,
        }
    }

    /// Enabled parameters in ascending parameter order.
    pub fn enabled(&self) -> Vec<ParamTag> {
        ParamTag::ALL.into_iter().filter(|tag| self.is_enabled(*tag)).collect()
    }
}

/// Param1: bought in the previous period, nothing in the current one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapsedBuyerConfig {
    pub enabled: bool,
    pub period: PeriodGranularity,
}

/// Param2: no focus purchase for at least `days` days.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietDaysConfig {
    pub enabled: bool,
    pub days: u32,
}

impl Default for QuietDaysConfig {
    fn default() -> Self {
        Self { enabled: false, days: 30 }
    }
}

/// Param3: fewer than `frequency` focus transactions per active month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowFrequencyConfig {
    pub enabled: bool,
    pub frequency: f64,
}

impl Default for LowFrequencyConfig {
    fn default() -> Self {
        Self { enabled: false, frequency: 1.0 }
    }
}

/// Param4: average monthly focus spend below `amount`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowSpendConfig {
    pub enabled: bool,
    pub amount: f64,
}

impl Default for LowSpendConfig {
    fn default() -> Self {
        Self { enabled: false, amount: 1000.0 }
    }
}

/// Param5: RFM segment membership.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentFilterConfig {
    pub enabled: bool,
    pub segments: BTreeSet<Segment>,
}

impl Default for SegmentFilterConfig {
    fn default() -> Self {
        Self { enabled: false, segments: BTreeSet::from([Segment::Inactive]) }
    }
}

/// Param6: same-sphere clients resembling focus buyers, in percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookalikeConfig {
    pub enabled: bool,
    pub similarity: f64,
}

impl Default for LookalikeConfig {
    fn default() -> Self {
        Self { enabled: false, similarity: 80.0 }
    }
}

/// Param7: buys any product in `x_products`, never a focus product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstituteBuyerConfig {
    pub enabled: bool,
    pub x_products: BTreeSet<String>,
}

impl TaskDefinition {
    /// Focus codes with surrounding whitespace and blanks removed.
    pub fn focus_set(&self) -> BTreeSet<String> {
        clean_codes(&self.focus_products)
    }

    /// Rejects a task that cannot be evaluated meaningfully.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.focus_set().is_empty() {
            return Err(TaskValidationError::MissingFocusProducts);
        }

        let parameters = &self.parameters;
        if parameters.enabled().is_empty() {
            return Err(TaskValidationError::NoEnabledParameters);
        }

        if let Some(DateRange { from: Some(from), to: Some(to) }) = self.date_range {
            if from > to {
                return Err(TaskValidationError::InvertedDateRange { from, to });
            }
        }

        if parameters.param3.enabled && !is_non_negative(parameters.param3.frequency) {
            return Err(TaskValidationError::InvalidThreshold {
                param: ParamTag::Param3,
                field: "frequency",
                value: parameters.param3.frequency,
            });
        }

        if parameters.param4.enabled && !is_non_negative(parameters.param4.amount) {
            return Err(TaskValidationError::InvalidThreshold {
                param: ParamTag::Param4,
                field: "amount",
                value: parameters.param4.amount,
            });
        }

        if parameters.param5.enabled && parameters.param5.segments.is_empty() {
            return Err(TaskValidationError::EmptySegmentSet);
        }

        let similarity = parameters.param6.similarity;
        if parameters.param6.enabled && !(0.0..=100.0).contains(&similarity) {
            return Err(TaskValidationError::InvalidThreshold {
                param: ParamTag::Param6,
                field: "similarity",
                value: similarity,
            });
        }

        if parameters.param7.enabled && clean_codes(&parameters.param7.x_products).is_empty() {
            return Err(TaskValidationError::EmptySubstituteSet);
        }

        Ok(())
    }
}

pub(crate) fn clean_codes(codes: &BTreeSet<String>) -> BTreeSet<String> {
    codes
        .iter()
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
