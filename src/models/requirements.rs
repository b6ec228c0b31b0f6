use serde::{Deserialize, Serialize};

/// Upper bound of the budget slider, in units of 10,000 KRW (i.e. 1억 원).
pub const BUDGET_MAX: u32 = 10_000;

/// Budget slider step; min and max handles must stay one step apart.
pub const BUDGET_STEP: u32 = 500;

/// Number of pages in the provisioning form.
pub const FORM_STEPS: u8 = 3;

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// The requirements document produced by the provisioning form.
///
/// Persisted as a JSON column on the project, write-once at creation.
/// Every field has a serde default so that sparse documents written by
/// older clients still parse; empty fields are skipped on serialization so
/// the stored document only carries what the user actually answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    /// Target development stage (아이디어 구체화 / 2D·3D 시각화 / ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub goal: String,
    /// Product categories; may include the 기타 option.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Free-text category, required when 기타 is among `categories`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub other_category: String,
    /// Budget lower bound, 만 원 units.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub budget_min: u32,
    /// Budget upper bound, 만 원 units.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub budget_max: u32,
    /// Expected physical size bracket.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub size: String,
    /// Desired capabilities; may include the 기타 option.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Free-text feature, required when 기타 is among `features`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub other_feature: String,
    /// Target completion window (1주 .. 1년 +).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub duration: String,
    /// Intended use (개인 소장, 대량 판매, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    /// Free-text product idea from the final step.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub idea: String,
}

/// The checkbox option that unlocks a free-text input.
pub const OTHER_OPTION: &str = "기타 (직접 입력)";

impl Requirements {
    /// Whether the document carries no answers at all. A project created
    /// outside the provisioning flow (or a failed context fetch) shows up
    /// as empty requirements.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Cross-field validation for one page of the form.
    ///
    /// Mirrors the form's gating: the 다음 button stays locked until the
    /// current page validates. Steps outside `1..=FORM_STEPS` never pass.
    pub fn step_valid(&self, step: u8) -> bool {
        match step {
            1 => {
                let other_ok = !self.categories.iter().any(|c| c == OTHER_OPTION)
                    || !self.other_category.trim().is_empty();
                !self.goal.is_empty()
                    && !self.categories.is_empty()
                    && other_ok
                    && self.budget_valid()
            }
            2 => {
                let other_ok = !self.features.iter().any(|f| f == OTHER_OPTION)
                    || !self.other_feature.trim().is_empty();
                !self.size.is_empty()
                    && !self.features.is_empty()
                    && other_ok
                    && !self.duration.is_empty()
                    && !self.usage.is_empty()
            }
            3 => !self.idea.trim().is_empty(),
            _ => false,
        }
    }

    /// Whether every page of the form validates. The provisioning endpoint
    /// rejects documents that would not have made it past the form.
    pub fn complete(&self) -> bool {
        (1..=FORM_STEPS).all(|step| self.step_valid(step))
    }

    /// Clamp a new lower budget handle against the upper one.
    pub fn clamp_budget_min(&self, value: u32) -> u32 {
        value.min(self.budget_max.saturating_sub(BUDGET_STEP))
    }

    /// Clamp a new upper budget handle against the lower one.
    pub fn clamp_budget_max(&self, value: u32) -> u32 {
        value.max(self.budget_min + BUDGET_STEP).min(BUDGET_MAX)
    }

    /// A budget range the slider could actually produce: both handles are
    /// fixed points of their own clamps, i.e. min ≤ max − step and
    /// max ≤ the slider ceiling.
    pub fn budget_valid(&self) -> bool {
        self.budget_min == self.clamp_budget_min(self.budget_min)
            && self.budget_max == self.clamp_budget_max(self.budget_max)
    }
}
