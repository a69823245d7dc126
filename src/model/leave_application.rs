use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::leave_credit::BucketKind;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum LeaveCategory {
    Annual,
    Sick,
    Maternity,
    Bereavement,
    WorkFromHome,
}

impl LeaveCategory {
    /// The ledger bucket this category draws from. Work from home draws from none.
    pub fn bucket(self) -> Option<BucketKind> {
        match self {
            LeaveCategory::Annual => Some(BucketKind::Annual),
            LeaveCategory::Sick => Some(BucketKind::Sick),
            LeaveCategory::Maternity => Some(BucketKind::Maternity),
            LeaveCategory::Bereavement => Some(BucketKind::Bereavement),
            LeaveCategory::WorkFromHome => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr)]
pub enum DurationType {
    #[serde(rename = "fullday")]
    #[strum(serialize = "fullday")]
    FullDay,
    #[serde(rename = "halfday-morning")]
    #[strum(serialize = "halfday-morning")]
    HalfDayMorning,
    #[serde(rename = "halfday-evening")]
    #[strum(serialize = "halfday-evening")]
    HalfDayEvening,
}

impl DurationType {
    pub fn is_half_day(self) -> bool {
        !matches!(self, DurationType::FullDay)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// A leave request and, once decided, its review record.
///
/// Everything except the status and review fields is frozen at creation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveApplication {
    #[schema(example = 17)]
    pub id: u64,
    #[schema(example = 1001)]
    pub user_id: u64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    pub leave_category: LeaveCategory,
    pub duration_type: DurationType,
    #[schema(example = "9:30 AM to 6:30 PM")]
    pub time_slot: Option<String>,
    #[schema(example = "Family function")]
    pub description: String,
    #[schema(example = 3.0)]
    pub leave_days: f64,
    #[schema(example = 27.0)]
    pub hours: f64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: i32,
    pub is_loss_of_pay: bool,
    #[schema(example = 0.0)]
    pub loss_of_pay_days: f64,
    pub status: LeaveStatus,
    pub reviewed_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    #[schema(example = "2026-02-20T08:15:00Z", format = "date-time", value_type = String)]
    pub applied_at: DateTime<Utc>,
}

/// Insert form of an application, with the classification already frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveApplication {
    pub user_id: u64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub leave_category: LeaveCategory,
    pub duration_type: DurationType,
    pub time_slot: Option<String>,
    pub description: String,
    pub leave_days: f64,
    pub hours: f64,
    pub month: u32,
    pub year: i32,
    pub is_loss_of_pay: bool,
    pub loss_of_pay_days: f64,
}

/// The terminal transition applied by a reviewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub status: LeaveStatus,
    pub reviewed_by: u64,
    pub reviewed_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationFilter {
    pub user_id: Option<u64>,
    pub year: Option<i32>,
    pub status: Option<LeaveStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn category_names_match_wire_format() {
        assert_eq!(LeaveCategory::from_str("workFromHome").unwrap(), LeaveCategory::WorkFromHome);
        assert_eq!(LeaveCategory::Bereavement.to_string(), "bereavement");
        assert!(LeaveCategory::from_str("unpaid").is_err());
        assert_eq!(
            serde_json::to_value(LeaveCategory::WorkFromHome).unwrap(),
            serde_json::json!("workFromHome")
        );
    }

    #[test]
    fn duration_names_match_wire_format() {
        assert_eq!(DurationType::from_str("halfday-evening").unwrap(), DurationType::HalfDayEvening);
        assert_eq!(DurationType::FullDay.as_ref(), "fullday");
        assert!(DurationType::from_str("halfday").is_err());
    }

    #[test]
    fn only_work_from_home_has_no_bucket() {
        assert_eq!(LeaveCategory::WorkFromHome.bucket(), None);
        assert_eq!(LeaveCategory::Sick.bucket(), Some(BucketKind::Sick));
    }
}
