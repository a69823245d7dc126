use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

/// Yearly allocation of annual leave, one day per month.
pub const ANNUAL_LEAVE_DAYS: f64 = 12.0;

/// The four balance buckets of a ledger row.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BucketKind {
    Annual,
    Sick,
    Maternity,
    Bereavement,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LeaveBucket {
    pub total: f64,
    pub used: f64,
}

impl LeaveBucket {
    pub fn new(total: f64, used: f64) -> Self {
        Self { total, used }
    }

    /// Derived on read, never stored.
    pub fn remaining(&self) -> f64 {
        self.total - self.used
    }
}

/// One user's balances for one calendar year. Unique on `(user_id, year)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveCredit {
    pub id: u64,
    pub user_id: u64,
    pub year: i32,
    pub annual: LeaveBucket,
    pub sick: LeaveBucket,
    pub maternity: LeaveBucket,
    pub bereavement: LeaveBucket,
    pub loss_of_pay_count: f64,
    pub effective_from: NaiveDate,
    pub created_by: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl LeaveCredit {
    pub fn bucket(&self, kind: BucketKind) -> &LeaveBucket {
        match kind {
            BucketKind::Annual => &self.annual,
            BucketKind::Sick => &self.sick,
            BucketKind::Maternity => &self.maternity,
            BucketKind::Bereavement => &self.bereavement,
        }
    }

    pub fn bucket_mut(&mut self, kind: BucketKind) -> &mut LeaveBucket {
        match kind {
            BucketKind::Annual => &mut self.annual,
            BucketKind::Sick => &mut self.sick,
            BucketKind::Maternity => &mut self.maternity,
            BucketKind::Bereavement => &mut self.bereavement,
        }
    }
}

/// Insert form of a ledger row, as written by yearly provisioning.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveCredit {
    pub user_id: u64,
    pub year: i32,
    pub annual: LeaveBucket,
    pub sick: LeaveBucket,
    pub maternity: LeaveBucket,
    pub bereavement: LeaveBucket,
    pub effective_from: NaiveDate,
    pub created_by: u64,
}

impl NewLeaveCredit {
    /// Default entitlement: 12 annual days, no special leave, no loss of pay.
    pub fn yearly_default(user_id: u64, year: i32, effective_from: NaiveDate, created_by: u64) -> Self {
        Self {
            user_id,
            year,
            annual: LeaveBucket::new(ANNUAL_LEAVE_DAYS, 0.0),
            sick: LeaveBucket::default(),
            maternity: LeaveBucket::default(),
            bereavement: LeaveBucket::default(),
            effective_from,
            created_by,
        }
    }
}

/// Administrative edit of the special-leave totals. `None` leaves a bucket untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialTotals {
    #[schema(example = 5.0)]
    pub sick_leave: Option<f64>,
    pub maternity_leave: Option<f64>,
    #[schema(example = 3.0)]
    pub bereavement_leave: Option<f64>,
}

impl SpecialTotals {
    pub fn entries(&self) -> [(BucketKind, Option<f64>); 3] {
        [
            (BucketKind::Sick, self.sick_leave),
            (BucketKind::Maternity, self.maternity_leave),
            (BucketKind::Bereavement, self.bereavement_leave),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, total)| total.is_none())
    }
}
