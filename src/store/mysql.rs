use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use std::str::FromStr;

use super::LeaveStore;
use crate::error::{LeaveError, LeaveResult};
use crate::leave::ledger::{LedgerMutation, apply_special_totals, check_special_totals, settlement_for};
use crate::model::leave_application::{
    ApplicationFilter, LeaveApplication, LeaveCategory, LeaveStatus, NewLeaveApplication, Review,
};
use crate::model::leave_credit::{BucketKind, LeaveBucket, LeaveCredit, NewLeaveCredit, SpecialTotals};
use crate::model::role::Role;
use crate::model::user::User;

const USER_COLUMNS: &str = "id, name, email, password, role_id, is_active";

const CREDIT_COLUMNS: &str = r#"
    c.id, c.user_id, c.year,
    c.annual_total, c.annual_used,
    c.sick_total, c.sick_used,
    c.maternity_total, c.maternity_used,
    c.bereavement_total, c.bereavement_used,
    c.loss_of_pay_count, c.effective_from, c.created_by, c.created_at
"#;

const APPLICATION_COLUMNS: &str = r#"
    id, user_id, from_date, to_date, leave_category, duration_type, time_slot,
    description, leave_days, hours, month, year, is_loss_of_pay, loss_of_pay_days,
    status, reviewed_by, reviewed_at, rejection_reason, applied_at
"#;

/// MySQL duplicate-key SQLSTATE.
const DUPLICATE_KEY: &str = "23000";

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    email: String,
    password: String,
    role_id: u8,
    is_active: bool,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_id(row.role_id).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "role_id".to_string(),
            source: format!("unknown role id {}", row.role_id).into(),
        })?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            role,
            is_active: row.is_active,
        })
    }
}

#[derive(FromRow)]
struct CreditRow {
    id: u64,
    user_id: u64,
    year: i32,
    annual_total: f64,
    annual_used: f64,
    sick_total: f64,
    sick_used: f64,
    maternity_total: f64,
    maternity_used: f64,
    bereavement_total: f64,
    bereavement_used: f64,
    loss_of_pay_count: f64,
    effective_from: NaiveDate,
    created_by: Option<u64>,
    created_at: DateTime<Utc>,
}

impl From<CreditRow> for LeaveCredit {
    fn from(row: CreditRow) -> Self {
        LeaveCredit {
            id: row.id,
            user_id: row.user_id,
            year: row.year,
            annual: LeaveBucket::new(row.annual_total, row.annual_used),
            sick: LeaveBucket::new(row.sick_total, row.sick_used),
            maternity: LeaveBucket::new(row.maternity_total, row.maternity_used),
            bereavement: LeaveBucket::new(row.bereavement_total, row.bereavement_used),
            loss_of_pay_count: row.loss_of_pay_count,
            effective_from: row.effective_from,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: u64,
    user_id: u64,
    from_date: NaiveDate,
    to_date: NaiveDate,
    leave_category: String,
    duration_type: String,
    time_slot: Option<String>,
    description: String,
    leave_days: f64,
    hours: f64,
    month: u32,
    year: i32,
    is_loss_of_pay: bool,
    loss_of_pay_days: f64,
    status: String,
    reviewed_by: Option<u64>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    applied_at: DateTime<Utc>,
}

fn decode_column<T>(column: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = strum::ParseError>,
{
    value.parse().map_err(|e: strum::ParseError| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl TryFrom<ApplicationRow> for LeaveApplication {
    type Error = sqlx::Error;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(LeaveApplication {
            id: row.id,
            user_id: row.user_id,
            from_date: row.from_date,
            to_date: row.to_date,
            leave_category: decode_column("leave_category", &row.leave_category)?,
            duration_type: decode_column("duration_type", &row.duration_type)?,
            time_slot: row.time_slot,
            description: row.description,
            leave_days: row.leave_days,
            hours: row.hours,
            month: row.month,
            year: row.year,
            is_loss_of_pay: row.is_loss_of_pay,
            loss_of_pay_days: row.loss_of_pay_days,
            status: decode_column("status", &row.status)?,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            rejection_reason: row.rejection_reason,
            applied_at: row.applied_at,
        })
    }
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(DUPLICATE_KEY),
        _ => false,
    }
}

fn used_column(bucket: BucketKind) -> &'static str {
    match bucket {
        BucketKind::Annual => "annual_used",
        BucketKind::Sick => "sick_used",
        BucketKind::Maternity => "maternity_used",
        BucketKind::Bereavement => "bereavement_used",
    }
}

/// [`LeaveStore`] on a MySQL pool created and owned by `main`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl LeaveStore for MySqlStore {
    async fn find_user_by_email(&self, email: &str) -> LeaveResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_user(&self, id: u64) -> LeaveResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    async fn active_users_with_roles(&self, roles: &[Role]) -> LeaveResult<Vec<User>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<MySql>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = TRUE AND role_id IN ("
        ));
        let mut ids = query.separated(", ");
        for role in roles {
            ids.push_bind(role.id());
        }
        ids.push_unseparated(") ORDER BY id");

        let rows = query.build_query_as::<UserRow>().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn credits_exist_for_year(&self, year: i32) -> LeaveResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM leave_credits WHERE year = ? LIMIT 1)",
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn insert_credits(&self, credits: &[NewLeaveCredit]) -> LeaveResult<u64> {
        let Some(first) = credits.first() else {
            return Ok(0);
        };
        let year = first.year;

        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::<MySql>::new(
            r#"INSERT INTO leave_credits
            (user_id, year, annual_total, annual_used, sick_total, sick_used,
             maternity_total, maternity_used, bereavement_total, bereavement_used,
             loss_of_pay_count, effective_from, created_by) "#,
        );
        query.push_values(credits, |mut row, credit| {
            row.push_bind(credit.user_id)
                .push_bind(credit.year)
                .push_bind(credit.annual.total)
                .push_bind(credit.annual.used)
                .push_bind(credit.sick.total)
                .push_bind(credit.sick.used)
                .push_bind(credit.maternity.total)
                .push_bind(credit.maternity.used)
                .push_bind(credit.bereavement.total)
                .push_bind(credit.bereavement.used)
                .push_bind(0.0_f64)
                .push_bind(credit.effective_from)
                .push_bind(credit.created_by);
        });

        let result = query.build().execute(&mut *tx).await.map_err(|e| {
            if is_duplicate_key(&e) {
                LeaveError::AlreadyProvisioned(year)
            } else {
                LeaveError::Storage(e)
            }
        })?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn find_credit(&self, user_id: u64, year: i32) -> LeaveResult<Option<LeaveCredit>> {
        let row = sqlx::query_as::<_, CreditRow>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM leave_credits c WHERE c.user_id = ? AND c.year = ?"
        ))
        .bind(user_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LeaveCredit::from))
    }

    async fn list_credits(&self, year: i32) -> LeaveResult<Vec<LeaveCredit>> {
        let rows = sqlx::query_as::<_, CreditRow>(&format!(
            r#"
            SELECT {CREDIT_COLUMNS}
            FROM leave_credits c
            JOIN users u ON u.id = c.user_id
            WHERE c.year = ? AND u.role_id <> ?
            ORDER BY c.created_at DESC, c.id DESC
            "#
        ))
        .bind(year)
        .bind(Role::SuperAdmin.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LeaveCredit::from).collect())
    }

    async fn update_special_totals(&self, credit_id: u64, totals: &SpecialTotals) -> LeaveResult<LeaveCredit> {
        let mut tx = self.pool.begin().await?;

        let mut credit: LeaveCredit = sqlx::query_as::<_, CreditRow>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM leave_credits c WHERE c.id = ? FOR UPDATE"
        ))
        .bind(credit_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(LeaveCredit::from)
        .ok_or_else(|| LeaveError::NotFound(format!("Leave credit {credit_id}")))?;

        check_special_totals(&credit, totals)?;
        apply_special_totals(&mut credit, totals);

        sqlx::query(
            r#"
            UPDATE leave_credits
            SET sick_total = ?, maternity_total = ?, bereavement_total = ?
            WHERE id = ?
            "#,
        )
        .bind(credit.sick.total)
        .bind(credit.maternity.total)
        .bind(credit.bereavement.total)
        .bind(credit_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(credit)
    }

    async fn count_approved_annual(&self, user_id: u64, year: i32, month: u32) -> LeaveResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM leave_applications
            WHERE user_id = ? AND year = ? AND month = ?
            AND leave_category = ? AND status = ?
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(month)
        .bind(LeaveCategory::Annual.as_ref())
        .bind(LeaveStatus::Approved.as_ref())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn insert_application(&self, new: &NewLeaveApplication) -> LeaveResult<LeaveApplication> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_applications
                (user_id, from_date, to_date, leave_category, duration_type, time_slot,
                 description, leave_days, hours, month, year, is_loss_of_pay,
                 loss_of_pay_days, status, applied_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.from_date)
        .bind(new.to_date)
        .bind(new.leave_category.as_ref())
        .bind(new.duration_type.as_ref())
        .bind(new.time_slot.as_deref())
        .bind(&new.description)
        .bind(new.leave_days)
        .bind(new.hours)
        .bind(new.month)
        .bind(new.year)
        .bind(new.is_loss_of_pay)
        .bind(new.loss_of_pay_days)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_application(id)
            .await?
            .ok_or_else(|| LeaveError::NotFound(format!("Leave application {id}")))
    }

    async fn find_application(&self, id: u64) -> LeaveResult<Option<LeaveApplication>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM leave_applications WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LeaveApplication::try_from).transpose()?)
    }

    async fn list_applications(&self, filter: &ApplicationFilter) -> LeaveResult<Vec<LeaveApplication>> {
        let mut query = QueryBuilder::<MySql>::new(format!(
            "SELECT {APPLICATION_COLUMNS} FROM leave_applications WHERE 1=1"
        ));

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(year) = filter.year {
            query.push(" AND year = ").push_bind(year);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.to_string());
        }
        query.push(" ORDER BY applied_at DESC, id DESC");

        let rows = query.build_query_as::<ApplicationRow>().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(LeaveApplication::try_from)
            .collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn settle_application(&self, id: u64, review: &Review) -> LeaveResult<LeaveApplication> {
        // Dropping `tx` on any early return rolls the decision back.
        let mut tx = self.pool.begin().await?;

        let mut application: LeaveApplication = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM leave_applications WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .map(LeaveApplication::try_from)
        .transpose()?
        .ok_or_else(|| LeaveError::NotFound(format!("Leave application {id}")))?;

        if application.status.is_terminal() {
            return Err(LeaveError::InvalidTransition { id, status: application.status });
        }

        let updated = sqlx::query(
            r#"
            UPDATE leave_applications
            SET status = ?, reviewed_by = ?, reviewed_at = ?, rejection_reason = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(review.status.as_ref())
        .bind(review.reviewed_by)
        .bind(review.reviewed_at)
        .bind(review.rejection_reason.as_deref())
        .bind(id)
        .bind(LeaveStatus::Pending.as_ref())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(LeaveError::InvalidTransition { id, status: application.status });
        }

        application.status = review.status;
        application.reviewed_by = Some(review.reviewed_by);
        application.reviewed_at = Some(review.reviewed_at);
        application.rejection_reason = review.rejection_reason.clone();

        if application.status == LeaveStatus::Approved {
            let (user_id, year) = (application.user_id, application.year);

            let credit_id = sqlx::query_scalar::<_, u64>(
                "SELECT id FROM leave_credits WHERE user_id = ? AND year = ? FOR UPDATE",
            )
            .bind(user_id)
            .bind(year)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(LeaveError::CreditMissing { user_id, year })?;

            let increment = match settlement_for(&application) {
                LedgerMutation::Nothing => None,
                LedgerMutation::LossOfPay(days) => Some(("loss_of_pay_count", days)),
                LedgerMutation::Consume { bucket, days } => Some((used_column(bucket), days)),
            };

            if let Some((column, days)) = increment {
                sqlx::query(&format!(
                    "UPDATE leave_credits SET {column} = {column} + ? WHERE id = ?"
                ))
                .bind(days)
                .bind(credit_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(application)
    }
}
