use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

use crate::config::Config;

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    password VARCHAR(255) NOT NULL,
    role_id TINYINT UNSIGNED NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE KEY uq_users_email (email)
)
"#;

const CREATE_LEAVE_CREDITS: &str = r#"
CREATE TABLE IF NOT EXISTS leave_credits (
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    user_id BIGINT UNSIGNED NOT NULL,
    year INT NOT NULL,
    annual_total DOUBLE NOT NULL DEFAULT 12,
    annual_used DOUBLE NOT NULL DEFAULT 0,
    sick_total DOUBLE NOT NULL DEFAULT 0,
    sick_used DOUBLE NOT NULL DEFAULT 0,
    maternity_total DOUBLE NOT NULL DEFAULT 0,
    maternity_used DOUBLE NOT NULL DEFAULT 0,
    bereavement_total DOUBLE NOT NULL DEFAULT 0,
    bereavement_used DOUBLE NOT NULL DEFAULT 0,
    loss_of_pay_count DOUBLE NOT NULL DEFAULT 0,
    effective_from DATE NOT NULL,
    created_by BIGINT UNSIGNED NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_leave_credits_user_year (user_id, year),
    KEY idx_leave_credits_year (year),
    CONSTRAINT fk_leave_credits_user FOREIGN KEY (user_id) REFERENCES users (id)
)
"#;

const CREATE_LEAVE_APPLICATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS leave_applications (
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    user_id BIGINT UNSIGNED NOT NULL,
    from_date DATE NOT NULL,
    to_date DATE NOT NULL,
    leave_category VARCHAR(32) NOT NULL,
    duration_type VARCHAR(32) NOT NULL,
    time_slot VARCHAR(255) NULL,
    description TEXT NOT NULL,
    leave_days DOUBLE NOT NULL,
    hours DOUBLE NOT NULL,
    month INT UNSIGNED NOT NULL,
    year INT NOT NULL,
    is_loss_of_pay BOOLEAN NOT NULL DEFAULT FALSE,
    loss_of_pay_days DOUBLE NOT NULL DEFAULT 0,
    status VARCHAR(16) NOT NULL DEFAULT 'pending',
    reviewed_by BIGINT UNSIGNED NULL,
    reviewed_at TIMESTAMP NULL,
    rejection_reason TEXT NULL,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    KEY idx_leave_applications_user_period (user_id, year, month, status),
    KEY idx_leave_applications_queue (status, applied_at),
    CONSTRAINT fk_leave_applications_user FOREIGN KEY (user_id) REFERENCES users (id)
)
"#;

const MIGRATIONS: [&str; 3] = [CREATE_USERS, CREATE_LEAVE_CREDITS, CREATE_LEAVE_APPLICATIONS];

/// Opens the pool owned by the process entry point.
pub async fn init_db(config: &Config) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
}

/// Creates missing tables. Safe to run on every start.
pub async fn migrate(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema is up to date");
    Ok(())
}
