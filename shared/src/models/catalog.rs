//! Read models for LMS entities owned by other parts of the system

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Student as seen by the certificate subsystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentRecord {
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
}

/// Course as seen by the certificate subsystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseRecord {
    pub id: i64,
    pub title: String,
    pub duration_hours: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub instructor_names: Vec<String>,
}
