#![allow(dead_code)]

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use sqlx::SqlitePool;
use std::env;
use tempfile::TempDir;
use uuid::Uuid;

use leave_portal::config::{Config, LeavePolicy};
use leave_portal::database::init_database;
use leave_portal::database::models::{
    DepartmentType, EmployeeStatus, Gender, LeaveRequestInput, LeaveType, Role,
};
use leave_portal::error::AppError;
use leave_portal::handlers::shared::ApiResponse;
use leave_portal::services::auth::{Actor, issue_token};
use leave_portal::{AppState, CalendarService, DecisionLedger, LeaveService};

// Test database wrapper
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let pool = init_database(&database_url).await?;

        Ok(TestDb {
            pool,
            _temp_dir: temp_dir,
        })
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn insert_department(pool: &SqlitePool, department_type: DepartmentType) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO departments (id, name, department_type) VALUES (?, ?, ?)")
        .bind(id)
        .bind(format!("{} {}", department_type, &id.to_string()[..8]))
        .bind(department_type)
        .execute(pool)
        .await
        .expect("Failed to insert test department");
    id
}

/// Employee row as the provisioning service would have written it.
#[derive(Debug, Clone)]
pub struct EmployeeSeed {
    pub role: Role,
    pub department_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub gender: Gender,
    pub hire_date: NaiveDate,
    pub base_allowance: Option<i64>,
    pub status: EmployeeStatus,
}

impl EmployeeSeed {
    pub fn new(role: Role, department_id: Option<Uuid>) -> Self {
        Self {
            role,
            department_id,
            service_id: None,
            gender: Gender::Female,
            hire_date: Utc::now().date_naive() - Duration::days(400),
            base_allowance: None,
            status: EmployeeStatus::Active,
        }
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn service(mut self, service_id: Uuid) -> Self {
        self.service_id = Some(service_id);
        self
    }

    pub fn hired(mut self, hire_date: NaiveDate) -> Self {
        self.hire_date = hire_date;
        self
    }

    pub fn allowance(mut self, days: i64) -> Self {
        self.base_allowance = Some(days);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.status = EmployeeStatus::Inactive;
        self
    }

    pub async fn insert(self, pool: &SqlitePool) -> Actor {
        let id = Uuid::new_v4();
        let first_name: String = FirstName().fake();
        let last_name: String = LastName().fake();

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, first_name, last_name, role, department_id, service_id,
                gender, hire_date, base_allowance, status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(self.role)
        .bind(self.department_id)
        .bind(self.service_id)
        .bind(self.gender)
        .bind(self.hire_date)
        .bind(self.base_allowance)
        .bind(self.status)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to insert test employee");

        Actor {
            employee_id: id,
            role: self.role,
        }
    }
}

/// A small organisation covering every routing rule.
pub struct Org {
    pub ceo: Actor,
    pub operations: Uuid,
    pub ops_service: Uuid,
    pub ops_service_head: Actor,
    pub ops_dept_head: Actor,
    pub ops_employee: Actor,
    pub daf: Uuid,
    pub accountant: Actor,
    pub daf_employee: Actor,
    pub dsi: Uuid,
    pub dsi_dept_head: Actor,
    pub dsi_employee: Actor,
}

impl Org {
    pub async fn seed(pool: &SqlitePool) -> Self {
        let operations = insert_department(pool, DepartmentType::Operations).await;
        let daf = insert_department(pool, DepartmentType::Daf).await;
        let dsi = insert_department(pool, DepartmentType::Dsi).await;
        let ops_service = Uuid::new_v4();

        Org {
            ceo: EmployeeSeed::new(Role::Ceo, None).insert(pool).await,
            operations,
            ops_service,
            ops_service_head: EmployeeSeed::new(Role::ServiceHead, Some(operations))
                .service(ops_service)
                .insert(pool)
                .await,
            ops_dept_head: EmployeeSeed::new(Role::DeptHead, Some(operations))
                .insert(pool)
                .await,
            ops_employee: EmployeeSeed::new(Role::Employee, Some(operations))
                .service(ops_service)
                .insert(pool)
                .await,
            daf,
            accountant: EmployeeSeed::new(Role::Accountant, Some(daf))
                .insert(pool)
                .await,
            daf_employee: EmployeeSeed::new(Role::Employee, Some(daf))
                .gender(Gender::Male)
                .insert(pool)
                .await,
            dsi,
            dsi_dept_head: EmployeeSeed::new(Role::DeptHead, Some(dsi))
                .insert(pool)
                .await,
            dsi_employee: EmployeeSeed::new(Role::Employee, Some(dsi))
                .insert(pool)
                .await,
        }
    }
}

pub struct TestContext {
    pub db: TestDb,
    pub config: Config,
    pub leave: LeaveService,
    pub calendar: CalendarService,
    pub ledger: DecisionLedger,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        Self::with_policy(LeavePolicy::default()).await
    }

    pub async fn with_policy(policy: LeavePolicy) -> Result<Self> {
        let db = TestDb::new().await?;
        let mut config = Config::test_config();
        config.leave = policy;

        Ok(TestContext {
            leave: LeaveService::new(db.pool.clone(), config.leave.clone()),
            calendar: CalendarService::new(db.pool.clone()),
            ledger: DecisionLedger::new(db.pool.clone()),
            config,
            db,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.config.clone(), self.db.pool.clone())
    }
}

pub fn leave_input(leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveRequestInput {
    LeaveRequestInput {
        leave_type,
        start_date: start,
        end_date: end,
        reason: Some("Family visit".to_string()),
    }
}

// Authentication helpers
pub struct AuthHelper;

impl AuthHelper {
    pub fn token(config: &Config, actor: Actor) -> String {
        issue_token(config, actor.employee_id, actor.role, Duration::hours(1))
            .expect("Failed to issue test token")
    }

    pub fn auth_header(config: &Config, actor: Actor) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", Self::token(config, actor)))
    }
}

// Test assertion helpers
pub struct TestAssertions;

impl TestAssertions {
    pub fn assert_success_response<T>(body: &[u8]) -> T
    where
        T: serde::de::DeserializeOwned,
    {
        let response: ApiResponse<T> =
            serde_json::from_slice(body).expect("Failed to parse JSON response");

        assert!(
            response.success,
            "Expected successful response but got error: {:?}",
            response.message
        );
        response.data.expect("Expected data in successful response")
    }

    pub fn assert_error_code(err: &AppError, code: &str) {
        assert_eq!(err.code(), code, "unexpected error: {}", err);
    }

    pub async fn assert_record_count(pool: &SqlitePool, table: &str, expected_count: i64) {
        let query = format!("SELECT COUNT(*) as count FROM {}", table);
        let result = sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(pool)
            .await
            .expect("Failed to count records");

        assert_eq!(
            result, expected_count,
            "Expected {} records in {} table, but found {}",
            expected_count, table, result
        );
    }
}

pub fn setup_test_env() {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    let _ = env_logger::builder().is_test(true).try_init();
}
