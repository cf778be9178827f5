use sqlx::MySqlPool;

use crate::error::ServiceError;
use crate::model::employee::Employee;
use crate::model::vacation_request::{
    DecisionRecord, NewVacationRequest, VacationRequest, VacationStatus,
};
use crate::store::{EmployeeDirectory, Page, PageRequest, RequestStore};
use crate::utils::employee_cache;

const REQUEST_COLUMNS: &str = "id, employee_id, start_date, end_date, requested_days, status, \
     approver_comment, approved_start_date, approved_end_date, approved_days, \
     created_at, decided_at, approver_id";

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Status(VacationStatus),
}

#[derive(Clone)]
pub struct MySqlRequestStore {
    pool: MySqlPool,
}

impl MySqlRequestStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_page(
        &self,
        where_sql: &str,
        args: &[FilterValue],
        page: PageRequest,
    ) -> Result<Page<VacationRequest>, ServiceError> {
        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM vacation_requests{}", where_sql);

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Status(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            "SELECT {} FROM vacation_requests{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            REQUEST_COLUMNS, where_sql
        );

        let mut data_q = sqlx::query_as::<_, VacationRequest>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(*v),
                FilterValue::Status(s) => data_q.bind(*s),
            };
        }

        let data = data_q
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }
}

impl RequestStore for MySqlRequestStore {
    async fn insert(&self, new: NewVacationRequest) -> Result<VacationRequest, ServiceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO vacation_requests
                (employee_id, start_date, end_date, requested_days, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.requested_days)
        .bind(VacationStatus::Pending)
        .bind(new.created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_by_id(id).await?.ok_or(ServiceError::NotFound)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<VacationRequest>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM vacation_requests WHERE id = ?",
            REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, VacationRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }

    async fn find_by_employee(
        &self,
        employee_id: u64,
        page: PageRequest,
    ) -> Result<Page<VacationRequest>, ServiceError> {
        self.fetch_page(
            " WHERE employee_id = ?",
            &[FilterValue::U64(employee_id)],
            page,
        )
        .await
    }

    async fn find_by_status(
        &self,
        status: VacationStatus,
        page: PageRequest,
    ) -> Result<Page<VacationRequest>, ServiceError> {
        self.fetch_page(" WHERE status = ?", &[FilterValue::Status(status)], page)
            .await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<VacationRequest>, ServiceError> {
        self.fetch_page("", &[], page).await
    }

    async fn apply_decision(
        &self,
        id: u64,
        decision: DecisionRecord,
    ) -> Result<u64, ServiceError> {
        // The status guard makes the transition one-shot: a concurrent
        // decision that already left PENDING turns this into a no-op.
        let result = sqlx::query(
            r#"
            UPDATE vacation_requests
            SET status = ?,
                approver_comment = ?,
                approved_start_date = ?,
                approved_end_date = ?,
                approved_days = ?,
                approver_id = ?,
                decided_at = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(decision.status)
        .bind(&decision.approver_comment)
        .bind(decision.approved_start_date)
        .bind(decision.approved_end_date)
        .bind(decision.approved_days)
        .bind(decision.approver_id)
        .bind(decision.decided_at)
        .bind(id)
        .bind(VacationStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: u64) -> Result<u64, ServiceError> {
        let result = sqlx::query("DELETE FROM vacation_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct MySqlEmployeeDirectory {
    pool: MySqlPool,
}

impl MySqlEmployeeDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl EmployeeDirectory for MySqlEmployeeDirectory {
    async fn employee_for_login(&self, login: &str) -> Result<Option<Employee>, ServiceError> {
        if let Some(hit) = employee_cache::lookup(login).await {
            return Ok(Some(hit));
        }

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT e.id, e.first_name, e.last_name, e.email
            FROM employees e
            INNER JOIN users u ON u.employee_id = e.id
            WHERE u.login = ?
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(found) = &employee {
            employee_cache::store(login, found.clone()).await;
        }

        Ok(employee)
    }
}
