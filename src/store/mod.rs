use crate::error::ServiceError;
use crate::model::employee::Employee;
use crate::model::vacation_request::{
    DecisionRecord, NewVacationRequest, VacationRequest, VacationStatus,
};

pub mod mysql;

/// 1-based page request; `per_page` is capped at 100.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

/// Durable storage for vacation requests.
///
/// Listing queries return pages ordered by `created_at` descending.
/// `apply_decision` must be conditional on the record still being
/// PENDING and report the number of rows it actually changed, so two
/// concurrent decisions cannot both win.
pub trait RequestStore {
    async fn insert(&self, new: NewVacationRequest) -> Result<VacationRequest, ServiceError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<VacationRequest>, ServiceError>;

    async fn find_by_employee(
        &self,
        employee_id: u64,
        page: PageRequest,
    ) -> Result<Page<VacationRequest>, ServiceError>;

    async fn find_by_status(
        &self,
        status: VacationStatus,
        page: PageRequest,
    ) -> Result<Page<VacationRequest>, ServiceError>;

    async fn find_all(&self, page: PageRequest) -> Result<Page<VacationRequest>, ServiceError>;

    /// Applies a decision to a still-PENDING record; returns affected rows.
    async fn apply_decision(
        &self,
        id: u64,
        decision: DecisionRecord,
    ) -> Result<u64, ServiceError>;

    /// Administrative removal; returns affected rows.
    async fn delete(&self, id: u64) -> Result<u64, ServiceError>;
}

/// Resolves an authenticated login to its employee record.
pub trait EmployeeDirectory {
    async fn employee_for_login(&self, login: &str) -> Result<Option<Employee>, ServiceError>;
}
