use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::auth::auth::AuthUser;
use crate::error::ServiceError;
use crate::model::vacation_request::{
    self, ApprovalCommand, DayCountPolicy, NewVacationRequest, VacationRequest, VacationStatus,
};
use crate::store::{EmployeeDirectory, Page, PageRequest, RequestStore};

/// Orchestrates the request lifecycle against the store and the
/// employee directory. Holds no mutable state of its own; every
/// operation is a short-lived read-modify-write against the store.
pub struct VacationRequestService<S, D> {
    store: S,
    directory: D,
    day_policy: Option<DayCountPolicy>,
    /// Whether the review listing without a status filter includes
    /// already-decided requests (REVIEW_INCLUDE_DECIDED).
    review_includes_decided: bool,
}

impl<S, D> VacationRequestService<S, D>
where
    S: RequestStore,
    D: EmployeeDirectory,
{
    pub fn new(
        store: S,
        directory: D,
        day_policy: Option<DayCountPolicy>,
        review_includes_decided: bool,
    ) -> Self {
        Self {
            store,
            directory,
            day_policy,
            review_includes_decided,
        }
    }

    /// Callers act on their own employee record only; a login with no
    /// linked employee cannot use the workflow.
    async fn resolve_employee(
        &self,
        login: &str,
    ) -> Result<crate::model::employee::Employee, ServiceError> {
        self.directory
            .employee_for_login(login)
            .await?
            .ok_or_else(|| ServiceError::Forbidden("No employee profile".into()))
    }

    pub async fn submit(
        &self,
        caller: &AuthUser,
        start_date: NaiveDate,
        end_date: NaiveDate,
        requested_days: u32,
    ) -> Result<VacationRequest, ServiceError> {
        debug!(login = %caller.login, "Submitting vacation request");

        let employee = self.resolve_employee(&caller.login).await?;
        vacation_request::validate_submission(
            start_date,
            end_date,
            requested_days,
            self.day_policy,
        )?;

        self.store
            .insert(NewVacationRequest {
                employee_id: employee.id,
                start_date,
                end_date,
                requested_days,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn list_mine(
        &self,
        caller: &AuthUser,
        page: PageRequest,
    ) -> Result<Page<VacationRequest>, ServiceError> {
        debug!(login = %caller.login, "Listing own vacation requests");

        let employee = self.resolve_employee(&caller.login).await?;
        self.store.find_by_employee(employee.id, page).await
    }

    pub async fn list_for_review(
        &self,
        caller: &AuthUser,
        status: Option<VacationStatus>,
        page: PageRequest,
    ) -> Result<Page<VacationRequest>, ServiceError> {
        caller.require_reviewer()?;

        match status {
            Some(status) => self.store.find_by_status(status, page).await,
            None if self.review_includes_decided => self.store.find_all(page).await,
            None => {
                self.store
                    .find_by_status(VacationStatus::Pending, page)
                    .await
            }
        }
    }

    /// Reviewers read any record; an employee reads only their own.
    /// Another employee's record answers NotFound, not Forbidden, so
    /// ids cannot be probed for existence.
    pub async fn find_one(
        &self,
        caller: &AuthUser,
        id: u64,
    ) -> Result<VacationRequest, ServiceError> {
        let request = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if caller.role.can_review() {
            return Ok(request);
        }

        let employee = self.resolve_employee(&caller.login).await?;
        if request.employee_id != employee.id {
            return Err(ServiceError::NotFound);
        }

        Ok(request)
    }

    pub async fn decide(
        &self,
        caller: &AuthUser,
        id: u64,
        cmd: ApprovalCommand,
    ) -> Result<VacationRequest, ServiceError> {
        caller.require_reviewer()?;
        debug!(login = %caller.login, id, action = %cmd.action, "Deciding vacation request");

        let request = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let decision = request.decision(&cmd, caller.user_id, Utc::now())?;

        let affected = self.store.apply_decision(id, decision).await?;
        if affected == 0 {
            // A concurrent decision (or delete) got there between our
            // read and the conditional update.
            return match self.store.find_by_id(id).await? {
                Some(_) => Err(ServiceError::Conflict(
                    "Vacation request already decided".into(),
                )),
                None => Err(ServiceError::NotFound),
            };
        }

        self.store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Administrative removal outside the workflow; no status precondition.
    pub async fn delete(&self, caller: &AuthUser, id: u64) -> Result<(), ServiceError> {
        caller.require_admin()?;

        let affected = self.store.delete(id).await?;
        if affected == 0 {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::Employee;
    use crate::model::role::Role;
    use crate::model::vacation_request::DecisionAction;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct MemRequestStore {
        rows: Mutex<Vec<VacationRequest>>,
        next_id: AtomicU64,
    }

    impl MemRequestStore {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }
        }

        fn paginate(mut rows: Vec<VacationRequest>, page: PageRequest) -> Page<VacationRequest> {
            let total = rows.len() as i64;
            // created_at DESC; id breaks ties deterministically.
            rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            let data = rows
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.per_page as usize)
                .collect();
            Page {
                data,
                page: page.page,
                per_page: page.per_page,
                total,
            }
        }
    }

    impl RequestStore for MemRequestStore {
        async fn insert(&self, new: NewVacationRequest) -> Result<VacationRequest, ServiceError> {
            let request = VacationRequest {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                employee_id: new.employee_id,
                start_date: new.start_date,
                end_date: new.end_date,
                requested_days: new.requested_days,
                status: VacationStatus::Pending,
                approver_comment: None,
                approved_start_date: None,
                approved_end_date: None,
                approved_days: None,
                created_at: new.created_at,
                decided_at: None,
                approver_id: None,
            };
            self.rows.lock().unwrap().push(request.clone());
            Ok(request)
        }

        async fn find_by_id(&self, id: u64) -> Result<Option<VacationRequest>, ServiceError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned())
        }

        async fn find_by_employee(
            &self,
            employee_id: u64,
            page: PageRequest,
        ) -> Result<Page<VacationRequest>, ServiceError> {
            let rows = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.employee_id == employee_id)
                .cloned()
                .collect();
            Ok(Self::paginate(rows, page))
        }

        async fn find_by_status(
            &self,
            status: VacationStatus,
            page: PageRequest,
        ) -> Result<Page<VacationRequest>, ServiceError> {
            let rows = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.status == status)
                .cloned()
                .collect();
            Ok(Self::paginate(rows, page))
        }

        async fn find_all(&self, page: PageRequest) -> Result<Page<VacationRequest>, ServiceError> {
            let rows = self.rows.lock().unwrap().clone();
            Ok(Self::paginate(rows, page))
        }

        async fn apply_decision(
            &self,
            id: u64,
            decision: crate::model::vacation_request::DecisionRecord,
        ) -> Result<u64, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            match rows
                .iter_mut()
                .find(|r| r.id == id && r.status == VacationStatus::Pending)
            {
                Some(row) => {
                    row.status = decision.status;
                    row.approver_comment = decision.approver_comment;
                    row.approved_start_date = decision.approved_start_date;
                    row.approved_end_date = decision.approved_end_date;
                    row.approved_days = decision.approved_days;
                    row.approver_id = Some(decision.approver_id);
                    row.decided_at = Some(decision.decided_at);
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        async fn delete(&self, id: u64) -> Result<u64, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok((before - rows.len()) as u64)
        }
    }

    struct MemDirectory {
        employees: HashMap<String, Employee>,
    }

    impl EmployeeDirectory for MemDirectory {
        async fn employee_for_login(
            &self,
            login: &str,
        ) -> Result<Option<Employee>, ServiceError> {
            Ok(self.employees.get(login).cloned())
        }
    }

    fn directory() -> MemDirectory {
        let mut employees = HashMap::new();
        employees.insert(
            "anna".to_string(),
            Employee {
                id: 1000,
                first_name: "Anna".to_string(),
                last_name: "Alvarez".to_string(),
                email: "anna@company.com".to_string(),
            },
        );
        employees.insert(
            "bruno".to_string(),
            Employee {
                id: 2000,
                first_name: "Bruno".to_string(),
                last_name: "Baker".to_string(),
                email: "bruno@company.com".to_string(),
            },
        );
        MemDirectory { employees }
    }

    fn service() -> VacationRequestService<MemRequestStore, MemDirectory> {
        VacationRequestService::new(MemRequestStore::new(), directory(), None, true)
    }

    fn employee(login: &str) -> AuthUser {
        AuthUser {
            user_id: 10,
            login: login.to_string(),
            role: Role::Employee,
            employee_id: None,
        }
    }

    fn reviewer() -> AuthUser {
        AuthUser {
            user_id: 99,
            login: "hr".to_string(),
            role: Role::Hr,
            employee_id: None,
        }
    }

    fn admin() -> AuthUser {
        AuthUser {
            user_id: 1,
            login: "root".to_string(),
            role: Role::Admin,
            employee_id: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn approve() -> ApprovalCommand {
        ApprovalCommand {
            action: DecisionAction::Approve,
            approved_start_date: None,
            approved_end_date: None,
            approved_days: None,
            approver_comment: None,
        }
    }

    fn reject() -> ApprovalCommand {
        ApprovalCommand {
            action: DecisionAction::Reject,
            ..approve()
        }
    }

    #[actix_web::test]
    async fn submit_creates_a_pending_record() {
        let service = service();
        let created = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();

        assert_eq!(created.status, VacationStatus::Pending);
        assert_eq!(created.employee_id, 1000);
        assert_eq!(created.requested_days, 5);
        assert!(created.decided_at.is_none());
        assert!(created.approver_id.is_none());
        assert!(created.approved_start_date.is_none());
        assert!(created.approved_end_date.is_none());
        assert!(created.approved_days.is_none());
    }

    #[actix_web::test]
    async fn submit_with_inverted_range_persists_nothing() {
        let service = service();
        let err = service
            .submit(&employee("anna"), date(2025, 6, 5), date(2025, 6, 1), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let all = service
            .list_for_review(&reviewer(), None, PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(all.total, 0);
    }

    #[actix_web::test]
    async fn submit_without_employee_profile_is_forbidden() {
        let service = service();
        let err = service
            .submit(&employee("ghost"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[actix_web::test]
    async fn submit_honors_a_pluggable_day_policy() {
        fn no_long_leaves(_: NaiveDate, _: NaiveDate, days: u32) -> Result<(), String> {
            if days > 20 {
                Err("requested_days exceeds the yearly allowance".to_string())
            } else {
                Ok(())
            }
        }

        let service = VacationRequestService::new(
            MemRequestStore::new(),
            directory(),
            Some(no_long_leaves as DayCountPolicy),
            true,
        );

        let err = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 7, 30), 25)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn approve_then_reject_again_conflicts_without_mutation() {
        let service = service();
        let created = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();

        let approved = service.decide(&reviewer(), created.id, approve()).await.unwrap();
        assert_eq!(approved.status, VacationStatus::Approved);
        assert_eq!(approved.approved_days, Some(5));
        assert_eq!(approved.approved_start_date, Some(date(2025, 6, 1)));
        assert_eq!(approved.approved_end_date, Some(date(2025, 6, 5)));
        assert_eq!(approved.approver_id, Some(99));
        assert!(approved.decided_at.is_some());

        let err = service
            .decide(&reviewer(), created.id, reject())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let after = service.find_one(&reviewer(), created.id).await.unwrap();
        assert_eq!(after.status, VacationStatus::Approved);
        assert_eq!(after.approved_days, approved.approved_days);
        assert_eq!(after.decided_at, approved.decided_at);
        assert_eq!(after.approver_id, approved.approver_id);
    }

    #[actix_web::test]
    async fn decide_requires_the_reviewer_role() {
        let service = service();
        let created = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();

        let err = service
            .decide(&employee("bruno"), created.id, approve())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[actix_web::test]
    async fn decide_on_unknown_id_is_not_found() {
        let service = service();
        let err = service.decide(&reviewer(), 404, approve()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[actix_web::test]
    async fn reject_leaves_approved_fields_empty() {
        let service = service();
        let created = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();

        let rejected = service.decide(&reviewer(), created.id, reject()).await.unwrap();
        assert_eq!(rejected.status, VacationStatus::Rejected);
        assert!(rejected.approved_start_date.is_none());
        assert!(rejected.approved_end_date.is_none());
        assert!(rejected.approved_days.is_none());
        assert_eq!(rejected.approver_id, Some(99));
    }

    #[actix_web::test]
    async fn list_mine_never_crosses_employees() {
        let service = service();
        service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();
        service
            .submit(&employee("bruno"), date(2025, 7, 1), date(2025, 7, 3), 3)
            .await
            .unwrap();
        service
            .submit(&employee("anna"), date(2025, 8, 1), date(2025, 8, 2), 2)
            .await
            .unwrap();

        let mine = service
            .list_mine(&employee("anna"), PageRequest::new(None, None))
            .await
            .unwrap();

        assert_eq!(mine.total, 2);
        assert!(mine.data.iter().all(|r| r.employee_id == 1000));
        // Most recent submission first.
        assert_eq!(mine.data[0].start_date, date(2025, 8, 1));
    }

    #[actix_web::test]
    async fn review_listing_is_reviewer_only() {
        let service = service();
        let err = service
            .list_for_review(&employee("anna"), None, PageRequest::new(None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[actix_web::test]
    async fn review_listing_filters_by_status() {
        let service = service();
        let first = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();
        service
            .submit(&employee("bruno"), date(2025, 7, 1), date(2025, 7, 3), 3)
            .await
            .unwrap();
        service.decide(&reviewer(), first.id, approve()).await.unwrap();

        let pending = service
            .list_for_review(
                &reviewer(),
                Some(VacationStatus::Pending),
                PageRequest::new(None, None),
            )
            .await
            .unwrap();
        assert_eq!(pending.total, 1);
        assert_eq!(pending.data[0].employee_id, 2000);

        let approved = service
            .list_for_review(
                &reviewer(),
                Some(VacationStatus::Approved),
                PageRequest::new(None, None),
            )
            .await
            .unwrap();
        assert_eq!(approved.total, 1);
        assert_eq!(approved.data[0].id, first.id);
    }

    #[actix_web::test]
    async fn unfiltered_review_listing_can_exclude_decided_requests() {
        let service = VacationRequestService::new(
            MemRequestStore::new(),
            directory(),
            None,
            false,
        );
        let first = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();
        service
            .submit(&employee("bruno"), date(2025, 7, 1), date(2025, 7, 3), 3)
            .await
            .unwrap();
        service.decide(&reviewer(), first.id, approve()).await.unwrap();

        let listed = service
            .list_for_review(&reviewer(), None, PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.data[0].status, VacationStatus::Pending);
    }

    #[actix_web::test]
    async fn another_employees_record_reads_as_not_found() {
        let service = service();
        let created = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();

        let err = service
            .find_one(&employee("bruno"), created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));

        // Owner and reviewer both still see it.
        assert!(service.find_one(&employee("anna"), created.id).await.is_ok());
        assert!(service.find_one(&reviewer(), created.id).await.is_ok());
    }

    #[actix_web::test]
    async fn delete_is_admin_only() {
        let service = service();
        let created = service
            .submit(&employee("anna"), date(2025, 6, 1), date(2025, 6, 5), 5)
            .await
            .unwrap();

        let err = service
            .delete(&reviewer(), created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        service.delete(&admin(), created.id).await.unwrap();
        let err = service.find_one(&admin(), created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }
}
