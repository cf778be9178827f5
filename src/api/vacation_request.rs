use crate::auth::auth::AuthUser;
use crate::model::vacation_request::{ApprovalCommand, VacationRequest, VacationStatus};
use crate::service::AppService;
use crate::store::{Page, PageRequest};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateVacationRequest {
    #[schema(example = "2025-06-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2025-06-05", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = 5)]
    pub requested_days: u32,
}

#[derive(Deserialize, IntoParams)]
pub struct PageQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct ReviewFilter {
    /// Filter by request status
    pub status: Option<VacationStatus>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "employee_id": 1000,
            "start_date": "2025-06-01",
            "end_date": "2025-06-05",
            "requested_days": 5,
            "status": "PENDING",
            "created_at": "2025-05-20T09:00:00Z"
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct VacationRequestListResponse {
    pub data: Vec<VacationRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

impl From<Page<VacationRequest>> for VacationRequestListResponse {
    fn from(page: Page<VacationRequest>) -> Self {
        Self {
            data: page.data,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
        }
    }
}

/* =========================
Submit vacation request (employee)
========================= */
#[utoipa::path(
    post,
    path = "/api/vacation-requests",
    request_body(
        content = CreateVacationRequest,
        description = "Vacation request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Vacation request submitted", body = VacationRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "VacationRequest"
)]
pub async fn create_vacation_request(
    auth: AuthUser,
    service: web::Data<AppService>,
    payload: web::Json<CreateVacationRequest>,
) -> actix_web::Result<impl Responder> {
    let created = service
        .submit(
            &auth,
            payload.start_date,
            payload.end_date,
            payload.requested_days,
        )
        .await?;

    Ok(HttpResponse::Created().json(created))
}

/* =========================
List MY vacation requests (employee)
========================= */
#[utoipa::path(
    get,
    path = "/api/vacation-requests/mine",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated list of the caller's requests", body = VacationRequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "VacationRequest"
)]
pub async fn my_vacation_requests(
    auth: AuthUser,
    service: web::Data<AppService>,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let page = service
        .list_mine(&auth, PageRequest::new(query.page, query.per_page))
        .await?;

    Ok(HttpResponse::Ok().json(VacationRequestListResponse::from(page)))
}

/* =========================
List requests for review (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/vacation-requests/review",
    params(ReviewFilter),
    responses(
        (status = 200, description = "Paginated list of requests awaiting review", body = VacationRequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "VacationRequest"
)]
pub async fn review_vacation_requests(
    auth: AuthUser,
    service: web::Data<AppService>,
    query: web::Query<ReviewFilter>,
) -> actix_web::Result<impl Responder> {
    let page = service
        .list_for_review(
            &auth,
            query.status,
            PageRequest::new(query.page, query.per_page),
        )
        .await?;

    Ok(HttpResponse::Ok().json(VacationRequestListResponse::from(page)))
}

/* =========================
Decide a request (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/vacation-requests/{id}/decision",
    params(
        ("id" = u64, Path, description = "ID of the vacation request to decide")
    ),
    request_body(
        content = ApprovalCommand,
        description = "Approval command: APPROVE, APPROVE_WITH_CHANGES or REJECT",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Vacation request decided", body = VacationRequest),
        (status = 400, description = "Invalid decision payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Vacation request not found"),
        (status = 409, description = "Vacation request already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "VacationRequest"
)]
pub async fn decide_vacation_request(
    auth: AuthUser,
    service: web::Data<AppService>,
    path: web::Path<u64>,
    payload: web::Json<ApprovalCommand>,
) -> actix_web::Result<impl Responder> {
    let decided = service
        .decide(&auth, path.into_inner(), payload.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(decided))
}

/* =========================
Fetch one request (owner or HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/vacation-requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the vacation request to fetch")
    ),
    responses(
        (status = 200, description = "Vacation request found", body = VacationRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Vacation request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "VacationRequest"
)]
pub async fn get_vacation_request(
    auth: AuthUser,
    service: web::Data<AppService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = service.find_one(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Administrative delete (Admin)
========================= */
#[utoipa::path(
    delete,
    path = "/api/vacation-requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the vacation request to delete")
    ),
    responses(
        (status = 204, description = "Vacation request deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Vacation request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "VacationRequest"
)]
pub async fn delete_vacation_request(
    auth: AuthUser,
    service: web::Data<AppService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    service.delete(&auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
