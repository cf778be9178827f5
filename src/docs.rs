use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::vacation_request::{CreateVacationRequest, VacationRequestListResponse};
use crate::model::employee::Employee;
use crate::model::vacation_request::{
    ApprovalCommand, DecisionAction, VacationRequest, VacationStatus,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vacation Request API",
        version = "1.0.0",
        description = r#"
## Vacation Request Service

This API manages the **vacation request workflow** within an organization.

### Key Features
- **Vacation Requests**
  - Submit a request for a date range, list your own requests
- **Review**
  - HR lists requests awaiting review and approves, approves with changes, or rejects them
- **Employee Directory**
  - Create, update, list, and view employee records

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Deciding and reviewing requests requires the **HR** or **Admin** role.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::vacation_request::create_vacation_request,
        crate::api::vacation_request::my_vacation_requests,
        crate::api::vacation_request::review_vacation_requests,
        crate::api::vacation_request::decide_vacation_request,
        crate::api::vacation_request::get_vacation_request,
        crate::api::vacation_request::delete_vacation_request,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            VacationRequest,
            VacationStatus,
            DecisionAction,
            ApprovalCommand,
            CreateVacationRequest,
            VacationRequestListResponse,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "VacationRequest", description = "Vacation request workflow APIs"),
        (name = "Employee", description = "Employee directory APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
