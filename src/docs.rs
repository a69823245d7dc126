use crate::api::leave_application::{ApplicationQuery, DecideLeave};
use crate::api::leave_credit::{BucketResponse, CreditQuery, LeaveCreditResponse};
use crate::leave::provisioning::{ProvisionRequest, ProvisionSummary};
use crate::leave::workflow::LeaveRequest;
use crate::model::leave_application::{DurationType, LeaveApplication, LeaveCategory, LeaveStatus};
use crate::model::leave_credit::SpecialTotals;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Ledger API",
        version = "1.0.0",
        description = r#"
## Leave Accounting

Keeps one leave ledger per employee per calendar year and runs the
apply / approve / reject workflow against it.

### Key Features
- **Leave Credits**
  - Seed the yearly ledgers of every eligible employee in one call
  - Grant sick, maternity and bereavement days per employee
  - Read a ledger with total, used and remaining days per bucket
- **Leave Applications**
  - Apply for annual, sick, maternity, bereavement or work-from-home leave
  - Loss of pay is decided when the application is filed
  - Approve or reject pending applications; approval settles the ledger

### Security
All `/api` endpoints except login require a **JWT Bearer** token.
Provisioning, credit edits and decisions are **SuperAdmin** only.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::leave_credit::provision_credits,
        crate::api::leave_credit::list_credits,
        crate::api::leave_credit::update_credit,
        crate::api::leave_credit::get_ledger,

        crate::api::leave_application::apply_leave,
        crate::api::leave_application::list_applications,
        crate::api::leave_application::pending_applications,
        crate::api::leave_application::get_application,
        crate::api::leave_application::decide_application
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            ProvisionRequest,
            ProvisionSummary,
            SpecialTotals,
            BucketResponse,
            LeaveCreditResponse,
            CreditQuery,
            LeaveRequest,
            LeaveApplication,
            LeaveCategory,
            DurationType,
            LeaveStatus,
            ApplicationQuery,
            DecideLeave
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Leave Credit", description = "Yearly leave ledgers"),
        (name = "Leave", description = "Leave application workflow"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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
