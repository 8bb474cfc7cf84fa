use crate::api::attendance::{HistoryQuery, ManualAttendance, ScanRequest};
use crate::api::qr::{OfficeQrQuery, QrTokenResponse};
use crate::api::swap::CreateSwap;
use crate::attendance::CheckinResult;
use crate::model::attendance::{AttendanceMethod, AttendanceRecord, AttendanceType};
use crate::model::company_settings::CompanySettings;
use crate::model::role::Role;
use crate::model::shift::Shift;
use crate::model::shift_swap::{OpenSwap, ShiftSwapRequest, SwapStatus};
use crate::utils::geo::GeoPoint;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

/// Registers the `bearer_auth` scheme referenced by the protected paths.
pub struct SecurityAddon;

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

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shiftdesk API",
        version = "1.0.0",
        description = r#"
## QR Attendance & Shift Swap

### 🔹 Key Features
- **QR Check-in**
  - Rotating office codes on a front-desk display, geofenced against the office
  - Personal badges scanned at a kiosk, alternating check-in / check-out
  - Lateness against the first shift of the day
- **Shift Swap Marketplace**
  - Offer a shift, first colleague to claim wins, admin approves or rejects

### 🔐 Security
`/checkin/scan` is public; office scans need a Bearer token to know who is scanning.
Everything under `/api` requires **JWT Bearer authentication**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::scan,
        crate::api::attendance::my_attendance,
        crate::api::attendance::manual_attendance,

        crate::api::qr::office_qr,
        crate::api::qr::my_qr,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings,

        crate::api::swap::list_swaps,
        crate::api::swap::create_swap,
        crate::api::swap::get_swap,
        crate::api::swap::claim_swap,
        crate::api::swap::approve_swap,
        crate::api::swap::reject_swap,
        crate::api::swap::cancel_swap
    ),
    components(
        schemas(
            GeoPoint,
            ScanRequest,
            CheckinResult,
            HistoryQuery,
            ManualAttendance,
            AttendanceRecord,
            AttendanceType,
            AttendanceMethod,
            OfficeQrQuery,
            QrTokenResponse,
            CompanySettings,
            Role,
            Shift,
            CreateSwap,
            ShiftSwapRequest,
            OpenSwap,
            SwapStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "QR check-in and attendance history"),
        (name = "QR", description = "Office and badge QR issuance"),
        (name = "Settings", description = "Office location and geofence"),
        (name = "Shift Swap", description = "Shift give-away marketplace"),
    )
)]
pub struct ApiDoc;
