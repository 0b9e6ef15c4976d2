//! Services module - contains the business logic behind the HTTP routes.

pub mod answer_validator;
pub mod auth_service;
pub mod error;
pub mod export_service;
pub mod form_service;
pub mod jwt_service;
pub mod lineage;
pub mod question_service;
pub mod response_service;
pub mod role_service;
pub mod scheduler;
pub mod status_policy;

// Re-export for convenience
pub use answer_validator::{AnswerError, validate_answers};
pub use auth_service::{AuthService, ResolvedUser};
pub use error::{ServiceError, ServiceResult};
pub use export_service::ExportFormat;
pub use form_service::{FormInput, FormService, FormUpdate, FormView};
pub use jwt_service::{Claims, JwtService, SharedJwtService, TokenType};
pub use lineage::{LineageEntry, LineageGraph};
pub use response_service::ResponseService;
pub use role_service::RoleService;
pub use scheduler::{SweepReport, run_sweep, spawn_sweep_task};
pub use status_policy::{can_transition, effective_status};
