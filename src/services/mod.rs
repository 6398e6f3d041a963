pub mod alert;
pub mod call;
pub mod quota;
pub mod service_token;
pub mod subscription;
pub mod usage;
pub mod users;

pub use alert::QuotaAlertService;
pub use call::CallService;
pub use quota::{evaluate_quota, QuotaEngine};
pub use service_token::ServiceTokenService;
pub use subscription::SubscriptionService;
pub use usage::UsageService;
pub use users::UsersService;
