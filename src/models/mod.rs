pub mod call;
pub mod quota;
pub mod service_token;
pub mod subscription;
pub mod usage;
pub mod user;

pub use call::{Call, CallStatus};
pub use quota::{QuotaAction, QuotaStatus};
pub use service_token::{CreateServiceToken, ServiceToken};
pub use subscription::{PlanTier, SetSubscription, SubStatus, Subscription};
pub use usage::{UsageLevel, UsageMetric, UsageSummary, UserUsage};
pub use user::{ProvisionUser, ProvisionedUser, User};
