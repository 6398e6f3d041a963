pub mod quota;

pub use quota::{AmountSource, QuotaGuard};
