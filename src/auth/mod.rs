pub mod extractors;
pub mod token;

pub use extractors::{MeterAuth, ServiceAuth};
pub use token::{generate_token, is_valid_token_format};
