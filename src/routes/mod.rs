pub mod calls;
pub mod health;
pub mod objects;
pub mod quota;
pub mod tokens;
pub mod usage;
pub mod users;
