pub mod objects_api_test;
pub mod quota_api_test;
