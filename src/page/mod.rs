pub mod eligibility;
pub mod error;
pub mod page_id;
