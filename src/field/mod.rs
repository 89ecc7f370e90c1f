pub mod enumerate;
pub mod identity;
