pub mod company;
pub mod validate;
