pub mod call;
pub mod toolkits;
