pub mod extract;
pub mod scan;
