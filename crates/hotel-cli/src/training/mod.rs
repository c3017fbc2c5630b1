pub mod input;
pub mod trainer;
