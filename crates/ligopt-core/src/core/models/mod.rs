pub mod change;
pub mod conf;
pub mod size;
