pub mod angle;
pub mod quaternion;
