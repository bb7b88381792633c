pub mod health;
pub mod index;
pub mod pixel;
pub mod tracking;
