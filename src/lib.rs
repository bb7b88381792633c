pub mod logging;
pub mod pixel;
pub mod storage;
pub mod tracker;
pub mod web;
