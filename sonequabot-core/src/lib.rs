// src/lib.rs

pub mod platforms;
pub mod eventbus;
pub mod services;
pub mod test_utils;

pub use sonequabot_common::error::Error;
pub use sonequabot_common::models;
