#![allow(dead_code, non_snake_case, non_upper_case_globals)]

pub mod error;
pub mod chop;
pub mod spectral;
pub mod bands;
pub mod config;

