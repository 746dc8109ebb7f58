#![allow(dead_code)]
pub mod prepare_env;
pub mod scripted_accrual;
