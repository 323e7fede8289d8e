#![allow(dead_code)]

pub mod database;
pub mod workspace;
