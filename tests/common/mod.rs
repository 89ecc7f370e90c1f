#![allow(dead_code)]

pub mod forms;
