pub mod common;
pub mod loading_tests;
