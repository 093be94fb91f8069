//! Integration tests for dcg

mod cli_tests;
mod pack_tests;
mod safe_path_tests;
