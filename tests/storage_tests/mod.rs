//! Storage layer integration tests

mod manager_tests;
mod merge_tests;
mod sstable_tests;
