//! Protocol integration tests

mod framing_tests;
mod request_tests;
mod response_tests;
