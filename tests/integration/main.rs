//! Exporter integration tests

mod refresh_tests;
