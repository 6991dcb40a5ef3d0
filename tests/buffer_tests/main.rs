//! Buffer test suite
