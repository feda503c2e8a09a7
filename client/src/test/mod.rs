#![allow(clippy::unwrap_used, clippy::panic)]

mod profile_tests;
