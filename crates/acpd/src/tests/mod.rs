//! Test suites for the threshold-signature daemon.

mod support;
