//! Unit tests for the report module.
//!
//! Tests are organised by component: schema composition, periods and
//! targets, schema resolution, row assembly, CSV output and orchestration.

mod support;
