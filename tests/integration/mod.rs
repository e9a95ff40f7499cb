//! Integration test suite for the ensemble orchestration engine.
//!
//! These tests drive the public API end to end, from request intake
//! through planning, scheduling, and the per-task conversation loops.
//!
//! # Test Categories
//!
//! - `workflow_e2e`: Full request-to-report workflows
//! - `parallel_execution`: Concurrency bounds and wave ordering
//! - `dependency_scenarios`: Dependency gating and failure cascades
//! - `cancellation`: Cooperative cancellation semantics
//!
//! # CI Compatibility
//!
//! All model and tool collaborators are mocks; no network or workspace
//! access happens, so the suite is safe to run anywhere.

mod fixtures;

mod workflow_e2e;
mod parallel_execution;
mod dependency_scenarios;
