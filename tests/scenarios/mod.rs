//! Scenario-based tests for runnable

mod async_equivalence;
mod batch_errors;
mod config_loading;
mod demo_chains;
mod flattening;
mod parallel_fan_out;
mod routing_limits;
mod sequence_chain;
mod trace_tree;
