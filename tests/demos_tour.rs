//! Smoke test for the fixed-arity demonstrations.
//!
//! Sole test in this binary: the dup2 demonstration rebinds and restores
//! this process's standard output, which must not race another test.

use plumb::demos;

#[test]
fn the_demo_tour_runs_clean() {
	demos::simplest_pipe().unwrap();
	demos::pipe_via_dup2().unwrap();
	demos::two_stage_sequential().unwrap();
	demos::two_stage_nested().unwrap();
	demos::three_stage_two_pipes().unwrap();
}
