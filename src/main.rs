//! The demonstration tour: the fixed-arity warm-ups in order, then the same
//! three-stage pipeline rebuilt by the recursive constructor. Takes no
//! arguments; `RUST_LOG` controls trace verbosity.

use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plumb::job::WaitStatusExt;
use plumb::{demos, exec, parser};

const SEPARATOR: &str =
	"------------------------------------------------------------------------------";

fn main() -> ExitCode {
	tracing_subscriber::registry()
		.with(fmt::layer())
		.with(EnvFilter::from_default_env())
		.init();

	match run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("plumb: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<()> {
	println!("\nExample 1");
	demos::simplest_pipe()?;
	println!("{SEPARATOR}\n");

	println!("Example 2");
	demos::pipe_via_dup2()?;
	println!("{SEPARATOR}\n");

	println!("Example 3");
	demos::two_stage_sequential()?;
	println!("{SEPARATOR}\n");

	println!("Example 4");
	demos::two_stage_nested()?;
	println!("{SEPARATOR}\n");

	println!("Example 5");
	demos::three_stage_two_pipes()?;
	println!("{SEPARATOR}\n");

	println!("Example 6");
	println!("The same pipeline, built by the recursive constructor; one recursion");
	println!("level per stage, so any number of stages works the same way.\n");
	let pipeline = parser::parse(b"echo pipes | tr -d e | tr -d i")?;
	let job = exec::run(&pipeline)?;
	for process in job.processes() {
		tracing::info!(
			pid = process.pid.as_raw(),
			code = process.status.and_then(WaitStatusExt::code),
			"stage collected"
		);
	}
	println!("{SEPARATOR}\n");

	report_open_descriptors();
	Ok(())
}

// Every channel end was either handed to a stage or dropped, so nothing
// beyond the standard streams may still be open here.
#[cfg(target_os = "linux")]
fn report_open_descriptors() {
	match demos::open_descriptors() {
		Ok(fds) => println!("Open descriptors on exit: {fds:?}"),
		Err(e) => eprintln!("plumb: descriptor audit failed: {e}"),
	}
}

#[cfg(not(target_os = "linux"))]
fn report_open_descriptors() {}
