use std::env;
use std::ffi::{CString, OsStr};

/// Resolve a command name to the path handed to the image-replacement call.
/// Names containing '/' are taken as-is; anything else is looked up in each
/// `$PATH` entry in order.
pub fn resolve(name: &[u8]) -> Option<CString> {
	use std::os::unix::ffi::{OsStrExt, OsStringExt};

	if name.contains(&b'/') {
		return CString::new(name.to_vec()).ok();
	}
	let paths = env::var_os("PATH")?;
	for dir in env::split_paths(&paths) {
		let candidate = dir.join(OsStr::from_bytes(name));
		if candidate.is_file() {
			return CString::new(candidate.into_os_string().into_vec()).ok();
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finds_sh_on_path() {
		let path = resolve(b"sh").expect("sh should be on $PATH");
		assert!(path.to_bytes().ends_with(b"/sh"));
	}

	#[test]
	fn slashed_names_bypass_the_search() {
		let path = resolve(b"/bin/sh").unwrap();
		assert_eq!(path.to_bytes(), b"/bin/sh");
	}

	#[test]
	fn missing_commands_resolve_to_nothing() {
		assert!(resolve(b"plumb-no-such-command-on-any-path").is_none());
	}
}
