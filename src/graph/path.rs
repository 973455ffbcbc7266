//! Lexical path normalization and the fuzzy comparison used to correlate debugger
//! frames and editor paths with node file paths.
//!
//! Both sides may disagree on separator style and on absolute vs workspace-relative
//! roots, so a match is accepted on a shared multi-segment tail.

/// Segments two paths must share at their tail to match without being equal.
const MIN_SHARED_SUFFIX: usize = 2;

/// Normalizes `path` lexically.
///
/// Backslashes become `/`, empty and `.` segments are removed, and `..` pops the
/// previous segment. A `..` with nothing left to pop is kept. The result has no
/// leading or trailing slash.
pub fn normalize(path: &str) -> String {
	let unified = path.replace('\\', "/");
	let mut segments: Vec<&str> = Vec::new();

	for segment in unified.split('/') {
		match segment {
			"" | "." => {}
			".." => match segments.last() {
				Some(&last) if last != ".." => {
					segments.pop();
				}
				_ => segments.push(".."),
			},
			other => segments.push(other),
		}
	}

	segments.join("/")
}

/// True when `a` and `b` refer to the same file.
///
/// Equal normalized forms always match. Otherwise both paths must end in the same
/// `MIN_SHARED_SUFFIX` segments; a shared basename alone is not enough. Empty input
/// on either side never matches.
pub fn paths_match(a: &str, b: &str) -> bool {
	if a.trim().is_empty() || b.trim().is_empty() {
		return false;
	}

	let (left, right) = (normalize(a), normalize(b));
	if left.is_empty() || right.is_empty() {
		return false;
	}
	if left == right {
		return true;
	}

	let left: Vec<&str> = left.split('/').collect();
	let right: Vec<&str> = right.split('/').collect();
	let shortest = left.len().min(right.len());
	if shortest < MIN_SHARED_SUFFIX {
		return false;
	}

	// any longer shared tail also shares the shortest accepted one
	left[left.len() - MIN_SHARED_SUFFIX..] == right[right.len() - MIN_SHARED_SUFFIX..]
}
