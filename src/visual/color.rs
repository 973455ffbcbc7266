/// Folds `opacity` into a CSS colour.
///
/// Hex colours (`#rgb`, `#rrggbb`, `#rrggbbaa`) and `rgb()`/`rgba()` become
/// `rgba(r, g, b, opacity)`; any existing alpha is replaced. Anything else, and any
/// colour at full opacity, is returned unchanged.
pub fn with_opacity(color: &str, opacity: f64) -> String {
	if opacity >= 1.0 {
		return color.to_owned();
	}
	match parse_rgb(color) {
		Some((r, g, b)) => format!("rgba({r}, {g}, {b}, {})", opacity.clamp(0.0, 1.0)),
		None => color.to_owned(),
	}
}

fn parse_rgb(color: &str) -> Option<(u8, u8, u8)> {
	let color = color.trim();
	if let Some(hex) = color.strip_prefix('#') {
		return parse_hex(hex);
	}

	let inner = color
		.strip_prefix("rgba(")
		.or_else(|| color.strip_prefix("rgb("))?
		.strip_suffix(')')?;
	let mut channels = inner.split(',').map(|part| part.trim().parse::<u8>().ok());
	Some((channels.next()??, channels.next()??, channels.next()??))
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
	let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
	match hex.len() {
		3 => {
			let short = |i: usize| channel(i..i + 1).map(|v| v * 17);
			Some((short(0)?, short(1)?, short(2)?))
		}
		6 | 8 => Some((channel(0..2)?, channel(2..4)?, channel(4..6)?)),
		_ => None,
	}
}
