/// Obfuscates or restores `buf` in place, treating it as the start of a payload.
///
/// Applying the transform twice returns the original bytes.
pub fn transform(buf: &mut [u8]) {
	transform_at(buf, 0);
}

/// Obfuscates or restores `buf` in place, treating it as the slice of a payload starting at `pos`.
pub fn transform_at(buf: &mut [u8], pos: u64) {
	for (i, byte) in buf.iter_mut().enumerate() {
		*byte ^= (pos.wrapping_add(i as u64).wrapping_add(2)) as u8;
	}
}

#[cfg(test)]
mod tests {
	use super::{transform, transform_at};

	#[test]
	fn test_transform_key() {
		let mut buf = vec![0; 4];

		transform(&mut buf);

		assert_eq!(buf, vec![2, 3, 4, 5]);
	}

	#[test]
	fn test_transform_wraps() {
		let mut buf = vec![0; 256];

		transform(&mut buf);

		assert_eq!(buf[253], 255);
		assert_eq!(buf[254], 0);
		assert_eq!(buf[255], 1);
	}

	#[test]
	fn test_transform_self_inverse() {
		let original: Vec<u8> = (0..1024u32).map(|i| (i * 7 + 13) as u8).collect();
		let mut buf = original.clone();

		transform(&mut buf);

		assert_ne!(buf, original);

		transform(&mut buf);

		assert_eq!(buf, original);
	}

	#[test]
	fn test_transform_empty() {
		let mut buf: Vec<u8> = Vec::new();

		transform(&mut buf);

		assert!(buf.is_empty());
	}

	#[test]
	fn test_transform_at_matches_whole() {
		let mut whole = b"Somebody once told me".to_vec();
		let mut split = whole.clone();

		transform(&mut whole);

		let (head, tail) = split.split_at_mut(9);

		transform_at(head, 0);
		transform_at(tail, 9);

		assert_eq!(whole, split);
	}
}
