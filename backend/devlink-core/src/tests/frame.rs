use crate::transport::frame::{MAX_PARTS, decode_multipart, encode_multipart};

/// **VALUE**: Verifies the binary layout of a packed multipart message.
///
/// **WHY THIS MATTERS**: The device side unpacks the same layout; any drift
/// breaks every call and notification.
///
/// **BUG THIS CATCHES**: Would catch little-endian lengths or a missing count.
#[test]
fn given_parts_when_encoded_then_count_and_lengths_are_big_endian() {
    let buf = encode_multipart(&[b"ab".to_vec(), Vec::new()]);

    assert_eq!(buf, vec![0, 0, 0, 2, 0, 0, 0, 2, b'a', b'b', 0, 0, 0, 0]);
    assert_eq!(
        decode_multipart(&buf).unwrap(),
        vec![b"ab".to_vec(), Vec::new()]
    );
}

/// **VALUE**: Verifies malformed buffers are rejected instead of misread.
///
/// **WHY THIS MATTERS**: Frames come off the network; a short or padded buffer
/// must never yield a plausible-looking message.
///
/// **BUG THIS CATCHES**: Would catch:
/// - slicing past the end of the buffer (panic)
/// - trailing garbage being ignored
/// - absurd part counts allocating huge vectors
#[test]
fn given_malformed_buffer_when_decoded_then_frame_error() {
    let truncated = vec![0, 0, 0, 1, 0, 0, 0, 9, b'x'];
    assert!(decode_multipart(&truncated).is_err());

    let mut trailing = encode_multipart(&[b"x".to_vec()]);
    trailing.push(0);
    assert!(decode_multipart(&trailing).is_err());

    let too_many = ((MAX_PARTS + 1) as u32).to_be_bytes().to_vec();
    assert!(decode_multipart(&too_many).is_err());

    assert!(decode_multipart(&[0, 0]).is_err());
}
