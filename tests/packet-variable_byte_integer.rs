/**
 * MIT License
 *
 * Copyright (c) 2025 Takatoshi Kondo
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
use mqtt_client_core::mqtt::packet::{DecodeResult, VariableByteInteger};

#[test]
fn boundary_encoding_sizes() {
    // Each boundary value must use the minimal number of bytes.
    let expectations = [
        (0u32, 1usize),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (2_097_151, 3),
        (2_097_152, 4),
        (268_435_455, 4),
    ];
    for (value, size) in expectations {
        let vbi = VariableByteInteger::from_u32(value).unwrap();
        assert_eq!(vbi.size(), size, "value {value}");
        match VariableByteInteger::decode_stream(vbi.as_bytes()) {
            DecodeResult::Ok(decoded, consumed) => {
                assert_eq!(decoded.to_u32(), value);
                assert_eq!(consumed, size);
            }
            other => panic!("decode of {value} failed: {other:?}"),
        }
    }
}

#[test]
fn round_trip_sampled_domain() {
    // Walk the whole domain with a prime stride plus the area around
    // every encoding-size boundary.
    let mut values: Vec<u32> = (0..VariableByteInteger::MAX).step_by(65_521).collect();
    for boundary in [127u32, 128, 16_383, 16_384, 2_097_151, 2_097_152] {
        values.extend(boundary.saturating_sub(2)..=boundary + 2);
    }
    values.push(VariableByteInteger::MAX);

    for value in values {
        let vbi = VariableByteInteger::from_u32(value).unwrap();
        match VariableByteInteger::decode_stream(vbi.as_bytes()) {
            DecodeResult::Ok(decoded, consumed) => {
                assert_eq!(decoded.to_u32(), value);
                assert_eq!(consumed, vbi.size());
            }
            other => panic!("decode of {value} failed: {other:?}"),
        }
    }
}

#[test]
fn value_too_large_is_rejected() {
    assert!(VariableByteInteger::from_u32(VariableByteInteger::MAX).is_some());
    assert!(VariableByteInteger::from_u32(VariableByteInteger::MAX + 1).is_none());
    assert!(VariableByteInteger::from_u32(u32::MAX).is_none());
}

#[test]
fn truncated_input_is_incomplete() {
    let vbi = VariableByteInteger::from_u32(2_097_152).unwrap();
    let bytes = vbi.as_bytes();
    assert_eq!(bytes.len(), 4);
    for k in 0..bytes.len() {
        assert_eq!(
            VariableByteInteger::decode_stream(&bytes[..k]),
            DecodeResult::Incomplete,
            "prefix of length {k}"
        );
    }
}

#[test]
fn overlong_sequence_is_rejected() {
    // Four continuation bytes cannot be completed by any fifth byte.
    for fifth in [0x00u8, 0x01, 0x7F, 0x80, 0xFF] {
        let bytes = [0x80u8, 0x80, 0x80, 0x80, fifth];
        match VariableByteInteger::decode_stream(&bytes) {
            DecodeResult::Err(_) => {}
            other => panic!("overlong sequence accepted: {other:?}"),
        }
    }
}

#[test]
fn empty_input_is_incomplete() {
    assert_eq!(
        VariableByteInteger::decode_stream(&[]),
        DecodeResult::Incomplete
    );
}
