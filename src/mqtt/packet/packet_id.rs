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
/// Monotonic packet identifier allocator.
///
/// Identifiers wrap at 2^16 and the value 0 is skipped, since a zero
/// packet id means "no packet id" on the wire. An id is considered free
/// for reuse as soon as the QoS cycle that used it terminates, so a plain
/// counter is sufficient for a client that runs one synchronous exchange
/// at a time.
#[derive(Debug, Clone, Default)]
pub struct PacketIdAllocator {
    current: u16,
}

impl PacketIdAllocator {
    pub fn new() -> Self {
        Self { current: 0 }
    }

    /// Next identifier, never 0.
    pub fn allocate(&mut self) -> u16 {
        self.current = self.current.wrapping_add(1);
        if self.current == 0 {
            self.current = 1;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_from_one() {
        let mut alloc = PacketIdAllocator::new();
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 2);
        assert_eq!(alloc.allocate(), 3);
    }

    #[test]
    fn wraps_past_zero() {
        let mut alloc = PacketIdAllocator { current: u16::MAX - 1 };
        assert_eq!(alloc.allocate(), u16::MAX);
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 2);
    }

    #[test]
    fn never_yields_zero() {
        let mut alloc = PacketIdAllocator::new();
        for _ in 0..=u16::MAX as u32 + 10 {
            assert_ne!(alloc.allocate(), 0);
        }
    }
}
