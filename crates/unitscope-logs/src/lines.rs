/// Reassembles arbitrary byte chunks into newline-terminated lines.
///
/// Bytes after the last terminator stay buffered until a later chunk
/// completes them.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line, terminator included
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos + 1;
            lines.push(self.buf[start..end].to_vec());
            start = end;
        }
        self.buf.drain(..start);

        lines
    }

    /// Bytes still waiting for a terminator
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &[u8] = b"first line\nsecond\n\nfourth \xe2\x9c\x93 unicode\nlast\n";

    fn expected() -> Vec<Vec<u8>> {
        INPUT
            .split_inclusive(|&b| b == b'\n')
            .map(|l| l.to_vec())
            .collect()
    }

    #[test]
    fn test_whole_input() {
        let mut assembler = LineAssembler::new();
        assert_eq!(assembler.push(INPUT), expected());
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_every_chunk_size() {
        for size in 1..=INPUT.len() {
            let mut assembler = LineAssembler::new();
            let lines: Vec<Vec<u8>> = INPUT
                .chunks(size)
                .flat_map(|chunk| assembler.push(chunk))
                .collect();

            assert_eq!(lines, expected(), "chunk size {}", size);
            assert!(assembler.pending().is_empty());
        }
    }

    #[test]
    fn test_uneven_boundaries() {
        // Split points chosen to land inside the multi-byte char and on terminators
        let cuts = [3, 11, 12, 18, 27, 28, 40];
        let mut assembler = LineAssembler::new();
        let mut lines = Vec::new();
        let mut prev = 0;
        for &cut in cuts.iter().chain(std::iter::once(&INPUT.len())) {
            lines.extend(assembler.push(&INPUT[prev..cut]));
            prev = cut;
        }
        assert_eq!(lines, expected());
    }

    #[test]
    fn test_partial_stays_buffered() {
        let mut assembler = LineAssembler::new();
        assert!(assembler.push(b"no terminator").is_empty());
        assert_eq!(assembler.pending(), b"no terminator");

        assert_eq!(assembler.push(b" yet\nnext"), vec![b"no terminator yet\n".to_vec()]);
        assert_eq!(assembler.pending(), b"next");
    }
}
