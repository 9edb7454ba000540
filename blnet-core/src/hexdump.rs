//! Hex dump formatting for debug logs

/// Format bytes as upper-case hex, 16 per line with a gap after 8
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3 + data.len() / 8 * 2);
    for (i, chunk) in data.chunks(16).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                out.push(' ');
            }
            if j > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{:02X}", byte));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[]), "");
        assert_eq!(hex_dump(&[0x80, 0x0a]), "80 0A");
        let data: Vec<u8> = (0..18).collect();
        assert_eq!(
            hex_dump(&data),
            "00 01 02 03 04 05 06 07  08 09 0A 0B 0C 0D 0E 0F\n10 11"
        );
    }
}
