use rand::Rng;

/// Reservation codes are short enough to read over the phone; ambiguous
/// glyphs (I, L, O, 0, 1) are excluded from the charset.
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 6;

/// Upper bound on generation attempts before the allocation is reported as
/// exhausted. With 31^6 possible codes this is practically unreachable, but
/// it is handled, not assumed away.
pub const MAX_GENERATION_ATTEMPTS: u32 = 8;

pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_CHARSET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_match_the_format() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(is_valid_code(&code), "bad code: {}", code);
        }
    }

    #[test]
    fn generation_is_not_constant() {
        let codes: std::collections::HashSet<String> = (0..50).map(|_| generate_code()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn validation_rejects_wrong_shapes() {
        assert!(is_valid_code("ABC234"));
        assert!(!is_valid_code("ABC23"));
        assert!(!is_valid_code("ABC2345"));
        assert!(!is_valid_code("abc234"));
        assert!(!is_valid_code("ABC10O"));
        assert!(!is_valid_code(""));
    }
}
