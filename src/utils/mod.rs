pub mod csv_handler;
pub mod money;
pub mod password;

/// 随机大写字母数字串，用于生成标识符
pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// 未配置时用于签名 Token 的随机密钥
pub fn generate_secure_token(length: usize) -> String {
    use rand::RngExt;
    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| chars[rng.random_range(0..chars.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_code() {
        let code = generate_random_code(8);
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_secure_token_length() {
        assert_eq!(generate_secure_token(32).len(), 32);
        assert_ne!(generate_secure_token(32), generate_secure_token(32));
    }
}
