//! 密码哈希工具模块
//!
//! 使用 Argon2id 算法进行密码哈希和验证

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::CrmError;

#[derive(Debug)]
pub enum PasswordError {
    HashError(String),
    VerifyError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashError(msg) => write!(f, "Password hash error: {}", msg),
            Self::VerifyError(msg) => write!(f, "Password verify error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

impl From<PasswordError> for CrmError {
    fn from(err: PasswordError) -> Self {
        CrmError::validation(err.to_string())
    }
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// 验证密码是否匹配哈希；哈希格式错误时才返回 `Err`
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn is_argon2_hash(s: &str) -> bool {
    s.starts_with("$argon2")
}

/// 账号密码的最低要求
pub fn validate_password_strength(password: &str) -> crate::errors::Result<()> {
    if password.chars().count() < 8 {
        return Err(CrmError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("collect-weekly").unwrap();
        assert!(is_argon2_hash(&hash));
        assert!(verify_password("collect-weekly", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("x", "plaintext").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("short").is_err());
        assert!(validate_password_strength("long-enough").is_ok());
    }
}
