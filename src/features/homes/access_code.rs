use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// ソルトのバイト数
const SALT_LENGTH: usize = 16;

/// ハッシュ化されたアクセスコード（どちらもBase64）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedAccessCode {
    pub hash: String,
    pub salt: String,
}

/// ランダムなソルトでアクセスコードをハッシュ化する
pub fn hash_access_code(code: &str) -> HashedAccessCode {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    HashedAccessCode {
        hash: general_purpose::STANDARD.encode(digest(&salt, code)),
        salt: general_purpose::STANDARD.encode(salt),
    }
}

/// アクセスコードが保存済みハッシュと一致するか検証する
///
/// ソルトやハッシュが壊れている場合は一致しないものとして扱う。
pub fn verify_access_code(code: &str, stored: &HashedAccessCode) -> bool {
    let Ok(salt) = general_purpose::STANDARD.decode(&stored.salt) else {
        log::warn!("アクセスコードのソルトをデコードできません");
        return false;
    };
    let Ok(expected) = general_purpose::STANDARD.decode(&stored.hash) else {
        log::warn!("アクセスコードのハッシュをデコードできません");
        return false;
    };

    let actual = digest(&salt, code);
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn digest(salt: &[u8], code: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(code.as_bytes());
    hasher.finalize().to_vec()
}
