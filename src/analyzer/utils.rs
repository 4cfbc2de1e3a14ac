/// 블록 flags 문자열로 블록 타입 판별 ("PoS" / "PoW" / "")
pub fn block_type(flags: Option<&str>) -> &'static str {
    match flags {
        Some(flags) if flags.contains("proof-of-stake") => "PoS",
        Some(flags) if flags.contains("proof-of-work") => "PoW",
        _ => "",
    }
}

/// 64 hex characters (block hash / txid).
pub fn is_valid_hash(input: &str) -> bool {
    input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit())
}

const BASE58_CHARS: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const ADDRESS_PREFIX: char = 'P';

/// Base58 address of this chain: `P` prefix, 26-34 characters.
pub fn is_valid_address(input: &str) -> bool {
    if input.len() < 26 || input.len() > 34 {
        return false;
    }
    input.starts_with(ADDRESS_PREFIX) && input.chars().all(|c| BASE58_CHARS.contains(c))
}

/// WIF private key: must decode as Base58Check.
pub fn is_valid_private_key(input: &str) -> bool {
    !input.is_empty() && bs58::decode(input).with_check(None).into_vec().is_ok()
}

pub fn is_valid_hex(input: &str) -> bool {
    !input.is_empty() && hex::decode(input).is_ok()
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
