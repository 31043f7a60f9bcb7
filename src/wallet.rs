use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};

/// Seed phrase of the load account. The driver only ever transfers zero
/// value to itself, so the account needs gas allowance and nothing else.
pub const DEFAULT_MNEMONIC: &str =
    "patient oppose cotton portion chair gentle jelly dice supply salmon blast priority";

/// Standard Ethereum derivation path, first account.
const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Derives the signing key from a BIP-39 phrase.
pub fn signer_from_mnemonic(phrase: &str) -> eyre::Result<PrivateKeySigner> {
    let signer = MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .derivation_path(DERIVATION_PATH)?
        .build()?;
    Ok(signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn derivation_is_deterministic() {
        let a = signer_from_mnemonic(DEFAULT_MNEMONIC).unwrap();
        let b = signer_from_mnemonic(DEFAULT_MNEMONIC).unwrap();
        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), Address::ZERO);
    }

    #[test]
    fn garbage_phrase_is_an_error() {
        assert!(signer_from_mnemonic("not a mnemonic").is_err());
    }
}
