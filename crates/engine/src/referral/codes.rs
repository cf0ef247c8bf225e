//! Referral code generation

use loyalty_core::{ReferralCode, Result, REFERRAL_CODE_ALPHABET, REFERRAL_CODE_LEN};
use rand::Rng;

/// Draw a random 8-character code. Uniqueness is the directory's job.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> Result<ReferralCode> {
    let code: String = (0..REFERRAL_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REFERRAL_CODE_ALPHABET.len());
            REFERRAL_CODE_ALPHABET[idx] as char
        })
        .collect();
    ReferralCode::parse(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_codes_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let code = generate_code(&mut rng).unwrap();
            assert_eq!(code.as_str().len(), REFERRAL_CODE_LEN);
            assert!(code
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_same_seed_same_code() {
        let a = generate_code(&mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate_code(&mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }
}
