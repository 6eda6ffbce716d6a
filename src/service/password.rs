use rand::{seq::SliceRandom, Rng};

// Ambiguous glyphs (0/O, 1/l/I) are left out so mailed passwords can be retyped.
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%&*?";

pub trait PasswordGenerator: Send + Sync {
    fn generate_password(&self) -> String;
}

pub struct RandomPasswordGenerator {
    length: usize,
}

impl RandomPasswordGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(4),
        }
    }
}

impl PasswordGenerator for RandomPasswordGenerator {
    fn generate_password(&self) -> String {
        let mut rng = rand::thread_rng();
        let classes = [UPPER, LOWER, DIGITS, SYMBOLS];

        let mut chars: Vec<u8> = classes
            .iter()
            .map(|class| class[rng.gen_range(0..class.len())])
            .collect();
        let all: Vec<u8> = classes.concat();
        while chars.len() < self.length {
            chars.push(all[rng.gen_range(0..all.len())]);
        }
        chars.shuffle(&mut rng);

        chars.into_iter().map(char::from).collect()
    }
}
