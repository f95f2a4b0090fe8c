//! The `math\random` built-in.

use rand::{Rng, rngs::StdRng};

use crate::{errors::RunResult, value::Value};

/// A non-negative Int from the host PRNG.
pub(crate) fn builtin_random(rng: &mut StdRng) -> RunResult<Value> {
    Ok(Value::Int(rng.gen_range(0..i64::MAX)))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn yields_non_negative_ints() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let Value::Int(v) = builtin_random(&mut rng).unwrap() else {
                panic!("expected Int");
            };
            assert!(v >= 0);
        }
    }
}
