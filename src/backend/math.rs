//! Integer algorithms behind the fallback backend.
//!
//! All routines are bounded: `fibonacci` is O(n), `is_prime` and `factorize`
//! are O(√n). None of them allocate except `factorize`'s result.

use crate::core::contract::{check_factorize_arg, check_fibonacci_arg, Operation};
use crate::core::error::{BridgeError, BridgeResult};

/// `a + b`, rejecting results outside `i64`.
pub fn add_numbers(a: i64, b: i64) -> BridgeResult<i64> {
    a.checked_add(b).ok_or_else(|| {
        BridgeError::invalid_argument(
            Operation::AddNumbers,
            format!("{} + {} overflows a 64-bit integer", a, b),
        )
    })
}

/// Iterative Fibonacci with two accumulators.
///
/// Exact for `n <= FIBONACCI_MAX_EXACT`; beyond that the sum saturates at
/// `i64::MAX` instead of wrapping.
pub fn fibonacci(n: i64) -> BridgeResult<i64> {
    check_fibonacci_arg(n)?;
    if n <= 1 {
        return Ok(n);
    }

    let (mut a, mut b) = (0i64, 1i64);
    for _ in 2..=n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
        if b == i64::MAX {
            // Saturated; every later term is i64::MAX as well.
            break;
        }
    }
    Ok(b)
}

/// Primality by trial division over 6k±1 candidates.
pub fn is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    let mut i = 5i64;
    // i <= n / i is i * i <= n without overflow.
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Prime factors of `n` in ascending order, with multiplicity.
///
/// Trial division from 2 upward; once the divisor passes `√n` whatever is
/// left is itself prime.
pub fn factorize(n: i64) -> BridgeResult<Vec<i64>> {
    check_factorize_arg(n)?;

    let mut factors = Vec::new();
    let mut rest = n;
    let mut d = 2i64;
    while d <= rest / d {
        while rest % d == 0 {
            factors.push(d);
            rest /= d;
        }
        d += if d == 2 { 1 } else { 2 };
    }
    if rest > 1 {
        factors.push(rest);
    }
    Ok(factors)
}
